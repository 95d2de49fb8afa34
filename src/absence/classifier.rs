use super::category::AbsenceCategory;
use super::grid::Grid;
use chrono::{Datelike, Local, NaiveDate};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Label emitted for employees without a single recognised absence.
pub const NO_TIME_OFFS: &str = "No Time Offs";

/// Full employee name → absence entries, in name order.
pub type ClassificationResult = BTreeMap<String, EmployeeRecord>;

/// Where names and day cells sit in the exported sheet (0-based columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub header_rows: usize,
    pub first_name_column: usize,
    pub last_name_column: usize,
    pub first_day_column: usize,
}

impl Default for GridLayout {
    /// Columns B and D hold the name, day 1 sits in column M.
    fn default() -> Self {
        Self {
            header_rows: 1,
            first_name_column: 1,
            last_name_column: 3,
            first_day_column: 12,
        }
    }
}

/// Calendar month the export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    year: i32,
    month: u32,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, ClassifyError> {
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(_) => Ok(Self { year, month }),
            None => Err(ClassifyError::InvalidPeriod { year, month }),
        }
    }

    /// The month of the local system clock.
    ///
    /// The portal export carries no period of its own, so the crawl assumes it
    /// covers the month it runs in. A report for any other month gets its
    /// trailing days truncated or misread.
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first_of_next| first_of_next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportPeriod {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let parsed = trimmed.split_once('-').and_then(|(year, month)| {
            Some((year.parse::<i32>().ok()?, month.parse::<u32>().ok()?))
        });
        match parsed {
            Some((year, month)) => Self::new(year, month).map_err(|err| err.to_string()),
            None => Err(format!("failed to parse '{raw}' as YYYY-MM")),
        }
    }
}

/// One `{label: days}` entry of an employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceEntry {
    Absence {
        category: AbsenceCategory,
        days: Vec<u32>,
    },
    NoTimeOffs,
}

impl AbsenceEntry {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Absence { category, .. } => category.label(),
            Self::NoTimeOffs => NO_TIME_OFFS,
        }
    }

    pub fn days(&self) -> &[u32] {
        match self {
            Self::Absence { days, .. } => days,
            Self::NoTimeOffs => &[],
        }
    }
}

impl Serialize for AbsenceEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.label(), self.days())?;
        map.end()
    }
}

/// Absence entries for one employee, in the order each category first appears on the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmployeeRecord(Vec<AbsenceEntry>);

impl EmployeeRecord {
    pub fn no_time_offs() -> Self {
        Self(vec![AbsenceEntry::NoTimeOffs])
    }

    pub fn entries(&self) -> &[AbsenceEntry] {
        &self.0
    }

    pub fn has_time_offs(&self) -> bool {
        !matches!(self.0.as_slice(), [AbsenceEntry::NoTimeOffs])
    }

    pub fn days_for(&self, category: AbsenceCategory) -> &[u32] {
        self.0
            .iter()
            .find_map(|entry| match entry {
                AbsenceEntry::Absence {
                    category: found,
                    days,
                } if *found == category => Some(days.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    fn from_row(grouped: Vec<(AbsenceCategory, Vec<u32>)>) -> Self {
        if grouped.is_empty() {
            return Self::no_time_offs();
        }
        Self(
            grouped
                .into_iter()
                .map(|(category, days)| AbsenceEntry::Absence { category, days })
                .collect(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("row {row} is missing the employee's {part} name")]
    MissingName { row: usize, part: &'static str },
    #[error("employee '{name}' appears twice (rows {first_row} and {row})")]
    DuplicateEmployee {
        name: String,
        first_row: usize,
        row: usize,
    },
    #[error("{year}-{month} is not a calendar month")]
    InvalidPeriod { year: i32, month: u32 },
}

/// Turns the exported grid into per-employee absence records.
///
/// Pure: every call builds and returns a fresh result. Rows are reported
/// 1-based in errors to match the spreadsheet. Fully blank rows are skipped.
pub fn classify(
    grid: &Grid,
    layout: &GridLayout,
    period: ReportPeriod,
) -> Result<ClassificationResult, ClassifyError> {
    let days = period.days();
    info!(%period, days, "classifying export grid");

    let mut result = ClassificationResult::new();
    let mut seen_at: BTreeMap<String, usize> = BTreeMap::new();

    for (index, cells) in grid.rows().iter().enumerate().skip(layout.header_rows) {
        let row = index + 1;
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            debug!(row, "skipping blank row");
            continue;
        }

        let name = full_name(grid, index, layout)?;
        match seen_at.entry(name.clone()) {
            Entry::Occupied(first) => {
                return Err(ClassifyError::DuplicateEmployee {
                    name,
                    first_row: *first.get(),
                    row,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }

        let record = classify_row(grid, index, layout, days);
        result.insert(name, record);
    }

    info!(employees = result.len(), "classification finished");
    Ok(result)
}

fn full_name(grid: &Grid, index: usize, layout: &GridLayout) -> Result<String, ClassifyError> {
    let row = index + 1;
    let first = grid.cell(index, layout.first_name_column);
    if first.is_empty() {
        return Err(ClassifyError::MissingName { row, part: "first" });
    }
    let last = grid.cell(index, layout.last_name_column);
    if last.is_empty() {
        return Err(ClassifyError::MissingName { row, part: "last" });
    }
    Ok(format!("{first} {last}"))
}

fn classify_row(grid: &Grid, index: usize, layout: &GridLayout, days: u32) -> EmployeeRecord {
    let mut grouped: Vec<(AbsenceCategory, Vec<u32>)> = Vec::new();

    for day in 1..=days {
        let column = layout.first_day_column + (day as usize - 1);
        let Some(category) = AbsenceCategory::from_label(grid.cell(index, column)) else {
            continue;
        };
        match grouped.iter_mut().find(|(found, _)| *found == category) {
            Some((_, listed)) => listed.push(day),
            None => grouped.push((category, vec![day])),
        }
    }

    EmployeeRecord::from_row(grouped)
}
