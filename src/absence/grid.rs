use calamine::{open_workbook_auto, Data, Reader};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rows of cell text as they appear on the first worksheet. Blank cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("invalid CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook {} has no worksheets", path.display())]
    NoWorksheet { path: PathBuf },
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Loads the first worksheet of an `.xlsx`/`.xls`/`.ods` export, or a `.csv` export.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let path = path.as_ref();
        // Surface a missing export as an io error before the workbook reader wraps it.
        std::fs::metadata(path)?;

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let grid = if is_csv {
            Self::from_csv_reader(std::fs::File::open(path)?)?
        } else {
            Self::from_workbook(path)?
        };

        debug!(path = %path.display(), rows = grid.rows.len(), "loaded export grid");
        Ok(grid)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, GridError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(rows))
    }

    fn from_workbook(path: &Path) -> Result<Self, GridError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| GridError::NoWorksheet {
                path: path.to_path_buf(),
            })??;

        // Ranges start at the first used cell; pad so column indexes match the sheet.
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
        for row in range.rows() {
            let mut cells = vec![String::new(); first_col as usize];
            cells.extend(row.iter().map(cell_text));
            rows.push(cells);
        }
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells past the end of a row read as blank.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        other => other.to_string(),
    }
}
