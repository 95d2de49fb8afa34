use serde::{Serialize, Serializer};
use std::fmt;

/// Leave types the portal writes into day cells. Anything else in a day cell is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbsenceCategory {
    Vacation,
    SickLeave,
    WorkFromHome,
    UnpaidDayOff,
    VacationGeorgia,
}

impl AbsenceCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Vacation,
            Self::SickLeave,
            Self::WorkFromHome,
            Self::UnpaidDayOff,
            Self::VacationGeorgia,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vacation => "Vacation",
            Self::SickLeave => "Sick Leave",
            Self::WorkFromHome => "Work from Home (WFH)",
            Self::UnpaidDayOff => "Unpaid Day Off",
            Self::VacationGeorgia => "Vacation (Georgia)",
        }
    }

    /// Exact match against the exported label; no trimming or case folding.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|category| category.label() == value)
    }
}

impl fmt::Display for AbsenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AbsenceCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
