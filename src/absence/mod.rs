pub mod category;
pub mod classifier;
pub mod grid;
pub mod query;

pub use category::AbsenceCategory;
pub use classifier::{
    classify, AbsenceEntry, ClassificationResult, ClassifyError, EmployeeRecord, GridLayout,
    ReportPeriod, NO_TIME_OFFS,
};
pub use grid::{Grid, GridError};
pub use query::{AbsenceQuery, QueryError};
