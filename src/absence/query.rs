use super::classifier::{ClassificationResult, EmployeeRecord};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("no employee named '{0}' in the report")]
    KeyNotFound(String),
}

/// Exact-name lookups over one classification.
#[derive(Debug, Clone, Default)]
pub struct AbsenceQuery {
    result: ClassificationResult,
}

impl AbsenceQuery {
    pub fn new(result: ClassificationResult) -> Self {
        Self { result }
    }

    /// Returns `{name: record}`. No case folding or partial matches.
    pub fn search(&self, name: &str) -> Result<BTreeMap<String, EmployeeRecord>, QueryError> {
        let record = self
            .result
            .get(name)
            .ok_or_else(|| QueryError::KeyNotFound(name.to_string()))?;
        Ok(BTreeMap::from([(name.to_string(), record.clone())]))
    }

    pub fn all(&self) -> &ClassificationResult {
        &self.result
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}
