//! Strongly-typed table name wrapper.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Strongly-typed wrapper for table names (potentially schema-qualified
    /// like `raw.forecast_cycles`).
    pub struct TableName;
}

impl TableName {
    /// `true` if the name is schema-qualified (contains a `.`), which marks
    /// it as a table outside the model corpus.
    pub fn is_external(&self) -> bool {
        self.as_str().contains('.')
    }
}
