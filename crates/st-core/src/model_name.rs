//! Strongly-typed model name wrapper.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Strongly-typed wrapper for model names.
    ///
    /// Prevents accidental mixing of model names with table names, column
    /// names, or other string types.
    pub struct ModelName;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_creation() {
        let name = ModelName::new("clean_orders");
        assert_eq!(name.as_str(), "clean_orders");
    }

    #[test]
    fn test_model_name_display() {
        let name = ModelName::new("clean_orders");
        assert_eq!(format!("{}", name), "clean_orders");
    }

    #[test]
    fn test_model_name_equality() {
        let name = ModelName::new("clean_orders");
        assert_eq!(name, "clean_orders");
        assert_eq!(name, "clean_orders".to_string());
    }

    #[test]
    fn test_model_name_try_new_empty() {
        assert!(ModelName::try_new("").is_none());
    }

    #[test]
    fn test_model_name_ord() {
        let a = ModelName::new("alpha");
        let b = ModelName::new("beta");
        assert!(a < b);
    }

    #[test]
    fn test_model_name_borrow() {
        use std::collections::BTreeMap;
        let mut map: BTreeMap<ModelName, i32> = BTreeMap::new();
        map.insert(ModelName::new("test"), 42);
        // Can look up by &str thanks to Borrow<str>
        assert_eq!(map.get("test"), Some(&42));
    }

    #[test]
    fn test_model_name_serde_roundtrip() {
        let name = ModelName::new("fct_orders");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#""fct_orders""#);
        let back: ModelName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
