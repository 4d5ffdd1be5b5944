use super::*;

fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

#[test]
fn test_canonical_audit_list() {
    let value = yaml(
        r#"
audits:
  - type: NOT_NULL
    columns: [OrderId, CustomerId]
  - type: UNIQUE_COMBINATION
    columns: [OrderId]
"#,
    );
    let parsed = parse_audits(&value).unwrap();
    assert_eq!(parsed.audits.len(), 2);
    assert_eq!(
        parsed.audits[0],
        Audit::NotNull {
            columns: vec!["OrderId".into(), "CustomerId".into()]
        }
    );
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_not_null_shorthand() {
    let value = yaml("not_null: [OrderId, Amount]");
    let parsed = parse_audits(&value).unwrap();
    assert_eq!(
        parsed.audits,
        vec![Audit::NotNull {
            columns: vec!["OrderId".into(), "Amount".into()]
        }]
    );
}

#[test]
fn test_accepted_values_shorthand() {
    let value = yaml(
        r#"
accepted_values:
  Status: [ACTIVE, CLOSED]
"#,
    );
    let parsed = parse_audits(&value).unwrap();
    assert_eq!(
        parsed.audits,
        vec![Audit::AcceptedValues {
            values: vec![("Status".into(), vec!["ACTIVE".into(), "CLOSED".into()])]
        }]
    );
}

#[test]
fn test_accepted_values_flat_list_single_column() {
    let value = yaml(
        r#"
audits:
  - type: ACCEPTED_VALUES
    columns: [Status]
    values: [ACTIVE, CLOSED]
"#,
    );
    let parsed = parse_audits(&value).unwrap();
    assert_eq!(
        parsed.audits,
        vec![Audit::AcceptedValues {
            values: vec![("Status".into(), vec!["ACTIVE".into(), "CLOSED".into()])]
        }]
    );
}

#[test]
fn test_accepted_values_flat_list_multiple_columns_rejected() {
    let value = yaml(
        r#"
audits:
  - type: ACCEPTED_VALUES
    columns: [Status, Region]
    values: [ACTIVE]
"#,
    );
    assert!(parse_audits(&value).is_err());
}

#[test]
fn test_numeric_literals_stringified() {
    let value = yaml(
        r#"
audits:
  - type: ACCEPTED_VALUES
    columns: [Priority]
    values: [1, 2, 3]
"#,
    );
    let parsed = parse_audits(&value).unwrap();
    assert_eq!(
        parsed.audits,
        vec![Audit::AcceptedValues {
            values: vec![("Priority".into(), vec!["1".into(), "2".into(), "3".into()])]
        }]
    );
}

#[test]
fn test_unknown_audit_type_fails() {
    let value = yaml("audits: [{type: FROBNICATE, columns: [X]}]");
    assert!(parse_audits(&value).is_err());
}

#[test]
fn test_unknown_field_is_warning() {
    let value = yaml(
        r#"
audits: []
sampling: 0.5
"#,
    );
    let parsed = parse_audits(&value).unwrap();
    assert!(parsed.audits.is_empty());
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("sampling"));
}

#[test]
fn test_audit_columns_accessor() {
    let audit = Audit::AcceptedValues {
        values: vec![
            ("Status".into(), vec!["A".into()]),
            ("Region".into(), vec!["EU".into()]),
        ],
    };
    assert_eq!(audit.columns(), vec!["Status", "Region"]);
    assert_eq!(audit.type_name(), "ACCEPTED_VALUES");
}
