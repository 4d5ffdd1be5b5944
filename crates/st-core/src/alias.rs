//! Table alias assignment.
//!
//! The alias map is computed once per model and is the single source of
//! truth for column qualification: the primary source (base table or first
//! dependency) is always `T`; every other dependency gets a short alias
//! derived from its name's initials. Both the SQL generator and the
//! validator's alias checks consume this map.

use crate::model::Model;
use std::collections::{BTreeMap, BTreeSet};

/// Compute the `reference_table -> alias` map for a model.
///
/// Returns `None` when the model has neither a base table nor dependencies
/// (nothing to select from).
pub fn alias_map(model: &Model) -> Option<BTreeMap<String, String>> {
    let primary = model.primary_source()?;

    let mut aliases = BTreeMap::new();
    let mut taken: BTreeSet<String> = BTreeSet::new();
    aliases.insert(primary.to_string(), "T".to_string());
    taken.insert("T".to_string());

    for table in model.depends_on.iter().filter(|t| t.as_str() != primary) {
        let alias = derive_alias(table, &mut taken);
        aliases.insert(table.clone(), alias);
    }

    Some(aliases)
}

/// Derive a short alias from a table name's initials; collisions extend to
/// the full word initials, then a numeric suffix.
pub fn derive_alias(table: &str, taken: &mut BTreeSet<String>) -> String {
    let last = table.rsplit('.').next().unwrap_or(table);
    let words: Vec<&str> = last.split('_').filter(|w| !w.is_empty()).collect();

    let first_initial: String = words
        .first()
        .and_then(|w| w.chars().find(|c| c.is_alphabetic()))
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_else(|| "X".to_string());
    if taken.insert(first_initial.clone()) {
        return first_initial;
    }

    let initials: String = words
        .iter()
        .filter_map(|w| w.chars().find(|c| c.is_alphabetic()))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if initials.len() > 1 && taken.insert(initials.clone()) {
        return initials;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}{}", initials, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
