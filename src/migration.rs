//! Migration records and the "already applied" flags derived from them.
//!
//! A record marks one migration file of a source table as applied in an
//! environment. Every applied record becomes a template variable named
//! `sanitize(source_table) + "_" + file_order` with the value `"true"`,
//! so scripts can test `'{{ a_b_c_3 }}' = 'true'` to guard re-runs.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::ast::Environment;

/// One migration file of one source table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigrationRecord {
    pub source_table: String,
    pub file_order: u32,
    #[serde(default)]
    pub applied: bool,
}

impl MigrationRecord {
    #[must_use]
    pub fn new(source_table: &str, file_order: u32, applied: bool) -> Self {
        Self {
            source_table: source_table.to_string(),
            file_order,
            applied,
        }
    }

    /// Name of the template variable set when this record is applied.
    #[must_use]
    pub fn flag_name(&self) -> String {
        applied_flag_name(&self.source_table, self.file_order)
    }
}

/// Migration records grouped by environment.
///
/// Deserializes from `{"dev": [{"source_table": ..., "file_order": ..., "applied": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Migrations {
    records: HashMap<Environment, Vec<MigrationRecord>>,
}

impl Migrations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record for `env`.
    #[must_use]
    pub fn record(mut self, env: Environment, record: MigrationRecord) -> Self {
        self.records.entry(env).or_default().push(record);
        self
    }

    /// Parse the JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `json` is not a valid migration map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn for_env(&self, env: Environment) -> &[MigrationRecord] {
        self.records.get(&env).map_or(&[], Vec::as_slice)
    }

    /// Flags for every applied record of `env`.
    #[must_use]
    pub fn applied_flags(&self, env: Environment) -> BTreeMap<String, String> {
        self.for_env(env)
            .iter()
            .filter(|record| record.applied)
            .map(|record| (record.flag_name(), "true".to_string()))
            .collect()
    }
}

/// Collapse every run of characters outside `[A-Za-z0-9]` into one `_`.
#[must_use]
pub fn sanitize(source_table: &str) -> String {
    let mut out = String::with_capacity(source_table.len());
    let mut in_run = false;
    for ch in source_table.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

#[must_use]
pub fn applied_flag_name(source_table: &str, file_order: u32) -> String {
    format!("{}_{file_order}", sanitize(source_table))
}
