//! Aggregate spawn metrics across many columns.
//!
//! Exported as pretty JSON so CI runs can diff spawn output between builds.

use anyhow::Result;
use herdgen_world::ColumnReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Totals for one dominant creature type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMetrics {
    /// Groups emitted with this dominant type.
    pub groups: usize,
    /// Entities emitted in those groups (dominants and companions).
    pub entities: usize,
}

/// Totals across a spawn run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpawnMetrics {
    /// Columns processed.
    pub columns: usize,
    /// Group origins tried.
    pub tries: usize,
    /// Groups discarded for being undersized.
    pub discarded: usize,
    /// Groups emitted.
    pub groups: usize,
    /// Entities emitted.
    pub entities: usize,
    /// Entities emitted per creature code.
    pub by_code: BTreeMap<String, usize>,
    /// Emissions keyed by dominant code.
    pub by_group: BTreeMap<String, GroupMetrics>,
}

impl SpawnMetrics {
    /// Fold one column report into the totals.
    pub fn record(&mut self, report: &ColumnReport) {
        self.columns += 1;
        self.tries += report.tries as usize;
        self.discarded += report.groups_discarded as usize;
        for emission in &report.emissions {
            self.groups += 1;
            self.entities += emission.entities.len();
            let group = self.by_group.entry(emission.dominant.to_string()).or_default();
            group.groups += 1;
            group.entities += emission.entities.len();
            for entity in &emission.entities {
                *self.by_code.entry(entity.code.to_string()).or_default() += 1;
            }
        }
    }

    /// Persist the metrics as pretty JSON, creating parent dirs if needed.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        Ok(())
    }
}
