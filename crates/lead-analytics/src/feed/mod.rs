//! Input boundary: maps CRM lead exports (JSON or CSV) onto [`LeadRecord`].
//!
//! Upstream feeds disagree on field names (`createdBy` vs `teamMember`,
//! `pipelineStage` vs `pipeline`, `prixttc` vs `amount`); every variant is
//! resolved here so the analytics core only sees the canonical shape.

mod normalizer;
mod parser;

use crate::analytics::{GroupBy, LeadRecord};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

pub(crate) use normalizer::normalize_label;

#[derive(Debug, thiserror::Error)]
pub enum LeadFeedError {
    #[error("failed to read lead feed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lead JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid lead CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("lead feed must be an array, an object with `leads`, or `{{\"data\": {{\"leads\": [...]}}}}`")]
    UnexpectedShape,
}

pub struct LeadFeed;

impl LeadFeed {
    /// Loads a feed from disk; `.csv` files are read as CSV, anything else as JSON.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<LeadRecord>, LeadFeedError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            Self::from_csv_reader(file)
        } else {
            Self::from_json_reader(std::io::BufReader::new(file))
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<LeadRecord>, LeadFeedError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_json_value(value)
    }

    pub fn from_json_str(raw: &str) -> Result<Vec<LeadRecord>, LeadFeedError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Vec<LeadRecord>, LeadFeedError> {
        parser::parse_json_value(value)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Vec<LeadRecord>, LeadFeedError> {
        parser::parse_csv(reader)
    }
}

/// Distinct, non-empty labels for `group_by` in order of first appearance.
///
/// Leads without a label are not listed; the caller decides whether to offer
/// an "All" entry.
pub fn group_options(leads: &[LeadRecord], group_by: GroupBy) -> Vec<String> {
    let mut seen = HashSet::new();
    leads
        .iter()
        .filter_map(|lead| match group_by {
            GroupBy::Agent => lead.agent.as_deref(),
            GroupBy::Team => lead.team.as_deref(),
            GroupBy::Global => None,
        })
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_string()))
        .map(str::to_string)
        .collect()
}
