use super::domain::LeadRecord;
use crate::feed::normalize_label;
use serde::Serialize;

/// Stage label that marks a confirmed order in the reference CRM pipeline.
pub const DEFAULT_COMPLETION_STAGE: &str = "confirmation de réception";

/// Deployment-wide rule deciding which leads count as orders.
///
/// A single policy instance is shared by every aggregation so that cards,
/// tables and charts never disagree on what an order is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPolicy {
    completion_stage: String,
    require_positive_amount: bool,
}

impl OrderPolicy {
    pub fn new(completion_stage_label: &str) -> Self {
        Self {
            completion_stage: normalize_label(completion_stage_label),
            require_positive_amount: false,
        }
    }

    /// Switches to the stricter rule where an order also needs a non-zero amount.
    pub fn requiring_positive_amount(mut self, required: bool) -> Self {
        self.require_positive_amount = required;
        self
    }

    pub fn completion_stage_label(&self) -> &str {
        &self.completion_stage
    }

    pub fn requires_positive_amount(&self) -> bool {
        self.require_positive_amount
    }

    pub fn classify(&self, lead: &LeadRecord) -> Classification {
        let stage_matches = lead
            .stage_label
            .as_deref()
            .is_some_and(|label| normalize_label(label) == self.completion_stage);
        let amount_ok = !self.require_positive_amount || lead.amount_cents > 0;

        Classification {
            is_order: stage_matches && amount_ok,
            value_cents: lead.amount_cents,
        }
    }
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_STAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_order: bool,
    pub value_cents: u64,
}
