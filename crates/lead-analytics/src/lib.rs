//! Lead analytics: turns CRM lead exports into the totals, per-agent and
//! per-team breakdowns, and monthly trends a sales dashboard displays.

pub mod analytics;
pub mod config;
pub mod error;
pub mod feed;
pub mod telemetry;
