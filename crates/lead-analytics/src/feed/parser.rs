use super::normalizer::{
    amount_to_cents, clean_label, parse_amount, parse_timestamp, timestamp_from_millis,
    try_parse_amount,
};
use super::LeadFeedError;
use crate::analytics::LeadRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::io::Read;
use tracing::debug;

// Field names seen across CRM exports, most specific first.
const ID_FIELDS: &[&str] = &["id", "_id", "leadId", "lead_id"];
const CREATED_AT_FIELDS: &[&str] = &["createdAt", "created_at", "createdOn", "date"];
const AMOUNT_FIELDS: &[&str] = &["amount", "prixttc", "prix_ttc", "price"];
const AGENT_FIELDS: &[&str] = &[
    "agent",
    "createdBy",
    "created_by",
    "teamMember",
    "team_member",
    "salesAgent",
    "sales_agent",
];
const TEAM_FIELDS: &[&str] = &["team", "teamLabel", "team_label"];
const STAGE_FIELDS: &[&str] = &[
    "stageLabel",
    "stage_label",
    "pipelineStage",
    "pipeline_stage",
    "pipeline",
    "stage",
];

/// Extracts the lead array from any accepted envelope: a bare array,
/// `{ "leads": [...] }`, or `{ "data": { "leads": [...] } }`.
pub(crate) fn parse_json_value(value: Value) -> Result<Vec<LeadRecord>, LeadFeedError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            if let Some(Value::Array(items)) = object.remove("leads") {
                items
            } else if let Some(data) = object.remove("data") {
                return match data {
                    Value::Object(_) | Value::Array(_) => parse_json_value(data),
                    _ => Err(LeadFeedError::UnexpectedShape),
                };
            } else {
                return Err(LeadFeedError::UnexpectedShape);
            }
        }
        _ => return Err(LeadFeedError::UnexpectedShape),
    };

    let total = items.len();
    let records: Vec<LeadRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) => Some(record_from_fields(&fields)),
            _ => None,
        })
        .collect();

    debug!(
        total,
        kept = records.len(),
        skipped = total - records.len(),
        "parsed lead feed"
    );
    Ok(records)
}

fn record_from_fields(fields: &Map<String, Value>) -> LeadRecord {
    LeadRecord {
        id: first_usable(fields, ID_FIELDS, scalar_text),
        created_at: first_usable(fields, CREATED_AT_FIELDS, timestamp_from_value),
        amount_cents: first_usable(fields, AMOUNT_FIELDS, amount_from_value).unwrap_or(0),
        agent: first_usable(fields, AGENT_FIELDS, label_from_value),
        team: first_usable(fields, TEAM_FIELDS, label_from_value),
        stage_label: first_usable(fields, STAGE_FIELDS, label_from_value),
    }
}

/// First value among `names` that `extract` can make sense of; blank,
/// null, or malformed variants fall through to the next name.
fn first_usable<T>(
    fields: &Map<String, Value>,
    names: &[&str],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(extract)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => clean_label(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Labels arrive either as plain strings or as `{ "label": ... }` objects.
fn label_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => ["label", "name"]
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(scalar_text),
        other => scalar_text(other),
    }
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp(text),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| millis as i64)
            })
            .and_then(timestamp_from_millis),
        _ => None,
    }
}

fn amount_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_f64().map(amount_to_cents),
        Value::String(text) => try_parse_amount(text),
        _ => None,
    }
}

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Vec<LeadRecord>, LeadFeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<CsvLeadRow>() {
        records.push(row?.into_record());
    }

    debug!(total = records.len(), "parsed lead csv export");
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CsvLeadRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "empty_string_as_none"
    )]
    created_at: Option<String>,
    #[serde(default, alias = "prixttc", deserialize_with = "empty_string_as_none")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    agent: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    team: Option<String>,
    #[serde(
        default,
        alias = "stageLabel",
        alias = "stage",
        deserialize_with = "empty_string_as_none"
    )]
    stage_label: Option<String>,
}

impl CsvLeadRow {
    fn into_record(self) -> LeadRecord {
        LeadRecord {
            id: self.id,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            amount_cents: self.amount.as_deref().map(parse_amount).unwrap_or(0),
            agent: self.agent.as_deref().and_then(clean_label),
            team: self.team.as_deref().and_then(clean_label),
            stage_label: self.stage_label.as_deref().and_then(clean_label),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
