//! Column decoding shared by the CRUD modules.

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use forkful_shared::LabelList;
use rusqlite::types::Type;
use uuid::Uuid;

use crate::error::Result;

pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn timestamp_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn time_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let s: String = row.get(idx)?;
    NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn labels_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<LabelList> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

/// Fixed-width RFC-3339 so that text ordering matches time ordering.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn encode_labels(labels: &LabelList) -> Result<String> {
    Ok(serde_json::to_string(labels)?)
}
