//! Monitor rows
//!
//! The monitor endpoints answer with `{category: {metric: value}}`. For
//! display, the metrics of every category are merged into a single flat
//! row after the resource's identity, metadata and timestamps. When two
//! categories define the same metric, the one iterated last wins.

use super::Metadata;
use serde_json::{Map, Value};

/// One flat monitor row, keys in insertion order
pub type MonitorRow = Map<String, Value>;

/// Flatten a statistics response together with the resource detail
pub fn flatten(
    stats: &Value,
    name: &str,
    metadata: &Metadata,
    created_at: &str,
    updated_at: &str,
) -> MonitorRow {
    let mut row = MonitorRow::new();
    row.insert("name".to_string(), Value::String(name.to_string()));
    row.insert("metadata".to_string(), Value::Object(metadata.clone()));
    row.insert("created_at".to_string(), Value::String(created_at.to_string()));
    row.insert("updated_at".to_string(), Value::String(updated_at.to_string()));

    let Some(categories) = stats.as_object() else {
        return row;
    };

    for (category, metrics) in categories {
        let Some(metrics) = metrics.as_object() else {
            tracing::debug!("Skipping non-object monitor category '{}'", category);
            continue;
        };
        for (metric, value) in metrics {
            row.insert(metric.clone(), value.clone());
        }
    }

    row
}
