//! Command output
//!
//! Commands produce an [`Output`]; the binary renders it as a table
//! (`tabled`), JSON or YAML depending on `--format`.

use clap::ValueEnum;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Result of a command, independent of how it is printed
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Rows projected onto `columns` (keys into each row)
    List {
        columns: Vec<String>,
        rows: Vec<Map<String, Value>>,
    },
    /// A single record shown as field/value pairs
    Record(Map<String, Value>),
    Message(String),
    Nothing,
}

#[derive(Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl Output {
    pub fn list(columns: &[&str], rows: Vec<Map<String, Value>>) -> Self {
        Self::List {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(&self.to_value())?,
            OutputFormat::Yaml => serde_yaml::to_string(&self.to_value())?,
        })
    }

    fn to_value(&self) -> Value {
        match self {
            Output::List { columns, rows } => Value::Array(
                rows.iter()
                    .map(|row| Value::Object(project(row, columns)))
                    .collect(),
            ),
            Output::Record(record) => Value::Object(record.clone()),
            Output::Message(message) => Value::String(message.clone()),
            Output::Nothing => Value::Null,
        }
    }

    fn to_table(&self) -> String {
        match self {
            Output::List { rows, .. } if rows.is_empty() => "No results.".to_string(),
            Output::List { columns, rows } => {
                let mut builder = Builder::default();
                builder.push_record(columns.iter().map(|c| header(c)));
                for row in rows {
                    builder.push_record(columns.iter().map(|c| cell(row.get(c))));
                }
                let mut table = builder.build();
                table.with(Style::modern());
                table.to_string()
            },
            Output::Record(record) => {
                let fields: Vec<Field> = record
                    .iter()
                    .map(|(key, value)| Field {
                        field: header(key),
                        value: cell(Some(value)),
                    })
                    .collect();
                let mut table = Table::new(fields);
                table.with(Style::modern());
                table.to_string()
            },
            Output::Message(message) => message.clone(),
            Output::Nothing => String::new(),
        }
    }
}

fn project(row: &Map<String, Value>, columns: &[String]) -> Map<String, Value> {
    columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// `created_at` -> `Created At`
fn header(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display form of a JSON value inside a table cell
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_header() {
        assert_eq!(header("created_at"), "Created At");
        assert_eq!(header("name"), "Name");
        assert_eq!(header("msg_counts"), "Msg Counts");
    }

    #[test]
    fn test_cell() {
        assert_eq!(cell(None), "-");
        assert_eq!(cell(Some(&json!(null))), "-");
        assert_eq!(cell(Some(&json!("t1"))), "t1");
        assert_eq!(cell(Some(&json!(5))), "5");
        assert_eq!(cell(Some(&json!({"ttl": 60}))), r#"{"ttl":60}"#);
    }

    #[test]
    fn test_list_table() {
        let output = Output::list(
            &["name", "href"],
            vec![row(json!({"name": "t1", "href": "/v2/topics/t1"}))],
        );
        let table = output.render(OutputFormat::Table).unwrap();
        assert!(table.contains("Name"));
        assert!(table.contains("Href"));
        assert!(table.contains("/v2/topics/t1"));
    }

    #[test]
    fn test_empty_list() {
        let output = Output::list(&["name"], Vec::new());
        assert_eq!(output.render(OutputFormat::Table).unwrap(), "No results.");
        assert_eq!(output.render(OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_json_keeps_only_columns() {
        let output = Output::list(&["name"], vec![row(json!({"name": "q1", "extra": 1}))]);
        let rendered: Value =
            serde_json::from_str(&output.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(rendered, json!([{"name": "q1"}]));
    }

    #[test]
    fn test_record_yaml() {
        let output = Output::Record(row(json!({"name": "t1", "published": 3})));
        let yaml = output.render(OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: t1"));
        assert!(yaml.contains("published: 3"));
    }

    #[test]
    fn test_record_table() {
        let output = Output::Record(row(json!({"name": "t1", "created_at": "--"})));
        let table = output.render(OutputFormat::Table).unwrap();
        assert!(table.contains("Field"));
        assert!(table.contains("Created At"));
    }
}
