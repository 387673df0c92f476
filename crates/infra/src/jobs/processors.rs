//! Per-type chunk processing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use super::types::ProcessingType;

/// Failure while executing a job.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("Processing timeout exceeded")]
    Timeout { elapsed_ms: u128, limit_ms: u128 },
    #[error("item {index} is not a JSON object")]
    NonObjectItem { index: usize },
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: &'static str },
}

/// Reduction applied by `aggregate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl AggregateOp {
    /// Any unrecognised operation name counts.
    pub fn parse(name: &str) -> Self {
        match name {
            "sum" => AggregateOp::Sum,
            "avg" => AggregateOp::Avg,
            "max" => AggregateOp::Max,
            "min" => AggregateOp::Min,
            _ => AggregateOp::Count,
        }
    }

    fn apply(&self, values: &[f64]) -> Value {
        match self {
            AggregateOp::Sum => number_value(values.iter().sum()),
            AggregateOp::Count => number_value(values.len() as f64),
            _ if values.is_empty() => Value::Null,
            AggregateOp::Avg => number_value(values.iter().sum::<f64>() / values.len() as f64),
            AggregateOp::Max => number_value(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            AggregateOp::Min => number_value(values.iter().copied().fold(f64::INFINITY, f64::min)),
        }
    }
}

/// Render a float, using an integer when it has no fractional part.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// A processing type with its options resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkProcessor {
    Transform {
        additional_fields: Map<String, Value>,
        processed_by: String,
    },
    Validate {
        required_fields: Vec<String>,
    },
    Aggregate {
        field: String,
        op: AggregateOp,
    },
    Filter {
        conditions: Map<String, Value>,
    },
}

impl ChunkProcessor {
    /// Resolve options for `kind`. A `null` option falls back to its default.
    pub fn from_request(
        kind: ProcessingType,
        options: Option<&Map<String, Value>>,
        processed_by: &str,
    ) -> Result<Self, ProcessingError> {
        let empty = Map::new();
        let options = options.unwrap_or(&empty);
        let option = |name: &str| options.get(name).filter(|v| !v.is_null());

        let processor = match kind {
            ProcessingType::Transform => ChunkProcessor::Transform {
                additional_fields: match option("additionalFields") {
                    None => Map::new(),
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => return Err(invalid("additionalFields", "expected an object")),
                },
                processed_by: processed_by.to_string(),
            },
            ProcessingType::Validate => ChunkProcessor::Validate {
                required_fields: match option("requiredFields") {
                    None => vec!["id".to_string()],
                    Some(Value::Array(fields)) => fields
                        .iter()
                        .map(|f| f.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| invalid("requiredFields", "expected an array of strings"))?,
                    Some(_) => return Err(invalid("requiredFields", "expected an array of strings")),
                },
            },
            ProcessingType::Aggregate => ChunkProcessor::Aggregate {
                field: match option("field") {
                    None => "value".to_string(),
                    Some(Value::String(field)) if field.is_empty() => "value".to_string(),
                    Some(Value::String(field)) => field.clone(),
                    Some(_) => return Err(invalid("field", "expected a string")),
                },
                op: match option("operation") {
                    None => AggregateOp::Sum,
                    Some(Value::String(op)) if op.is_empty() => AggregateOp::Sum,
                    Some(Value::String(op)) => AggregateOp::parse(op),
                    Some(_) => return Err(invalid("operation", "expected a string")),
                },
            },
            ProcessingType::Filter => ChunkProcessor::Filter {
                conditions: match option("conditions") {
                    None => Map::new(),
                    Some(Value::Object(map)) => map.clone(),
                    Some(_) => return Err(invalid("conditions", "expected an object")),
                },
            },
        };
        Ok(processor)
    }

    /// Process one chunk. `offset` is the index of the chunk's first item
    /// within the job, used for error reporting.
    pub fn process(
        &self,
        chunk: &[Value],
        offset: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Value>, ProcessingError> {
        match self {
            ChunkProcessor::Transform {
                additional_fields,
                processed_by,
            } => {
                let processed_at = Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true));
                chunk
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let Value::Object(fields) = item else {
                            return Err(ProcessingError::NonObjectItem { index: offset + i });
                        };
                        let mut out = fields.clone();
                        out.insert("processed".to_string(), Value::Bool(true));
                        out.insert("processedAt".to_string(), processed_at.clone());
                        out.insert("transformedBy".to_string(), Value::String(processed_by.clone()));
                        for (key, value) in additional_fields {
                            out.insert(key.clone(), value.clone());
                        }
                        Ok(Value::Object(out))
                    })
                    .collect()
            }
            ChunkProcessor::Validate { required_fields } => Ok(chunk
                .iter()
                .filter(|item| {
                    item.as_object()
                        .is_some_and(|obj| required_fields.iter().all(|f| obj.contains_key(f)))
                })
                .cloned()
                .collect()),
            ChunkProcessor::Aggregate { field, op } => {
                let values: Vec<f64> = chunk
                    .iter()
                    .filter_map(|item| item.get(field.as_str()).and_then(Value::as_f64))
                    .collect();
                let mut record = Map::new();
                record.insert(field.clone(), op.apply(&values));
                Ok(vec![Value::Object(record)])
            }
            ChunkProcessor::Filter { conditions } => Ok(chunk
                .iter()
                .filter(|item| {
                    conditions
                        .iter()
                        .all(|(key, expected)| item.get(key.as_str()).is_some_and(|v| json_eq(v, expected)))
                })
                .cloned()
                .collect()),
        }
    }
}

/// JSON equality where numbers compare by value, so `2` equals `2.0`.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len() && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

fn invalid(name: &'static str, reason: &'static str) -> ProcessingError {
    ProcessingError::InvalidOption { name, reason }
}
