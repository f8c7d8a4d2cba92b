//! n8n API data model
//!
//! Decoding is lenient on purpose: n8n versions disagree on whether ids are
//! strings or numbers, whether tags are plain names or `{id, name}` objects,
//! and whether optional maps are omitted or `null`. Fields the model does not
//! name are kept in `extra` so a get → mutate → put round trip sends back the
//! complete definition.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{N8nError, N8nResult};

/// A workflow as stored by n8n
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Assigned by n8n on creation; absent in a definition about to be created
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub active: bool,

    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<Tag>,

    /// Node definitions, not interpreted here
    #[serde(default, deserialize_with = "null_default")]
    pub nodes: Vec<Value>,

    #[serde(default, deserialize_with = "null_default")]
    pub connections: Map<String, Value>,

    #[serde(default, deserialize_with = "null_default")]
    pub settings: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Everything else n8n sent (staticData, versionId, pinData, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workflow {
    /// A fresh definition with every optional field at its default
    pub fn definition(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The id, or an empty string when n8n has not assigned one
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Tag names in order
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name().to_string()).collect()
    }

    /// Case-insensitive substring match against the name or any tag
    ///
    /// An empty query matches every workflow.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|t| t.name().to_lowercase().contains(&needle))
    }

    /// A field n8n sent that the model does not name
    pub fn extra_field(&self, key: &str) -> Value {
        self.extra.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Only the fields a workflow update may send
    ///
    /// n8n rejects server-managed fields (id, timestamps, versionId,
    /// staticData, pinData) in an update body.
    pub fn writable(&self) -> Self {
        Self {
            name: self.name.clone(),
            active: self.active,
            tags: self.tags.clone(),
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            settings: self.settings.clone(),
            ..Self::default()
        }
    }
}

/// A workflow tag, either a bare name or an n8n tag object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Name(String),
    Object {
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Name(name) => name,
            Tag::Object { name, .. } => name,
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Name(name.to_string())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::Name(name)
    }
}

/// Derived status of an execution
///
/// Never stored; computed from `stoppedAt` and `finished` on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Running,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Running => "running",
        }
    }
}

/// One run of a workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Weak reference to the workflow
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub finished: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Snapshot of the workflow that ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_data: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Execution {
    /// `error` if stopped, else `success` if finished, else `running`
    ///
    /// An empty `stoppedAt` string counts as absent.
    pub fn status(&self) -> ExecutionStatus {
        if self.has_stopped() {
            ExecutionStatus::Error
        } else if self.finished {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Running
        }
    }

    pub fn has_stopped(&self) -> bool {
        self.stopped_at.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Name of the workflow that ran, from the embedded snapshot
    pub fn workflow_name(&self) -> Option<String> {
        self.workflow_data
            .as_ref()
            .and_then(|w| w.get("name"))
            .and_then(Value::as_str)
            .map(String::from)
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }
}

/// Counts and rates over a window of recent executions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatistics {
    pub workflow_id: String,
    pub total_executions: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub waiting_count: usize,
    /// Percentage, two decimals
    pub success_rate: f64,
    /// Percentage, two decimals
    pub error_rate: f64,
    /// The window size that was requested
    pub analyzed_executions: u32,
}

impl WorkflowStatistics {
    /// Compute statistics over `executions`
    ///
    /// success = finished and not stopped, error = stopped, waiting = not
    /// finished. The buckets are not exclusive: a stopped, unfinished run
    /// counts as both error and waiting. No executions yields zero rates.
    pub fn from_executions(workflow_id: &str, executions: &[Execution], limit: u32) -> Self {
        let total = executions.len();
        let success_count = executions
            .iter()
            .filter(|e| e.finished && !e.has_stopped())
            .count();
        let error_count = executions.iter().filter(|e| e.has_stopped()).count();
        let waiting_count = executions.iter().filter(|e| !e.finished).count();

        Self {
            workflow_id: workflow_id.to_string(),
            total_executions: total,
            success_count,
            error_count,
            waiting_count,
            success_rate: percentage(success_count, total),
            error_rate: percentage(error_count, total),
            analyzed_executions: limit,
        }
    }
}

/// `part / total * 100` to two decimals, zero when `total` is zero
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_half_even_2dp(part as f64 / total as f64 * 100.0)
}

/// Round to two decimals, ties to even, on the exact binary value
///
/// Matches Python's `round(x, 2)`: 3.125 becomes 3.12 and 2.675 (stored as
/// 2.67499...) becomes 2.67.
fn round_half_even_2dp(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }

    // x = mantissa * 2^exp, exactly
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if exp >= 0 {
        return x;
    }

    let shift = exp.unsigned_abs();
    let scaled = mantissa as u128 * 100;
    let quotient = if shift >= 127 {
        0
    } else {
        let divisor = 1u128 << shift;
        let (q, r) = (scaled / divisor, scaled % divisor);
        match (2 * r).cmp(&divisor) {
            std::cmp::Ordering::Greater => q + 1,
            std::cmp::Ordering::Equal if q % 2 == 1 => q + 1,
            _ => q,
        }
    };

    let rounded = quotient as f64 / 100.0;
    if x.is_sign_negative() {
        -rounded
    } else {
        rounded
    }
}

/// Result of a liveness probe against n8n
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub url: String,
    pub message: String,
}

/// Shape of a list endpoint response
///
/// n8n answers list calls either with a bare array or with a page object
/// `{data: [...], nextCursor}`. Anything else decodes as `Unrecognized`
/// and yields no items.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    Bare(Vec<Value>),
    Paged {
        data: Vec<Value>,
        #[serde(default, rename = "nextCursor")]
        next_cursor: Option<String>,
    },
    Unrecognized(Value),
}

impl ListEnvelope {
    /// Decode the raw body of a list endpoint
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(ListEnvelope::Unrecognized(value))
    }

    /// Decode every item into `T`
    ///
    /// A malformed item is an error; an unrecognized envelope is not.
    pub fn into_items<T: DeserializeOwned>(self) -> N8nResult<Vec<T>> {
        let raw = match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Paged { data, .. } => data,
            ListEnvelope::Unrecognized(other) => {
                tracing::warn!(shape = %value_kind(&other), "Unrecognized list response shape from n8n");
                Vec::new()
            }
        };

        raw.into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| N8nError::InvalidResponse(e.to_string()))
            })
            .collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Treat an explicit `null` like an absent field
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept ids as strings or numbers
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
