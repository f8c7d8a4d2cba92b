//! Typed access to a tool's argument object

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};

/// The argument map of one tool invocation
///
/// A key whose value is JSON `null` is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    /// Accept an object, or `null` for no arguments
    pub fn from_value(value: Value) -> ToolResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ToolError::validation("Tool arguments must be a JSON object")),
        }
    }

    /// Raw value of an argument
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    /// Fail listing every missing name, in the order given
    pub fn require(&self, names: &[&str]) -> ToolResult<()> {
        let missing: Vec<&str> = names.iter().copied().filter(|n| !self.contains(n)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::validation(format!(
                "Missing required arguments: {}",
                missing.join(", ")
            )))
        }
    }

    /// A string argument; numbers are accepted and rendered as strings
    pub fn str(&self, name: &str) -> ToolResult<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(ToolError::validation(format!("Argument '{}' must be a string", name))),
        }
    }

    pub fn required_str(&self, name: &str) -> ToolResult<String> {
        self.require(&[name])?;
        self.str(name)?
            .ok_or_else(|| ToolError::validation(format!("Missing required arguments: {}", name)))
    }

    pub fn str_or(&self, name: &str, default: &str) -> ToolResult<String> {
        Ok(self.str(name)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> ToolResult<bool> {
        match self.value(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ToolError::validation(format!("Argument '{}' must be a boolean", name))),
        }
    }

    /// An integer argument; whole floats such as `20.0` are accepted
    pub fn integer_or(&self, name: &str, default: i64) -> ToolResult<i64> {
        let Some(value) = self.value(name) else {
            return Ok(default);
        };
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| ToolError::validation(format!("Argument '{}' must be an integer", name)))
    }

    /// Decode an argument into `T`
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> ToolResult<Option<T>> {
        self.value(name)
            .map(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| ToolError::validation(format!("Invalid value for '{}': {}", name, e)))
            })
            .transpose()
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
