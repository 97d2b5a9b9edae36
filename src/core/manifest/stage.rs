//! Stage records and input references

use serde::Serialize;
use serde_json::{json, Value};

/// One step of a pipeline as handed to the execution engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    /// Stage type id (e.g. "org.osbuild.ostree.deploy")
    #[serde(rename = "type")]
    pub stage_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,

    #[serde(skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl Stage {
    /// Create a stage, dropping `null` fields from its options
    pub fn new(stage_type: impl Into<String>, options: Value) -> Self {
        Self {
            stage_type: stage_type.into(),
            inputs: None,
            options: strip_nulls(options),
        }
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = Some(inputs);
        self
    }
}

/// Reference to the filesystem tree produced by another pipeline
pub fn tree_input(pipeline: &str) -> Value {
    json!({
        "type": "org.osbuild.tree",
        "origin": "org.osbuild.pipeline",
        "references": [format!("name:{pipeline}")]
    })
}

/// Reference to a single file produced by another pipeline
pub fn file_input(pipeline: &str, file: &str) -> Value {
    json!({
        "type": "org.osbuild.files",
        "origin": "org.osbuild.pipeline",
        "references": {
            format!("name:{pipeline}"): { "file": file }
        }
    })
}

/// Reference to a commit fetched by the ostree source
pub fn commit_input(checksum: &str, ref_: &str) -> Value {
    json!({
        "type": "org.osbuild.ostree",
        "origin": "org.osbuild.source",
        "references": {
            checksum: { "ref": ref_ }
        }
    })
}

/// Remove `null` members from objects, recursively
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
