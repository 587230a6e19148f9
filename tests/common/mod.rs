#![allow(dead_code)]

use serde_json::Value;

pub use benchrunner_test_utils::{
    init_tracing, settings_in, with_timeout, DependencyBuilder, FakeBackend, JobBuilder,
    RecordingReclaimer,
};

/// Whether `key` appears as an object key anywhere inside `value`.
pub fn contains_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.contains_key(key) || map.values().any(|v| contains_key(v, key)),
        Value::Array(items) => items.iter().any(|v| contains_key(v, key)),
        _ => false,
    }
}
