/*!
 * Process Memory
 * Opaque, process-owned payload persisted next to the record
 */

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Private state a process carries across cycles
///
/// The kernel stores and restores this blob verbatim under the process's PID
/// and never looks inside it. Processes usually keep a JSON object and use
/// the typed [`get`](Self::get) / [`set`](Self::set) helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessMemory(Value);

impl ProcessMemory {
    /// Empty object memory
    #[inline]
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap a raw JSON payload
    #[inline]
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[inline]
    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    #[inline]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Null or an empty object; such memory is not written to the store
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Read and decode one field; absent or mistyped fields yield `None`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Encode and store one field, turning non-object memory into an object
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> serde_json::Result<()> {
        let encoded = serde_json::to_value(value)?;
        self.object_mut().insert(key.to_string(), encoded);
        Ok(())
    }

    /// Remove one field, returning its raw value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match &mut self.0 {
            Value::Object(map) => map.remove(key),
            _ => None,
        }
    }

    fn object_mut(&mut self) -> &mut Map<String, Value> {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        match &mut self.0 {
            Value::Object(map) => map,
            _ => unreachable!("memory was just replaced with an object"),
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for ProcessMemory {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
