//! Decoded pCloud API responses.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{PCloudError, Result};

/// A JSON response from the pCloud API.
///
/// Every JSON response carries a numeric `result`; zero means success.
/// The `result` key is hidden from the field accessors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    data: Map<String, Value>,
}

impl ApiResponse {
    /// Wrap a decoded JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(PCloudError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// The pCloud result code (0 on success).
    pub fn result(&self) -> Result<u32> {
        self.data
            .get("result")
            .and_then(Value::as_u64)
            .map(|r| r as u32)
            .ok_or_else(|| PCloudError::InvalidResponse("missing 'result'".to_string()))
    }

    /// Turn a non-zero result into an [`PCloudError::ApiError`].
    pub fn check(self) -> Result<Self> {
        match self.result()? {
            0 => Ok(self),
            code => Err(PCloudError::api(code)),
        }
    }

    /// Whether the response has a field (other than `result`).
    pub fn contains(&self, name: &str) -> bool {
        name != "result" && self.data.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        if name == "result" {
            return None;
        }
        self.data.get(name)
    }

    /// Remove a field and return it.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        if name == "result" {
            return None;
        }
        self.data.remove(name)
    }

    pub fn u64(&self, name: &str) -> Result<u64> {
        self.get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| missing(name))
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(name))
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| missing(name))
    }

    /// Deserialize one field into a typed value.
    pub fn parse<T: DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let value = self.take(name).ok_or_else(|| missing(name))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Deserialize the whole response (minus `result`) into a typed value.
    pub fn into_typed<T: DeserializeOwned>(mut self) -> Result<T> {
        self.data.remove("result");
        Ok(serde_json::from_value(Value::Object(self.data))?)
    }
}

fn missing(name: &str) -> PCloudError {
    PCloudError::InvalidResponse(format!("missing or ill-typed '{}'", name))
}
