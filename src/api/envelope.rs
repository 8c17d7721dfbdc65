use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform response wrapper: `{status, message?, ...payload}`.
///
/// `status` is 0 on success and -1 on failure; `message` is only present on
/// failure. Payload keys are flattened next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = -1;

    pub fn success() -> Self {
        Self {
            status: Self::SUCCESS,
            message: None,
            payload: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Self::FAILURE,
            message: Some(message.into()),
            payload: Map::new(),
        }
    }

    /// Add a payload entry. `status` and `message` are reserved and ignored here.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "status" && key != "message" {
            self.payload.insert(key, value.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }

    pub fn into_value(self) -> Value {
        let mut obj = Map::new();
        obj.insert("status".into(), Value::from(self.status));
        if let Some(message) = self.message {
            obj.insert("message".into(), Value::String(message));
        }
        obj.extend(self.payload);
        Value::Object(obj)
    }
}
