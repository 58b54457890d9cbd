use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Outcome tag carried by every API envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response envelope: `{"status": "...", "message"?: "...", "data"?: ...}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self { status: Status::Success, message: None, data: Some(data) }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self { status: Status::Success, message: Some(message.into()), data: Some(data) }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { status: Status::Success, message: Some(message.into()), data: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, message: Some(message.into()), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_envelope_omits_data() {
        let v = serde_json::to_value(Envelope::error("not found")).unwrap();
        assert_eq!(v, json!({"status": "error", "message": "not found"}));
    }

    #[test]
    fn data_envelope_omits_message() {
        let v = serde_json::to_value(Envelope::data(vec![1, 2])).unwrap();
        assert_eq!(v, json!({"status": "success", "data": [1, 2]}));
    }
}
