//! Uniform response envelope for REST handlers
//!
//! Every handler answers with the same JSON shape:
//!
//! ```json
//! { "status": "success", "results": 4, "data": { "tours": [ ... ] } }
//! { "status": "fail", "message": "No tour found with ID: 42" }
//! { "status": "error", "message": "Something went very wrong" }
//! ```
//!
//! `status` is `success` on 2xx, `fail` on handled 4xx, and `error` on 5xx.
//! Auth responses additionally carry a `token`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::store::Document;

/// Outcome marker carried by every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The request succeeded
    Success,
    /// The request failed in an anticipated, caller-visible way (4xx)
    Fail,
    /// The request failed unexpectedly (5xx)
    Error,
}

impl Status {
    /// Derive the marker from an HTTP status code
    #[must_use]
    pub fn from_code(code: StatusCode) -> Self {
        if code.is_client_error() {
            Self::Fail
        } else if code.is_server_error() {
            Self::Error
        } else {
            Self::Success
        }
    }
}

/// The uniform response body
///
/// # Example
///
/// ```rust
/// use natours_api::handlers::envelope::Envelope;
/// use serde_json::json;
///
/// let body = Envelope::item("tour", json!({"name": "The Forest Hiker"}));
/// let rendered = serde_json::to_value(&body).unwrap();
/// assert_eq!(rendered["status"], "success");
/// assert_eq!(rendered["data"]["tour"]["name"], "The Forest Hiker");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(skip)]
    code: StatusCode,

    /// Outcome marker
    pub status: Status,

    /// JWT issued by an auth operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Number of entities in a list response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,

    /// Caller-facing message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Payload, keyed by the entity display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    fn success(code: StatusCode, data: Option<Value>) -> Self {
        Self {
            code,
            status: Status::Success,
            token: None,
            results: None,
            message: None,
            data,
        }
    }

    /// 200 with a single entity under `key`
    #[must_use]
    pub fn item(key: &str, entity: impl Into<Value>) -> Self {
        Self::success(
            StatusCode::OK,
            Some(Value::Object(one_entry(key, entity.into()))),
        )
    }

    /// 201 with the created entity under `key`
    #[must_use]
    pub fn created(key: &str, entity: impl Into<Value>) -> Self {
        Self::success(
            StatusCode::CREATED,
            Some(Value::Object(one_entry(key, entity.into()))),
        )
    }

    /// 200 with a list of entities under `key` and its `results` count
    #[must_use]
    pub fn list(key: &str, entities: Vec<Document>) -> Self {
        let results = entities.len();
        let items: Vec<Value> = entities.into_iter().map(Value::Object).collect();
        let mut envelope = Self::success(
            StatusCode::OK,
            Some(Value::Object(one_entry(key, Value::Array(items)))),
        );
        envelope.results = Some(results);
        envelope
    }

    /// 200 with no payload (used with [`Self::with_token`] by auth flows)
    #[must_use]
    pub fn ok() -> Self {
        Self::success(StatusCode::OK, None)
    }

    /// 200 with an informational message instead of data
    #[must_use]
    pub fn ok_message(message: impl Into<String>) -> Self {
        let mut envelope = Self::success(StatusCode::OK, None);
        envelope.message = Some(message.into());
        envelope
    }

    /// 204 with no body
    #[must_use]
    pub fn no_content() -> Self {
        Self::success(StatusCode::NO_CONTENT, None)
    }

    /// A failure envelope; `status` follows the code (`fail` vs `error`)
    #[must_use]
    pub fn failure(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: Status::from_code(code),
            token: None,
            results: None,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Attach a JWT to the envelope
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The HTTP status code this envelope renders with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code
    }
}

fn one_entry(key: &str, value: Value) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::with_capacity(1);
    map.insert(key.to_string(), value);
    map
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        if self.code == StatusCode::NO_CONTENT {
            return self.code.into_response();
        }
        (self.code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_item_shape() {
        let envelope = Envelope::item("tour", json!({"name": "Hiker"}));
        assert_eq!(envelope.status_code(), StatusCode::OK);

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["tour"]["name"], "Hiker");
        assert!(body.get("results").is_none());
        assert!(body.get("message").is_none());
        assert!(body.get("token").is_none());
    }

    #[test]
    fn test_created_shape() {
        let envelope = Envelope::created("review", json!({"rating": 5}));
        assert_eq!(envelope.status_code(), StatusCode::CREATED);
    }

    #[test]
    fn test_list_counts_results() {
        let envelope = Envelope::list(
            "tours",
            vec![doc(json!({"name": "A"})), doc(json!({"name": "B"}))],
        );
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["results"], 2);
        assert_eq!(body["data"]["tours"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_list_is_success() {
        let envelope = Envelope::list("tours", Vec::new());
        assert_eq!(envelope.status_code(), StatusCode::OK);
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["results"], 0);
        assert_eq!(body["data"]["tours"], json!([]));
    }

    #[test]
    fn test_failure_status_marker_tracks_code() {
        let fail = Envelope::failure(StatusCode::NOT_FOUND, "No tour found with ID: 42");
        assert_eq!(serde_json::to_value(&fail).unwrap()["status"], "fail");

        let error = Envelope::failure(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(serde_json::to_value(&error).unwrap()["status"], "error");
    }

    #[test]
    fn test_token_attached() {
        let envelope = Envelope::item("user", json!({"name": "Ada"})).with_token("jwt");
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["token"], "jwt");
    }

    #[test]
    fn test_no_content_has_no_body() {
        let envelope = Envelope::no_content();
        assert_eq!(envelope.status_code(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_ok_message_is_success() {
        let envelope = Envelope::ok_message("Token sent to email!");
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Token sent to email!");
        assert!(body.get("data").is_none());
    }
}
