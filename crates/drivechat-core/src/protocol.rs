//! Wire types for the chatbot backend.
//!
//! Shapes mirror the backend contract exactly:
//! - `POST /api/chat` takes `{message, history, folder_id?}` and returns
//!   `{answer, intermediate_steps, tokens, error}`.
//! - `GET /api/folders` returns `{folders: [{id, name}]}`.
//! - `GET /oauth/me` returns `{email, name, picture}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of prior history entries sent with each chat request.
pub const HISTORY_WINDOW: usize = 10;

/// One prior conversation entry as the backend expects it.
///
/// Local message metadata (ids, timestamps, steps, token counts) is never
/// sent; only role and content survive the reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    /// Folder restriction; omitted entirely when the scope is unrestricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

/// One reasoning step reported by the backend agent.
///
/// Opaque to this client beyond display; `action_input` is whatever JSON the
/// agent recorded (string, number, object, or absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateStep {
    #[serde(default)]
    pub thought: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_input: Option<Value>,
    #[serde(default)]
    pub observation: String,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub intermediate_steps: Vec<IntermediateStep>,
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// One folder of the user's document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

/// Response body for `GET /api/folders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldersResponse {
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// Response body for `GET /oauth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: unrestricted requests omit `folder_id` from the JSON body.
    #[test]
    fn test_chat_request_omits_unset_folder() {
        let request = ChatRequest {
            message: "List my PDFs".to_string(),
            history: Vec::new(),
            folder_id: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"message":"List my PDFs","history":[]}"#);
    }

    /// Test: a selected folder is serialized as `folder_id`.
    #[test]
    fn test_chat_request_includes_folder() {
        let request = ChatRequest {
            message: "Summarize".to_string(),
            history: vec![HistoryEntry {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            folder_id: Some("folder-7".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["folder_id"], "folder-7");
        assert_eq!(json["history"][0]["role"], "user");
    }

    /// Test: response fields default when the backend omits them.
    #[test]
    fn test_chat_response_defaults() {
        let response: ChatResponse = serde_json::from_str(r#"{"answer":"ok"}"#).unwrap();
        assert_eq!(response.answer, "ok");
        assert!(response.intermediate_steps.is_empty());
        assert_eq!(response.tokens, 0);
        assert!(response.error.is_none());
    }

    /// Test: intermediate steps accept structured, scalar, or absent inputs.
    #[test]
    fn test_intermediate_step_action_input_shapes() {
        let structured: IntermediateStep = serde_json::from_str(
            r#"{"thought":"t","action":"search_files","action_input":{"query":"pdf"},"observation":"o"}"#,
        )
        .unwrap();
        assert!(structured.action_input.unwrap().is_object());

        let absent: IntermediateStep =
            serde_json::from_str(r#"{"thought":"t","action":"list","observation":"o"}"#).unwrap();
        assert!(absent.action_input.is_none());
    }
}
