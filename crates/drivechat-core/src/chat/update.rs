//! The chat reducer: the single place conversation state mutates.

use crate::api::ApiFailure;
use crate::chat::effects::{ChatEffect, ChatEvent};
use crate::chat::state::{ChatState, Role, Stage};
use crate::protocol::{ChatRequest, ChatResponse, HISTORY_WINDOW, HistoryEntry};

/// Fallback content when the backend returns neither answer nor error.
const NO_ANSWER_FALLBACK: &str = "No answer generated.";

/// Applies one event to the chat state and returns effects for the runtime.
///
/// `folder_id` is the folder-scope selection at the time of the event; it is
/// captured into the request on submit and ignored otherwise.
pub fn update(state: &mut ChatState, folder_id: Option<&str>, event: ChatEvent) -> Vec<ChatEffect> {
    match event {
        ChatEvent::Submit { text } => handle_submit(state, folder_id, &text),
        ChatEvent::StageTimerFired {
            generation,
            stage,
        } => {
            // A timer from a superseded turn must be a no-op.
            if state.turn.is_idle() || generation != state.turn.generation() {
                return vec![];
            }
            state.turn.advance(stage);
            vec![]
        }
        ChatEvent::TurnResolved {
            generation,
            result,
        } => {
            if state.turn.is_idle() || generation != state.turn.generation() {
                tracing::debug!(?generation, "stale turn resolution ignored");
                return vec![];
            }
            handle_resolution(state, result)
        }
        ChatEvent::Clear => {
            if !state.turn.is_idle() {
                tracing::debug!("clear rejected while a turn is in flight");
                return vec![];
            }
            state.history.clear();
            state.draft.clear();
            vec![]
        }
    }
}

fn handle_submit(state: &mut ChatState, folder_id: Option<&str>, text: &str) -> Vec<ChatEffect> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![];
    }
    if !state.turn.is_idle() {
        tracing::debug!("submit rejected: a turn is already in flight");
        return vec![];
    }

    // Window the prior history (before this message) to (role, content).
    let start = state.history.len().saturating_sub(HISTORY_WINDOW);
    let history: Vec<HistoryEntry> = state.history[start..]
        .iter()
        .map(|m| HistoryEntry {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        })
        .collect();

    let request = ChatRequest {
        message: trimmed.to_string(),
        history,
        folder_id: folder_id.map(ToString::to_string),
    };

    state.push_message(Role::User, trimmed.to_string(), Vec::new(), false, None);
    state.draft.clear();

    let generation = state.next_generation();
    let cancel = state.turn.begin(generation);
    tracing::debug!(?generation, "turn started");

    vec![
        ChatEffect::ScheduleStage {
            generation,
            stage: Stage::Reading,
            delay: state.tuning.read_after,
            cancel: cancel.clone(),
        },
        ChatEffect::ScheduleStage {
            generation,
            stage: Stage::Thinking,
            delay: state.tuning.think_after,
            cancel,
        },
        ChatEffect::SendChat {
            generation,
            request,
        },
    ]
}

fn handle_resolution(
    state: &mut ChatState,
    result: Result<ChatResponse, ApiFailure>,
) -> Vec<ChatEffect> {
    let mut effects = Vec::new();
    if let Some(cancel) = state.turn.finish() {
        effects.push(ChatEffect::CancelStageTimers { cancel });
    }

    match result {
        Ok(response) => {
            let backend_error = response
                .error
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty());
            let (content, is_error) = match backend_error {
                Some(error) => (format!("Request failed: {error}"), true),
                None if response.answer.is_empty() => (NO_ANSWER_FALLBACK.to_string(), false),
                None => (response.answer.clone(), false),
            };
            state.push_message(
                Role::Assistant,
                content,
                response.intermediate_steps,
                is_error,
                Some(response.tokens),
            );
        }
        Err(ApiFailure::SessionExpired) => {
            state.push_message(
                Role::Assistant,
                "Session expired. Please log in again.".to_string(),
                Vec::new(),
                true,
                None,
            );
            effects.push(ChatEffect::InvalidateSession);
        }
        Err(failure) => {
            state.push_message(
                Role::Assistant,
                format!("Request failed: {failure}"),
                Vec::new(),
                true,
                None,
            );
        }
    }

    effects
}
