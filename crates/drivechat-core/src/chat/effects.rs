//! Events consumed by the chat reducer and effects it returns.
//!
//! Effects represent I/O and task spawning only; the reducer never performs
//! network calls or spawns timers itself. The runtime executes each effect
//! and feeds completions back in as events.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::ApiFailure;
use crate::chat::state::{Generation, Stage};
use crate::protocol::{ChatRequest, ChatResponse};

/// Inputs to the chat reducer.
#[derive(Debug)]
pub enum ChatEvent {
    /// User submitted the given text.
    Submit { text: String },

    /// A cosmetic stage timer fired. Ignored unless `generation` matches
    /// the active turn.
    StageTimerFired {
        generation: Generation,
        stage: Stage,
    },

    /// The network call for a turn resolved (success or failure).
    TurnResolved {
        generation: Generation,
        result: Result<ChatResponse, ApiFailure>,
    },

    /// Reset history and draft. Rejected while a turn is in flight.
    Clear,
}

/// Effects returned by the chat reducer for the runtime to execute.
#[derive(Debug)]
pub enum ChatEffect {
    /// Dispatch the chat request; resolve with `ChatEvent::TurnResolved`.
    SendChat {
        generation: Generation,
        request: ChatRequest,
    },

    /// Schedule a cosmetic stage advancement after `delay`, guarded by the
    /// turn's timer token; fire `ChatEvent::StageTimerFired` unless
    /// cancelled first.
    ScheduleStage {
        generation: Generation,
        stage: Stage,
        delay: Duration,
        cancel: CancellationToken,
    },

    /// Cancel both stage timers of a resolved turn.
    CancelStageTimers { cancel: CancellationToken },

    /// Tear the session down: clear persisted state and stop issuing
    /// authenticated calls from this controller.
    InvalidateSession,
}
