//! Chat state: message history and the in-flight-turn descriptor.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::protocol::IntermediateStep;

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the append-only conversation history.
///
/// Immutable once appended; `id` is unique within a controller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub steps: Vec<IntermediateStep>,
    pub is_error: bool,
    pub tokens: Option<u64>,
}

/// Cosmetic progress stage shown while a turn is in flight.
///
/// Carries no protocol meaning. Variant order defines the only legal
/// direction of timer-driven advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    #[default]
    Idle,
    Searching,
    Reading,
    Thinking,
}

impl Stage {
    /// Human label for display.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Searching => "searching",
            Stage::Reading => "reading",
            Stage::Thinking => "thinking",
        }
    }
}

/// Monotonically increasing id distinguishing turns.
///
/// Used to invalidate stale timers and stale resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(pub u64);

/// The single in-flight-turn descriptor.
///
/// Invariant: `timers` is `Some` exactly while `stage != Idle`. Dropping a
/// non-idle `TurnState` cancels the timers, which covers controller
/// teardown mid-turn.
#[derive(Debug, Default)]
pub struct TurnState {
    stage: Stage,
    generation: Generation,
    timers: Option<CancellationToken>,
}

impl TurnState {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_idle(&self) -> bool {
        self.stage == Stage::Idle
    }

    /// Starts a turn: stage Idle -> Searching under a fresh timer token.
    ///
    /// Returns the token the runtime hands to both stage timers.
    pub(crate) fn begin(&mut self, generation: Generation) -> CancellationToken {
        debug_assert!(self.is_idle(), "at most one turn may be in flight");
        let token = CancellationToken::new();
        self.stage = Stage::Searching;
        self.generation = generation;
        self.timers = Some(token.clone());
        token
    }

    /// Advances the cosmetic stage (timer-driven, forward only).
    pub(crate) fn advance(&mut self, stage: Stage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Ends the turn: stage -> Idle, yielding the timer token to cancel.
    pub(crate) fn finish(&mut self) -> Option<CancellationToken> {
        self.stage = Stage::Idle;
        self.timers.take()
    }
}

impl Drop for TurnState {
    fn drop(&mut self) {
        if let Some(token) = self.timers.take() {
            token.cancel();
        }
    }
}

/// Stage-timer thresholds (heuristic UX values, no functional contract).
#[derive(Debug, Clone, Copy)]
pub struct StageTuning {
    /// Searching -> Reading after this long.
    pub read_after: Duration,
    /// Reading -> Thinking after this long.
    pub think_after: Duration,
}

impl StageTuning {
    pub fn from_config(config: &Config) -> Self {
        Self {
            read_after: Duration::from_millis(config.stage_read_after_ms),
            think_after: Duration::from_millis(config.stage_think_after_ms),
        }
    }
}

/// Conversation state owned by one controller instance.
pub struct ChatState {
    /// Append-only message history.
    pub history: Vec<Message>,
    /// Pending user input, cleared when a submit is accepted.
    pub draft: String,
    /// The in-flight-turn descriptor.
    pub turn: TurnState,
    pub(crate) tuning: StageTuning,
    next_message_id: u64,
    next_generation: u64,
}

impl ChatState {
    pub fn new(tuning: StageTuning) -> Self {
        Self {
            history: Vec::new(),
            draft: String::new(),
            turn: TurnState::default(),
            tuning,
            next_message_id: 0,
            next_generation: 0,
        }
    }

    pub(crate) fn next_generation(&mut self) -> Generation {
        self.next_generation = self.next_generation.wrapping_add(1);
        Generation(self.next_generation)
    }

    /// Appends a message to the history, allocating its id.
    pub(crate) fn push_message(
        &mut self,
        role: Role,
        content: String,
        steps: Vec<IntermediateStep>,
        is_error: bool,
        tokens: Option<u64>,
    ) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.history.push(Message {
            id,
            role,
            content,
            timestamp: Utc::now(),
            steps,
            is_error,
            tokens,
        });
    }
}
