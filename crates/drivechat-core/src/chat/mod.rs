//! Chat-turn orchestration: message history, the single-in-flight-turn
//! state machine, and the cosmetic staged-progress indicator.
//!
//! Architecture mirrors a reducer/effect split: [`update`] is the single
//! place state mutates; it returns [`ChatEffect`]s that the runtime executes
//! (network call, timer spawning, session teardown). Timers are tagged with
//! the turn's [`Generation`] and guarded by a per-turn cancellation token,
//! so a superseded timer can never touch a later turn's stage.

mod effects;
mod state;
mod update;

pub use effects::{ChatEffect, ChatEvent};
pub use state::{ChatState, Generation, Message, Role, Stage, StageTuning, TurnState};
pub use update::update;
