//! Watch core: pure poll state machine.
//!
//! Nothing in this crate performs IO or sleeps. A driver feeds [`Msg`]s into
//! [`update`] and executes the returned [`Effect`]s in order.
mod effect;
mod msg;
mod state;
mod update;

pub use effect::{DelayReason, Effect, Notification, Termination};
pub use msg::{CycleOutcome, Msg};
pub use state::{Phase, PollSettings, PollState};
pub use update::update;
