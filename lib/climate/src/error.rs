use derive_more::derive::{Display, Error};

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a catalogue cannot be built. All of them are fatal for the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum Error {
    #[display("State {name} is defined more than once")]
    DuplicateState { name: String },

    #[display("Transition {transition} references undefined state {name}")]
    UndefinedState { name: String, transition: String },

    #[display("Transition {shadowed} is shadowed by {by}")]
    Shadowed { shadowed: String, by: String },

    #[display("Invalid transition {transition}: {reason}")]
    InvalidTransition { transition: String, reason: String },

    #[display("Invalid state {name}: {reason}")]
    InvalidState { name: String, reason: String },

    #[display("Catalogue needs at least one state")]
    NoStates,
}
