mod catalogue;
mod error;
mod interpolation;
pub mod schedule;
mod scheduler;
mod state;
mod transition;
pub mod unit;

pub use catalogue::{Catalogue, Cursor};
pub use error::{Error, Result};
pub use interpolation::Interpolation;
pub use schedule::ScheduleDocument;
pub use scheduler::{ScheduledClimate, Scheduler, SequentialScheduler, StatelessScheduler};
pub use state::State;
pub use transition::Transition;
