pub mod builder;
mod datetime;
mod duration;
mod time;

pub use datetime::DateTime;
pub use duration::Duration;
pub use time::Time;
