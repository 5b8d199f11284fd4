pub mod timing;

pub use timing::{timed, AggregateTimer, Timer};
