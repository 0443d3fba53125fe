//! The two cadence modes and the active-mode selector.

mod passthrough;
mod zero_hertz;

pub use passthrough::PassthroughMode;
pub use zero_hertz::{ZeroHertzMode, IDLE_REPEAT_PERIOD};

/// Which mode currently consumes ingress frames.
///
/// The dispatcher owns both mode instances and dispatches by variant match;
/// no dynamic dispatch is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveMode {
    #[default]
    Passthrough,
    ZeroHertz,
}
