//! Core types for cadence adaptation.
//!
//! - [`VideoFrame`] is the unit that flows through the adapter, with a
//!   zero-copy payload and the delivery metadata the adapter may rewrite.
//! - [`UpdateRect`] marks the pixels that changed since the previous frame;
//!   repeats are stamped with the empty sentinel.
//! - [`Timestamp`] is the microsecond post time handed to the sink.
//! - [`SourceConstraints`], [`ZeroHertzParams`] and [`AdapterConfig`] carry
//!   the control-plane inputs that select the active mode.

mod constraints;
mod frame;
mod timestamp;

pub use constraints::{AdapterConfig, SourceConstraints, ZeroHertzParams};
pub use frame::{UpdateRect, VideoFrame};
pub use timestamp::Timestamp;
