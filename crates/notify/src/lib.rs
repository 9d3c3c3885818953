//! Human-readable messages for detected anomalies.
//!
//! This crate provides:
//! - `Tone` and `RenderedMessage`, the renderer's input selector and output
//! - `MessageRenderer`, minijinja templates keyed by anomaly kind and tone
//! - the recommendation table keyed by anomaly kind and severity

pub mod templating;
pub mod traits;

pub use templating::{recommendation, severity_marker, MessageContext, MessageRenderer};
pub use traits::{NotifyError, RenderedMessage, Tone};
