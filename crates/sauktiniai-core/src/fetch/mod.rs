//! Region fetching: window planning and the bounded concurrent aggregator.

pub mod aggregator;
pub mod window;

pub use aggregator::{Aggregator, FailedWindow, FetchReport, WindowOutcome};
pub use window::{plan_windows, Window};
