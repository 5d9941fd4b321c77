//! Seismo-Processing: smoothing pipeline and engine
//!
//! Real-time magnitude smoothing with a bounded reading history, and the
//! engine that wires a sensor source to display subscribers.

pub mod engine;
pub mod history;
pub mod processor;
pub mod smoothing;

pub use engine::{Engine, EngineState, EngineStats, EngineView, ReadingCallback};
pub use history::HistoryBuffer;
pub use processor::SignalProcessor;
pub use smoothing::ExponentialSmoother;
