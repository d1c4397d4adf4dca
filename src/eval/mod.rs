//! Single-command execution against a container engine

pub mod result;
pub mod runner;
pub mod sink;

pub use result::EvalResult;
pub use runner::{eval, EvalRequest};
pub use sink::StreamSink;
