//! Action outputs and formatting module

pub mod format;
pub mod writer;

pub use format::{safe_output_escape, ActionOutputs};
pub use writer::OutputWriter;
