//! Main coordination logic

pub mod classifier;
pub mod correlator;
pub mod orchestrator;
pub mod tagger;

pub use classifier::classify;
pub use correlator::ReleaseCorrelator;
pub use orchestrator::ReleaseOrchestrator;
pub use tagger::create_tag;
