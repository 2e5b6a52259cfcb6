//! Request-path services layered on top of `catalog-core` (C9, §4.9, §9).

pub mod candidate;
pub mod orchestrator;
pub mod persist_queue;

pub use orchestrator::Orchestrator;
pub use persist_queue::{PersistJob, PersistQueue};
