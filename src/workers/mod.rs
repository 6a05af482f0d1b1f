//! # Workers
//!
//! Handoff productor/consumidor entre el loop de accept y un pool fijo de
//! threads:
//!
//! ```text
//! accept ──push──► BoundedQueue ──pop──► worker-0 .. worker-N
//! ```

pub mod pool;
pub mod queue;

pub use pool::{Message, WorkerPool};
pub use queue::BoundedQueue;
