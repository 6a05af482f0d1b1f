pub mod audit;
pub mod dispatch;
pub mod tcp;

pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, StderrAuditSink};
pub use dispatch::Dispatcher;
pub use tcp::Server;
