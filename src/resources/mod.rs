//! # Capa de Acceso a Recursos
//!
//! Envuelve apertura, lock y cierre de archivos alrededor de GET (lock
//! compartido) y PUT (lock exclusivo, truncado, creación si no existe).
//! Requests a paths distintos no comparten ningún lock.

pub mod access;
pub mod lock;

pub use access::{status_for, Access, FileErrorKind, FileStore, HandlerResult, StreamError};
pub use lock::{FileLock, LockMode};
