//! # Errores Fatales del Servidor
//! src/error.rs
//!
//! Solo los errores de arranque detienen el proceso. Los errores por
//! request se convierten en respuestas y nunca llegan hasta aquí.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No se pudo abrir el puerto
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// No se pudo crear un thread del pool
    #[error("cannot spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// Falla de I/O del listener
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
