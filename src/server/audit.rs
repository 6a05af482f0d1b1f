//! # Audit Log
//! src/server/audit.rs
//!
//! Una línea por request atendido, con el formato
//!
//! ```text
//! GET,/archivo.txt,200,1
//! ```
//!
//! (método, URI, código, valor del header `Request-Id` o `0`). Si la
//! cabecera se rechazó, igual se registra lo que tenía la request line;
//! solo cuando la request line misma es inválida se escribe `-,/-`.

use crate::http::{PartialHead, RequestHead, StatusCode};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Resultado de un request, para auditoría
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub method: Option<String>,
    pub uri: Option<String>,
    pub status: StatusCode,
    pub request_id: String,
}

impl AuditRecord {
    /// Registro de un request cuya cabecera se parseó bien
    pub fn from_head(head: &RequestHead, status: StatusCode) -> Self {
        Self {
            method: Some(head.method().as_str().to_string()),
            uri: Some(head.uri().to_string()),
            status,
            request_id: head.request_id().to_string(),
        }
    }

    /// Registro de un request cuya cabecera se rechazó
    pub fn rejected(partial: Option<PartialHead>, status: StatusCode) -> Self {
        match partial {
            Some(partial) => Self {
                request_id: partial.request_id().to_string(),
                method: Some(partial.method.as_str().to_string()),
                uri: Some(partial.uri),
                status,
            },
            None => Self {
                method: None,
                uri: None,
                status,
                request_id: "0".to_string(),
            },
        }
    }
}

impl std::fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},/{},{},{}",
            self.method.as_deref().unwrap_or("-"),
            self.uri.as_deref().unwrap_or("-"),
            self.status.as_u16(),
            self.request_id
        )
    }
}

/// Destino de los registros de auditoría
///
/// Se llama desde varios workers a la vez.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Escribe cada registro como una línea en stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, record: &AuditRecord) {
        // El lock de stderr mantiene la línea entera
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", record);
    }
}

/// Guarda los registros en memoria
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia de los registros en orden de llegada
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}
