//! # Despacho de Requests
//! src/server/dispatch.rs
//!
//! Lo que hace un worker con cada conexión que saca de la cola:
//!
//! 1. Crea un `Connection` nuevo sobre el stream
//! 2. Lee y parsea la cabecera (si falla, responde el error)
//! 3. Despacha a GET, PUT o 501
//! 4. Emite el registro de auditoría
//! 5. Cierra la conexión, descartando lo que el cliente no llegó a mandar

use super::audit::{AuditRecord, AuditSink};
use crate::http::{Connection, Linger, Method, ParseError, StatusCode};
use crate::resources::access::respond;
use crate::resources::{FileStore, HandlerResult};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Atiende un request por conexión
pub struct Dispatcher {
    store: FileStore,
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    pub fn new(store: FileStore, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Lleva un request de principio a fin y devuelve lo que se auditó
    ///
    /// `None` si el cliente cerró sin mandar nada.
    pub fn handle_connection<S: Read + Write + Linger>(&self, stream: S) -> Option<AuditRecord> {
        let start = Instant::now();
        let mut conn = Connection::new(stream);

        let record = self.serve(&mut conn)?;
        self.audit.record(&record);

        info!(
            "{} /{} -> {} ({:.2}ms)",
            record.method.as_deref().unwrap_or("-"),
            record.uri.as_deref().unwrap_or("-"),
            record.status,
            start.elapsed().as_secs_f64() * 1000.0
        );

        let drained = conn.close();
        if drained > 0 {
            debug!(drained, "discarded unread request bytes");
        }

        Some(record)
    }

    fn serve<S: Read + Write>(&self, conn: &mut Connection<S>) -> Option<AuditRecord> {
        let head = match conn.read_request_head() {
            Ok(head) => head,
            Err(ParseError::ConnectionClosed) => {
                debug!("connection closed before sending a request");
                return None;
            }
            Err(e) => {
                let status = e.status().unwrap_or(StatusCode::BadRequest);
                debug!(error = %e, %status, "rejecting request head");

                if let Err(e) = respond(conn, status) {
                    warn!(error = %e, "could not deliver error response");
                }
                return Some(AuditRecord::rejected(conn.partial_head(), status));
            }
        };

        let result: HandlerResult = match head.method() {
            Method::Get => self.store.handle_get(head.uri(), conn),
            Method::Put => match head.content_length() {
                Some(declared) => self.store.handle_put(head.uri(), declared, conn),
                None => respond(conn, StatusCode::BadRequest),
            },
            Method::Other(_) => respond(conn, StatusCode::NotImplemented),
        };

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!(method = %head.method(), uri = head.uri(), error = %e, "connection abandoned");
                e.status
            }
        };

        Some(AuditRecord::from_head(&head, status))
    }
}
