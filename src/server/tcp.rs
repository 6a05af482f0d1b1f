//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! El thread principal solo acepta conexiones y las encola. Un pool fijo de
//! workers las atiende, un request por conexión. Si la cola está llena, el
//! `accept` se frena hasta que un worker libere lugar.

use super::audit::{AuditSink, StderrAuditSink};
use super::dispatch::Dispatcher;
use crate::config::Config;
use crate::error::ServerError;
use crate::resources::FileStore;
use crate::workers::{BoundedQueue, WorkerPool};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Servidor de archivos HTTP/1.1 con pool de workers
pub struct Server {
    listener: TcpListener,
    pool: WorkerPool<TcpStream>,
}

impl Server {
    /// Valida la configuración, abre el puerto y lanza los workers
    ///
    /// La auditoría va a stderr.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        Self::with_audit(config, Arc::new(StderrAuditSink))
    }

    /// Igual que [`Server::bind`], con un destino de auditoría propio
    pub fn with_audit(config: &Config, audit: Arc<dyn AuditSink>) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        let dispatcher = Dispatcher::new(FileStore::new(&config.data_dir), audit);
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity()));
        let pool = WorkerPool::new(config.threads, queue, move |worker, stream: TcpStream| {
            debug!(worker, "handling connection");
            dispatcher.handle_connection(stream);
        })
        .map_err(ServerError::Spawn)?;

        info!(
            address = %address,
            threads = config.threads,
            queue_capacity = config.queue_capacity(),
            dir = %config.data_dir,
            "server listening"
        );

        Ok(Self { listener, pool })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Loop de accept; no retorna mientras el listener siga abierto
    ///
    /// Un error de `accept` se registra y se sigue aceptando.
    pub fn run(&self) -> Result<(), ServerError> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Ok(peer) = stream.peer_addr() {
                        debug!(%peer, "accepted connection");
                    }
                    self.pool.submit(stream);
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }

        Ok(())
    }

    /// Workers vivos
    pub fn workers(&self) -> usize {
        self.pool.size()
    }
}
