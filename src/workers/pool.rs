//! # Pool de Workers
//! src/workers/pool.rs
//!
//! Número fijo de threads de larga vida. Cada worker hace `pop` de la cola
//! compartida, procesa el item y vuelve a esperar. El pool es dueño de los
//! handles y de la cola; `shutdown` manda un `Terminate` por worker y espera
//! a que todos terminen.

use super::queue::BoundedQueue;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Mensajes que viajan por la cola
pub enum Message<T> {
    /// Un item de trabajo (una conexión aceptada)
    Job(T),

    /// Pide al worker que lo reciba que termine su loop
    Terminate,
}

/// Un thread del pool
struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn<T, F>(id: usize, queue: Arc<BoundedQueue<Message<T>>>, handler: Arc<F>) -> io::Result<Self>
    where
        T: Send + 'static,
        F: Fn(usize, T) + Send + Sync + 'static,
    {
        let thread = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                debug!(worker = id, "worker started");

                loop {
                    match queue.pop() {
                        Message::Job(item) => {
                            // Un panic en un request no debe achicar el pool
                            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(id, item)));
                            if result.is_err() {
                                error!(worker = id, "handler panicked; worker keeps running");
                            }
                        }
                        Message::Terminate => {
                            debug!(worker = id, "worker received terminate");
                            break;
                        }
                    }
                }
            })?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }
}

/// Pool de tamaño fijo alimentado por una [`BoundedQueue`]
pub struct WorkerPool<T: Send + 'static> {
    queue: Arc<BoundedQueue<Message<T>>>,
    workers: Vec<Worker>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `size` workers que ejecutan `handler(worker_id, item)`
    ///
    /// Si algún thread no se puede crear, los ya lanzados se detienen y se
    /// retorna el error: un pool incompleto no sirve.
    pub fn new<F>(size: usize, queue: Arc<BoundedQueue<Message<T>>>, handler: F) -> io::Result<Self>
    where
        F: Fn(usize, T) + Send + Sync + 'static,
    {
        assert!(size > 0, "worker pool size must be >= 1");

        let handler = Arc::new(handler);
        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(size),
        };

        for id in 0..size {
            // Si falla, `pool` se dropea y detiene a los ya lanzados
            let worker = Worker::spawn(id, Arc::clone(&pool.queue), Arc::clone(&handler))?;
            pool.workers.push(worker);
        }

        info!(workers = size, capacity = pool.queue.capacity(), "worker pool ready");
        Ok(pool)
    }

    /// Encola un item; bloquea mientras la cola esté llena
    pub fn submit(&self, item: T) {
        self.queue.push(Message::Job(item));
    }

    /// Número de workers vivos
    pub fn size(&self) -> usize {
        self.workers.iter().filter(|w| w.thread.is_some()).count()
    }

    /// Detiene todos los workers y espera a que terminen
    ///
    /// Los items encolados antes del shutdown se procesan primero (FIFO).
    pub fn shutdown(&mut self) {
        let alive = self.size();
        if alive == 0 {
            return;
        }

        info!(workers = alive, "shutting down worker pool");
        for _ in 0..alive {
            self.queue.push(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
