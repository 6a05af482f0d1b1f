//! # Cola Acotada
//! src/workers/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija entre el loop de accept
//! (productor) y los workers (consumidores). Un `Mutex` protege el buffer
//! circular y dos `Condvar` señalan "hay lugar" y "hay items".
//!
//! - `push` bloquea mientras la cola está llena
//! - `pop` bloquea mientras la cola está vacía

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Cola FIFO bloqueante de capacidad fija
///
/// Se comparte entre threads con `Arc<BoundedQueue<T>>`.
pub struct BoundedQueue<T> {
    /// Buffer circular; reservado una sola vez con `capacity` lugares
    items: Mutex<VecDeque<T>>,

    /// Notifica a los productores que se liberó un lugar
    not_full: Condvar,

    /// Notifica a los consumidores que llegó un item
    not_empty: Condvar,

    /// Capacidad máxima de la cola
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola con capacidad fija
    ///
    /// # Panics
    ///
    /// Si `capacity` es 0: una cola sin lugar bloquearía para siempre.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");

        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola `item` al final
    ///
    /// Bloquea hasta que haya lugar y despierta a un consumidor.
    pub fn push(&self, item: T) {
        let mut items = self
            .not_full
            .wait_while(self.lock(), |items| items.len() >= self.capacity)
            .unwrap_or_else(PoisonError::into_inner);

        items.push_back(item);
        drop(items);

        self.not_empty.notify_one();
    }

    /// Desencola el item más antiguo
    ///
    /// Bloquea hasta que haya un item y despierta a un productor.
    pub fn pop(&self) -> T {
        let mut items = self
            .not_empty
            .wait_while(self.lock(), |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        let item = items
            .pop_front()
            .expect("wait_while guarantees a non-empty queue");
        drop(items);

        self.not_full.notify_one();
        item
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        let item = self.lock().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifica si la cola está llena
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.pop(), 2);
        assert_eq!(queue.pop(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wraps_around() {
        let queue = BoundedQueue::new(2);
        for round in 0..10 {
            queue.push(round * 2);
            queue.push(round * 2 + 1);
            assert!(queue.is_full());
            assert_eq!(queue.pop(), round * 2);
            assert_eq!(queue.pop(), round * 2 + 1);
        }
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    #[should_panic(expected = "queue capacity")]
    fn test_zero_capacity_panics() {
        let _queue: BoundedQueue<u8> = BoundedQueue::new(0);
    }

    #[test]
    fn test_push_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(0);

        let (tx, rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.push(1);
                tx.send(()).unwrap();
            })
        };

        // La cola está llena: el productor no puede avanzar
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(), 0);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        producer.join().unwrap();

        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_pop_blocks_when_empty() {
        let queue = Arc::new(BoundedQueue::new(2));

        let (tx, rx) = mpsc::channel();
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                tx.send(queue.pop()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        queue.push(42);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
        consumer.join().unwrap();
    }

    #[test]
    fn test_exactly_once_with_many_consumers() {
        const ITEMS: usize = 2_000;
        const CONSUMERS: usize = 4;

        let queue = Arc::new(BoundedQueue::new(3));

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    loop {
                        match queue.pop() {
                            None => break,
                            Some(item) => seen.push(item),
                        }
                    }
                    seen
                })
            })
            .collect();

        for i in 0..ITEMS {
            queue.push(Some(i));
            assert!(queue.len() <= queue.capacity());
        }
        for _ in 0..CONSUMERS {
            queue.push(None);
        }

        let mut all = HashSet::new();
        let mut total = 0;
        for consumer in consumers {
            let seen = consumer.join().unwrap();
            // Cada consumidor ve los items en el orden en que se encolaron
            assert!(seen.windows(2).all(|w| w[0] < w[1]));
            total += seen.len();
            all.extend(seen);
        }

        assert_eq!(total, ITEMS);
        assert_eq!(all.len(), ITEMS);
    }
}
