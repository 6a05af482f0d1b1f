//! # Locks Advisory sobre Archivos
//! src/resources/lock.rs
//!
//! Guard RAII alrededor del lock advisory del archivo (`flock(2)` en Unix).
//! GET toma el lock compartido y PUT el exclusivo, así dos requests al mismo
//! path nunca intercalan bytes. El lock vive lo que vive el guard; al
//! soltarlo se libera, y el kernel también lo libera al cerrar el descriptor.

use std::fs::File;
use std::io;

/// Tipo de lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Varios lectores a la vez (GET)
    Shared,

    /// Un único escritor (PUT)
    Exclusive,
}

/// Lock tomado sobre un archivo abierto
///
/// Bloquea el thread hasta obtener el lock si otro request lo tiene.
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
    mode: LockMode,
}

impl<'a> FileLock<'a> {
    /// Toma el lock, reintentando si la espera es interrumpida por una señal
    pub fn acquire(file: &'a File, mode: LockMode) -> io::Result<Self> {
        loop {
            let result = match mode {
                LockMode::Shared => file.lock_shared(),
                LockMode::Exclusive => file.lock(),
            };

            match result {
                Ok(()) => return Ok(Self { file, mode }),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Archivo protegido por este lock
    pub fn file(&self) -> &'a File {
        self.file
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        // Si falla, el close del descriptor lo libera igual
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::scratch_dir;
    use std::fs::OpenOptions;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_shared_locks_coexist() {
        let path = scratch_dir("lock-shared").join("f");
        std::fs::write(&path, b"x").unwrap();

        let a = File::open(&path).unwrap();
        let b = File::open(&path).unwrap();

        let la = FileLock::acquire(&a, LockMode::Shared).unwrap();
        assert_eq!(la.mode(), LockMode::Shared);
        assert!(b.try_lock_shared().is_ok());
    }

    #[test]
    fn test_exclusive_excludes_shared() {
        let path = scratch_dir("lock-excl").join("f");
        std::fs::write(&path, b"x").unwrap();

        let writer = OpenOptions::new().write(true).open(&path).unwrap();
        let reader = File::open(&path).unwrap();

        let guard = FileLock::acquire(&writer, LockMode::Exclusive).unwrap();
        assert_eq!(guard.mode(), LockMode::Exclusive);
        assert!(reader.try_lock_shared().is_err());

        drop(guard);
        assert!(reader.try_lock_shared().is_ok());
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let path = scratch_dir("lock-block").join("f");
        std::fs::write(&path, b"x").unwrap();

        let holder = File::open(&path).unwrap();
        let guard = FileLock::acquire(&holder, LockMode::Exclusive).unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter_path = path.clone();
        let waiter = thread::spawn(move || {
            let file = File::open(&waiter_path).unwrap();
            let _lock = FileLock::acquire(&file, LockMode::Shared).unwrap();
            tx.send(()).unwrap();
        });

        // Mientras el exclusivo siga tomado, el lector no avanza
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }
}
