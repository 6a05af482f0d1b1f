//! Utilidades compartidas por los tests unitarios

use crate::http::Linger;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Stream en memoria: lee de `input` y acumula lo escrito en `output`
///
/// Con `chunk` se limita cuántos bytes devuelve cada `read`, para simular
/// lecturas parciales del socket.
pub struct MockStream {
    input: io::Cursor<Vec<u8>>,
    pub output: Vec<u8>,
    chunk: usize,
    pub reads: usize,
    pub write_closed: bool,
}

impl MockStream {
    pub fn new(input: &[u8]) -> Self {
        Self::chunked(input, usize::MAX)
    }

    pub fn chunked(input: &[u8], chunk: usize) -> Self {
        Self {
            input: io::Cursor::new(input.to_vec()),
            output: Vec::new(),
            chunk,
            reads: 0,
            write_closed: false,
        }
    }

    /// Bytes de entrada que nadie leyó
    pub fn unread(&self) -> usize {
        self.input.get_ref().len() - self.input.position() as usize
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let limit = buf.len().min(self.chunk);
        self.input.read(&mut buf[..limit])
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Linger for MockStream {
    fn shutdown_write(&mut self) -> io::Result<()> {
        self.write_closed = true;
        Ok(())
    }

    fn set_drain_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}

/// Stream cuya lectura siempre falla
pub struct BrokenStream;

impl Read for BrokenStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
    }
}

impl Write for BrokenStream {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Directorio temporal único por test (se recrea vacío)
pub fn scratch_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);

    let dir = std::env::temp_dir().join(format!(
        "file_server-unit-{}-{}-{}",
        std::process::id(),
        name,
        n
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
