//! # Estado por Conexión
//! src/http/connection.rs
//!
//! `Connection` envuelve el stream de un cliente durante un único request:
//! acumula los bytes de la cabecera, la parsea y después transfiere el body
//! o la respuesta.
//!
//! ## Máquina de estados
//!
//! ```text
//! AwaitingHeadEnd ──► ReadyToRespond                                (GET / otros)
//!                 └──► HeadComplete ──► AwaitingBody ──► BodyComplete (PUT)
//!
//! cualquier estado ──► Error(code)
//! ```
//!
//! ## Contabilidad del body
//!
//! Un `read` del socket puede traer, además de la cabecera, los primeros
//! bytes del body. Esos bytes quedan en `buffer` después de `head_len` y
//! [`Connection::body_boundary`] dice cuántos son. [`Connection::receive_body`]
//! los escribe primero y luego lee del socket exactamente lo que falta para
//! completar el Content-Length declarado.
//!
//! ## Cierre
//!
//! [`Connection::close`] cierra la mitad de escritura y, si el cliente dejó
//! bytes del request sin leer (un body que no se aceptó, una cabecera
//! demasiado grande), los descarta antes de soltar el socket. Cerrar con
//! datos pendientes en el buffer de recepción hace que el kernel mande un
//! RST y el cliente pierda la respuesta.

use super::request::{Method, ParseError, PartialHead, RequestHead};
use super::{Response, StatusCode};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;
use thiserror::Error;

/// Tamaño máximo de la cabecera (request line + headers + `\r\n\r\n`)
pub const MAX_HEAD_SIZE: usize = 2048;

/// Tamaño de los bloques de lectura/escritura
const CHUNK_SIZE: usize = 4096;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Máximo de bytes que se descartan al cerrar
pub const DRAIN_LIMIT: u64 = 16 * 1024 * 1024;

/// Espera máxima de cada lectura mientras se descarta
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Streams que admiten un cierre ordenado
pub trait Linger {
    /// Cierra la mitad de escritura (el peer recibe EOF)
    fn shutdown_write(&mut self) -> io::Result<()>;

    /// Límite de espera de cada lectura mientras se descarta
    fn set_drain_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl Linger for TcpStream {
    fn shutdown_write(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Write)
    }

    fn set_drain_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))
    }
}

impl<T: Linger + ?Sized> Linger for &mut T {
    fn shutdown_write(&mut self) -> io::Result<()> {
        (**self).shutdown_write()
    }

    fn set_drain_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        (**self).set_drain_timeout(timeout)
    }
}

/// Estado del request dentro de la conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Esperando la línea vacía que cierra la cabecera
    AwaitingHeadEnd,

    /// Cabecera de un PUT parseada; el body todavía no se tocó
    HeadComplete,

    /// No hay body que leer; solo falta responder
    ReadyToRespond,

    /// Transfiriendo el body de un PUT
    AwaitingBody,

    /// Body recibido completo
    BodyComplete,

    /// El peer cerró sin mandar nada
    Closed,

    /// Estado terminal: no se lee más, solo se responde `code`
    Error(StatusCode),
}

/// Fallas al transferir el body de un PUT
#[derive(Debug, Error)]
pub enum BodyError {
    /// El cliente cerró antes de mandar todo el Content-Length
    #[error("body truncated: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    /// Falló la lectura del socket
    #[error("socket read failed: {0}")]
    Stream(#[source] io::Error),

    /// Falló la escritura en el destino (el archivo)
    #[error("sink write failed: {0}")]
    Sink(#[source] io::Error),
}

/// Conexión de un cliente durante un request
pub struct Connection<S> {
    stream: S,

    /// Bytes recibidos hasta ahora (cabecera + posible inicio del body)
    buffer: Vec<u8>,

    /// Largo de la cabecera incluyendo `\r\n\r\n`; 0 mientras no se encuentre
    head_len: usize,

    /// El cliente puede haber mandado bytes del request que nadie leyó
    unread_request: bool,

    state: ConnState,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(MAX_HEAD_SIZE),
            head_len: 0,
            unread_request: false,
            state: ConnState::AwaitingHeadEnd,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Lee del socket hasta completar la cabecera y la parsea
    ///
    /// Tolera lecturas parciales. Nunca acumula más de [`MAX_HEAD_SIZE`] bytes.
    /// Ante cualquier error la conexión queda en `Error(code)` (o `Closed`) y
    /// no se vuelve a leer.
    pub fn read_request_head(&mut self) -> Result<RequestHead, ParseError> {
        if self.state != ConnState::AwaitingHeadEnd {
            return Err(ParseError::Io(format!(
                "request head already consumed (state {:?})",
                self.state
            )));
        }

        let end = match self.fill_head() {
            Ok(end) => end,
            Err(e) => return Err(self.fail(e)),
        };
        self.head_len = end + HEAD_TERMINATOR.len();

        let head = match RequestHead::parse(&self.buffer[..end]) {
            Ok(head) => head,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = match head.method() {
            Method::Put => ConnState::HeadComplete,
            _ => ConnState::ReadyToRespond,
        };
        self.unread_request = self.body_boundary() > 0 || head.content_length().unwrap_or(0) > 0;

        Ok(head)
    }

    /// Acumula bytes hasta ver `\r\n\r\n`; retorna la posición donde empieza
    fn fill_head(&mut self) -> Result<usize, ParseError> {
        let mut chunk = [0u8; MAX_HEAD_SIZE];
        let mut searched = 0;

        loop {
            if let Some(pos) = find_terminator(&self.buffer, searched) {
                return Ok(pos);
            }
            // El terminador puede quedar partido entre dos lecturas
            searched = self.buffer.len().saturating_sub(HEAD_TERMINATOR.len() - 1);

            let room = MAX_HEAD_SIZE - self.buffer.len();
            if room == 0 {
                return Err(ParseError::HeadTooLarge(MAX_HEAD_SIZE));
            }

            match self.stream.read(&mut chunk[..room]) {
                Ok(0) if self.buffer.is_empty() => return Err(ParseError::ConnectionClosed),
                Ok(0) => return Err(ParseError::IncompleteHead),
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e.to_string())),
            }
        }
    }

    fn fail(&mut self, error: ParseError) -> ParseError {
        self.state = match error.status() {
            Some(code) => ConnState::Error(code),
            None => ConnState::Closed,
        };
        self.unread_request = matches!(
            error,
            ParseError::HeadTooLarge(_)
                | ParseError::InvalidRequestLine(_)
                | ParseError::InvalidVersion(_)
                | ParseError::UnsupportedVersion(_)
                | ParseError::InvalidHeader(_)
                | ParseError::InvalidContentLength(_)
                | ParseError::MissingContentLength
        );
        error
    }

    /// Método, URI y `Request-Id` de una cabecera que no se pudo parsear
    ///
    /// `None` si ni siquiera la request line era válida.
    pub fn partial_head(&self) -> Option<PartialHead> {
        let end = match self.head_len {
            0 => self.buffer.len(),
            len => len - HEAD_TERMINATOR.len(),
        };
        PartialHead::salvage(&self.buffer[..end])
    }

    /// Bytes del body que ya llegaron junto con la cabecera
    pub fn body_boundary(&self) -> usize {
        if self.head_len == 0 {
            return 0;
        }
        self.buffer.len() - self.head_len
    }

    /// Transfiere exactamente `declared` bytes del body hacia `sink`
    ///
    /// Primero escribe lo que ya está en el buffer (como mucho `declared`),
    /// después lee del socket el resto, sin pasarse.
    pub fn receive_body<W: Write>(&mut self, declared: u64, sink: &mut W) -> Result<u64, BodyError> {
        self.state = ConnState::AwaitingBody;

        let buffered = &self.buffer[self.head_len..];
        let take = buffered.len().min(usize::try_from(declared).unwrap_or(usize::MAX));
        let excess = buffered.len() > take;
        if let Err(e) = sink.write_all(&buffered[..take]) {
            self.state = ConnState::Error(StatusCode::InternalServerError);
            return Err(BodyError::Sink(e));
        }

        let mut received = take as u64;
        let mut chunk = [0u8; CHUNK_SIZE];

        while received < declared {
            let want = (declared - received).min(CHUNK_SIZE as u64) as usize;
            let n = match self.stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    self.state = ConnState::Error(StatusCode::BadRequest);
                    self.unread_request = false;
                    return Err(BodyError::Truncated {
                        expected: declared,
                        received,
                    });
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.state = ConnState::Error(StatusCode::InternalServerError);
                    self.unread_request = false;
                    return Err(BodyError::Stream(e));
                }
            };

            if let Err(e) = sink.write_all(&chunk[..n]) {
                self.state = ConnState::Error(StatusCode::InternalServerError);
                return Err(BodyError::Sink(e));
            }
            received += n as u64;
        }

        if let Err(e) = sink.flush() {
            self.state = ConnState::Error(StatusCode::InternalServerError);
            return Err(BodyError::Sink(e));
        }

        self.state = ConnState::BodyComplete;
        self.unread_request = excess;
        Ok(received)
    }

    /// Envía una respuesta con su body en memoria
    pub fn send(&mut self, response: &Response) -> io::Result<()> {
        self.stream.write_all(&response.to_bytes())?;
        self.stream.flush()
    }

    /// Envía la cabecera de `response` seguida de `content_length` bytes de `body`
    ///
    /// Si `body` se acaba antes, el resultado es `UnexpectedEof`: el cliente ya
    /// recibió un Content-Length que no se puede cumplir.
    pub fn send_streamed<R: Read>(&mut self, response: &Response, body: &mut R) -> io::Result<u64> {
        self.stream.write_all(&response.head_bytes())?;

        let expected = response.content_length();
        let sent = io::copy(&mut body.take(expected), &mut self.stream)?;
        self.stream.flush()?;

        if sent != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended after {} of {} bytes", sent, expected),
            ));
        }
        Ok(sent)
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Devuelve el stream; la conexión (y su buffer) se descarta
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write + Linger> Connection<S> {
    /// Cierra la conexión y descarta lo que el cliente todavía esté mandando
    ///
    /// Retorna cuántos bytes se descartaron (como mucho [`DRAIN_LIMIT`]).
    pub fn close(mut self) -> u64 {
        if self.stream.shutdown_write().is_err() || !self.unread_request {
            return 0;
        }
        if self.stream.set_drain_timeout(DRAIN_TIMEOUT).is_err() {
            return 0;
        }

        let mut chunk = [0u8; CHUNK_SIZE];
        let mut drained = 0u64;

        while drained < DRAIN_LIMIT {
            match self.stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => drained += n as u64,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }

        drained
    }
}

/// Busca `\r\n\r\n` a partir de `from`
fn find_terminator(buffer: &[u8], from: usize) -> Option<usize> {
    buffer[from..]
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| pos + from)
}
