//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Toda respuesta tiene exactamente esta forma:
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! Content-Length: 10\r\n
//! \r\n
//! Not Found\n
//! ```
//!
//! Las respuestas de estado llevan como body su reason phrase seguida de `\n`.
//! La única excepción es el `200 OK` de un GET: su body es el archivo, que se
//! transmite por streaming desde el disco y no se guarda en la respuesta.

use super::request::Version;
use super::StatusCode;

/// Respuesta HTTP inmutable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Código de estado
    status: StatusCode,

    /// Valor del header `Content-Length`
    content_length: u64,

    /// Body en memoria; vacío cuando el body se transmite aparte
    body: Vec<u8>,
}

impl Response {
    /// Respuesta de estado con su reason phrase como body
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Created);
    /// assert_eq!(response.body(), b"Created\n");
    /// assert_eq!(response.content_length(), 8);
    /// ```
    pub fn new(status: StatusCode) -> Self {
        let body = format!("{}\n", status.reason_phrase()).into_bytes();
        Self::with_body_bytes(status, body)
    }

    /// Respuesta con un body arbitrario en memoria
    pub fn with_body_bytes(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            content_length: body.len() as u64,
            body,
        }
    }

    /// Cabecera de un `200 OK` cuyo body (el archivo) se envía por streaming
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::Response;
    ///
    /// let response = Response::file(1024);
    /// assert!(response.is_streamed());
    /// assert!(response.to_bytes().ends_with(b"Content-Length: 1024\r\n\r\n"));
    /// ```
    pub fn file(size: u64) -> Self {
        Self {
            status: StatusCode::Ok,
            content_length: size,
            body: Vec::new(),
        }
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        format!(
            "{} {}\r\nContent-Length: {}\r\n\r\n",
            Version::HTTP_1_1,
            self.status,
            self.content_length
        )
        .into_bytes()
    }

    /// Respuesta completa lista para el socket
    ///
    /// Para respuestas con streaming solo incluye la cabecera.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// `true` si el body no viaja dentro de la respuesta
    pub fn is_streamed(&self) -> bool {
        self.body.len() as u64 != self.content_length
    }
}

impl From<StatusCode> for Response {
    fn from(status: StatusCode) -> Self {
        Response::new(status)
    }
}
