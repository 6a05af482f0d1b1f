//! # Módulo HTTP
//!
//! Subconjunto de HTTP/1.1 que habla el servidor de archivos:
//!
//! - Parsing de la cabecera del request (request line + headers)
//! - Estado por conexión y transferencia del body acotada por Content-Length
//! - Construcción de respuestas con un conjunto cerrado de códigos
//!
//! Sin keep-alive ni chunked transfer encoding: un request por conexión.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /archivo.txt HTTP/1.1\r\n
//! Request-Id: 1\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <contenido>
//! ```

pub mod connection; // Estado por conexión y transferencia del body
pub mod request; // Parsing de la cabecera
pub mod response; // Construcción de respuestas
pub mod status; // Códigos de estado

pub use connection::{BodyError, ConnState, Connection, Linger};
pub use request::{Method, ParseError, PartialHead, RequestHead, Version};
pub use response::Response;
pub use status::StatusCode;
