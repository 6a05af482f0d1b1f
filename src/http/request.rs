//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser de la cabecera (request head) de un request.
//!
//! ## Formato
//!
//! ```text
//! PUT /archivo.txt HTTP/1.1\r\n
//! Content-Length: 5\r\n
//! Request-Id: 7\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Gramática aceptada
//!
//! 1. **Request Line**: `METHOD /URI HTTP/X.Y`
//!    - `METHOD`: 1 a 8 letras
//!    - `URI`: 1 a 64 caracteres de `[A-Za-z0-9.-]` (se quita el `/` inicial)
//!    - `HTTP/X.Y`: un dígito por lado; cualquier versión distinta de 1.1 es 505
//! 2. **Headers**: `Key:Value`, key de `[A-Za-z0-9.-]{1,128}`, value ASCII imprimible `{1,128}`
//!
//! El body nunca pasa por aquí: lo transfiere [`Connection`](super::Connection).

use super::StatusCode;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Largo máximo del URI (sin el `/` inicial)
pub const MAX_URI_LEN: usize = 64;

/// Header del que se extrae el identificador para el audit log
pub const REQUEST_ID_HEADER: &str = "Request-Id";

fn request_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{1,8}) /([A-Za-z0-9.-]{1,64}) ([^ ]+)$")
            .expect("request line pattern is valid")
    })
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HTTP/([0-9])\.([0-9])$").expect("version pattern is valid"))
}

fn header_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9.-]{1,128}):([ -~]{1,128})$")
            .expect("header field pattern is valid")
    })
}

/// Métodos HTTP
///
/// Cualquier método sintácticamente válido que no sea GET o PUT se conserva
/// como `Other` y termina en 501.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Leer un archivo
    Get,

    /// PUT - Crear o reemplazar un archivo
    Put,

    /// Método aceptado por la gramática pero no soportado
    Other(String),
}

impl Method {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "PUT" => Method::Put,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versión HTTP `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// La única versión que el servidor atiende
    pub const HTTP_1_1: Version = Version { major: 1, minor: 1 };

    /// Parsea `HTTP/X.Y`
    ///
    /// Un token mal formado es `InvalidVersion` (400); uno bien formado pero
    /// distinto de 1.1 es `UnsupportedVersion` (505).
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let caps = version_regex()
            .captures(token)
            .ok_or_else(|| ParseError::InvalidVersion(token.to_string()))?;

        let digit = |i: usize| caps[i].as_bytes()[0] - b'0';
        let version = Version {
            major: digit(1),
            minor: digit(2),
        };

        if version != Version::HTTP_1_1 {
            return Err(ParseError::UnsupportedVersion(version));
        }

        Ok(version)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// Errores de protocolo al leer o parsear la cabecera
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El cliente cerró sin mandar un solo byte
    #[error("connection closed before any request bytes")]
    ConnectionClosed,

    /// EOF antes de la línea vacía que cierra la cabecera
    #[error("incomplete request head")]
    IncompleteHead,

    /// La cabecera no cabe en el buffer
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// Request line que no cumple la gramática
    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),

    /// Token de versión mal formado
    #[error("invalid HTTP version: {0:?}")]
    InvalidVersion(String),

    /// Versión bien formada pero distinta de HTTP/1.1
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(Version),

    /// Header field mal formado
    #[error("invalid header field: {0:?}")]
    InvalidHeader(String),

    /// Content-Length no numérico
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// PUT sin Content-Length
    #[error("missing Content-Length on PUT")]
    MissingContentLength,

    /// Falla del socket mientras se leía la cabecera
    #[error("I/O error while reading request head: {0}")]
    Io(String),
}

impl ParseError {
    /// Código de estado con el que se responde este error
    ///
    /// `None` significa que no hay a quién responder.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ParseError::ConnectionClosed => None,
            ParseError::UnsupportedVersion(_) => Some(StatusCode::VersionNotSupported),
            ParseError::Io(_) => Some(StatusCode::InternalServerError),
            _ => Some(StatusCode::BadRequest),
        }
    }
}

/// Primera línea del request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: String,
    pub version: Version,
}

/// Parsea la request line (sin el `\r\n`)
///
/// # Ejemplo
/// ```
/// use file_server::http::request::{parse_request_line, Method};
///
/// let line = parse_request_line("GET /index.html HTTP/1.1").unwrap();
/// assert_eq!(line.method, Method::Get);
/// assert_eq!(line.uri, "index.html");
/// ```
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let caps = request_line_regex()
        .captures(line)
        .ok_or_else(|| ParseError::InvalidRequestLine(line.to_string()))?;

    let version = Version::parse(&caps[3])?;

    Ok(RequestLine {
        method: Method::from_token(&caps[1]),
        uri: caps[2].to_string(),
        version,
    })
}

/// Header fields en el orden en que llegaron
///
/// Las keys conservan mayúsculas/minúsculas tal como se recibieron; ante
/// duplicados, la búsqueda devuelve la primera aparición.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Busca un header por key exacta
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Busca un header ignorando mayúsculas/minúsculas en la key
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Valor de `Content-Length`, si vino
    pub fn content_length(&self) -> Result<Option<u64>, ParseError> {
        match self.get_ignore_case("Content-Length") {
            None => Ok(None),
            Some(raw) if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) => {
                Err(ParseError::InvalidContentLength(raw.to_string()))
            }
            Some(raw) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ParseError::InvalidContentLength(raw.to_string())),
        }
    }
}

/// Parsea las líneas de header (sin la línea vacía final)
pub fn parse_headers<'a, I>(lines: I) -> Result<Headers, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut headers = Headers::default();

    for line in lines {
        let caps = header_field_regex()
            .captures(line)
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

        headers
            .fields
            .push((caps[1].to_string(), caps[2].trim().to_string()));
    }

    Ok(headers)
}

/// Lo que se pudo rescatar de una cabecera rechazada
///
/// Solo existe si la request line cumple la gramática; la versión puede ser
/// cualquiera y los headers mal formados se ignoran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialHead {
    pub method: Method,
    pub uri: String,
    pub request_id: Option<String>,
}

impl PartialHead {
    /// Rescata método, URI y `Request-Id` de bytes que no llegaron a parsearse
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::request::{Method, PartialHead};
    ///
    /// let partial = PartialHead::salvage(b"GET /ok HTTP/2.0\r\nRequest-Id: 7").unwrap();
    /// assert_eq!(partial.method, Method::Get);
    /// assert_eq!(partial.request_id(), "7");
    /// ```
    pub fn salvage(bytes: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(bytes);
        let mut lines = text.split("\r\n");
        let caps = request_line_regex().captures(lines.next()?)?;

        let request_id = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| header_field_regex().captures(line))
            .find(|field| &field[1] == REQUEST_ID_HEADER)
            .map(|field| field[2].trim().to_string());

        Some(Self {
            method: Method::from_token(&caps[1]),
            uri: caps[2].to_string(),
            request_id,
        })
    }

    /// Identificador para el audit log (`0` si no vino)
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("0")
    }
}

/// Cabecera completa de un request ya validada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    line: RequestLine,
    headers: Headers,
    content_length: Option<u64>,
}

impl RequestHead {
    /// Parsea la cabecera completa, sin el `\r\n\r\n` final
    ///
    /// La versión se valida antes que los headers: un request HTTP/1.0 con
    /// headers rotos es 505, no 400.
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::request::{Method, RequestHead};
    ///
    /// let head = RequestHead::parse(b"PUT /a.txt HTTP/1.1\r\nContent-Length: 5").unwrap();
    /// assert_eq!(head.method(), &Method::Put);
    /// assert_eq!(head.content_length(), Some(5));
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ParseError::InvalidRequestLine(String::from_utf8_lossy(bytes).into()))?;

        let mut lines = text.split("\r\n");
        let first = lines.next().unwrap_or_default();
        let line = parse_request_line(first)?;

        let headers = parse_headers(lines)?;
        let content_length = headers.content_length()?;

        if line.method == Method::Put && content_length.is_none() {
            return Err(ParseError::MissingContentLength);
        }

        Ok(Self {
            line,
            headers,
            content_length,
        })
    }

    pub fn method(&self) -> &Method {
        &self.line.method
    }

    /// URI sin el `/` inicial
    pub fn uri(&self) -> &str {
        &self.line.uri
    }

    pub fn version(&self) -> Version {
        self.line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Largo declarado del body
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Identificador del cliente para el audit log (`0` si no vino)
    pub fn request_id(&self) -> &str {
        self.headers.get(REQUEST_ID_HEADER).unwrap_or("0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let line = parse_request_line("GET /hello.txt HTTP/1.1").unwrap();

        assert_eq!(line.method, Method::Get);
        assert_eq!(line.uri, "hello.txt");
        assert_eq!(line.version, Version::HTTP_1_1);
    }

    #[test]
    fn test_parse_other_method() {
        let line = parse_request_line("DELETE /a HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::Other("DELETE".to_string()));
        assert_eq!(line.method.as_str(), "DELETE");
    }

    #[test]
    fn test_method_too_long() {
        let result = parse_request_line("ABCDEFGHI /a HTTP/1.1");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
    }

    #[test]
    fn test_uri_limits() {
        let max = "a".repeat(MAX_URI_LEN);
        assert!(parse_request_line(&format!("GET /{} HTTP/1.1", max)).is_ok());

        let too_long = "a".repeat(MAX_URI_LEN + 1);
        let result = parse_request_line(&format!("GET /{} HTTP/1.1", too_long));
        assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
    }

    #[test]
    fn test_uri_rejects_slashes_and_missing_slash() {
        assert!(parse_request_line("GET /dir/file HTTP/1.1").is_err());
        assert!(parse_request_line("GET file HTTP/1.1").is_err());
        assert!(parse_request_line("GET / HTTP/1.1").is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let result = parse_request_line("GET /ok HTTP/1.9");
        assert_eq!(
            result,
            Err(ParseError::UnsupportedVersion(Version { major: 1, minor: 9 }))
        );
        assert_eq!(
            result.unwrap_err().status(),
            Some(StatusCode::VersionNotSupported)
        );
    }

    #[test]
    fn test_malformed_version() {
        let result = parse_request_line("GET /ok HTTP/x.y");
        assert!(matches!(result, Err(ParseError::InvalidVersion(_))));
        assert_eq!(result.unwrap_err().status(), Some(StatusCode::BadRequest));

        assert!(matches!(
            parse_request_line("GET /ok HTTP/1.10"),
            Err(ParseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_extra_spaces_rejected() {
        assert!(parse_request_line("GET  /ok HTTP/1.1").is_err());
        assert!(parse_request_line("GET /ok HTTP/1.1 ").is_err());
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(["Host: localhost", "Content-Length: 12"]).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Host"), Some("localhost"));
        assert_eq!(headers.get("host"), None);
        assert_eq!(headers.content_length(), Ok(Some(12)));
    }

    #[test]
    fn test_duplicate_headers_keep_first() {
        let headers = parse_headers(["X-A: one", "X-A: two"]).unwrap();
        assert_eq!(headers.get("X-A"), Some("one"));
    }

    #[test]
    fn test_content_length_case_insensitive() {
        let headers = parse_headers(["content-length: 3"]).unwrap();
        assert_eq!(headers.content_length(), Ok(Some(3)));
    }

    #[test]
    fn test_invalid_header() {
        assert!(matches!(
            parse_headers(["no colon here"]),
            Err(ParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_headers(["Bad Key: value"]),
            Err(ParseError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_headers(["Key:"]),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_header_key_limit() {
        let key = "k".repeat(128);
        let headers = parse_headers([format!("{}: v", key).as_str()]).unwrap();
        assert_eq!(headers.get(&key), Some("v"));

        let too_long = format!("{}: v", "k".repeat(129));
        assert!(matches!(
            parse_headers([too_long.as_str()]),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_header_value_limit() {
        let value = "v".repeat(128);
        let headers = parse_headers([format!("K:{}", value).as_str()]).unwrap();
        assert_eq!(headers.get("K"), Some(value.as_str()));

        let too_long = format!("K:{}", "v".repeat(129));
        assert!(parse_headers([too_long.as_str()]).is_err());
    }

    #[test]
    fn test_header_value_limit_counts_leading_space() {
        // El espacio después de `:` es parte del valor antes del trim
        let fits = format!("K: {}", "v".repeat(127));
        let headers = parse_headers([fits.as_str()]).unwrap();
        assert_eq!(headers.get("K").map(str::len), Some(127));

        let over = format!("K: {}", "v".repeat(128));
        assert!(matches!(
            parse_headers([over.as_str()]),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_invalid_content_length() {
        let headers = parse_headers(["Content-Length: abc"]).unwrap();
        assert!(matches!(
            headers.content_length(),
            Err(ParseError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_content_length_digits_only() {
        for raw in ["Content-Length: +5", "Content-Length: -5", "Content-Length: 5 5", "Content-Length: 0x5"] {
            let headers = parse_headers([raw]).unwrap();
            assert!(
                matches!(headers.content_length(), Err(ParseError::InvalidContentLength(_))),
                "{:?}",
                raw
            );
        }

        let overflow = parse_headers(["Content-Length: 99999999999999999999999"]).unwrap();
        assert!(overflow.content_length().is_err());
    }

    #[test]
    fn test_salvage_rejected_head() {
        let partial = PartialHead::salvage(b"PUT /a.txt HTTP/1.0\r\nRequest-Id: 5\r\nbroken").unwrap();

        assert_eq!(partial.method, Method::Put);
        assert_eq!(partial.uri, "a.txt");
        assert_eq!(partial.request_id(), "5");
    }

    #[test]
    fn test_salvage_without_request_id() {
        let partial = PartialHead::salvage(b"PUT /a.txt HTTP/1.1").unwrap();
        assert_eq!(partial.request_id, None);
        assert_eq!(partial.request_id(), "0");
    }

    #[test]
    fn test_salvage_needs_valid_request_line() {
        assert_eq!(PartialHead::salvage(b"GET /a/b HTTP/1.1\r\nRequest-Id: 1"), None);
        assert_eq!(PartialHead::salvage(b"garbage"), None);
        assert_eq!(PartialHead::salvage(b""), None);
    }

    #[test]
    fn test_head_put_requires_content_length() {
        let result = RequestHead::parse(b"PUT /a.txt HTTP/1.1\r\nHost: x");
        assert_eq!(result, Err(ParseError::MissingContentLength));
        assert_eq!(
            ParseError::MissingContentLength.status(),
            Some(StatusCode::BadRequest)
        );
    }

    #[test]
    fn test_head_get_without_headers() {
        let head = RequestHead::parse(b"GET /a.txt HTTP/1.1").unwrap();

        assert_eq!(head.method(), &Method::Get);
        assert_eq!(head.uri(), "a.txt");
        assert_eq!(head.version(), Version::HTTP_1_1);
        assert!(head.headers().is_empty());
        assert_eq!(head.content_length(), None);
        assert_eq!(head.request_id(), "0");
    }

    #[test]
    fn test_head_request_id() {
        let head = RequestHead::parse(b"GET /a.txt HTTP/1.1\r\nRequest-Id: 42").unwrap();
        assert_eq!(head.request_id(), "42");
    }

    #[test]
    fn test_head_version_checked_before_headers() {
        let result = RequestHead::parse(b"GET /a HTTP/1.0\r\nbroken header");
        assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_head_invalid_utf8() {
        let result = RequestHead::parse(b"\xff\xfe GET /a HTTP/1.1");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
    }
}
