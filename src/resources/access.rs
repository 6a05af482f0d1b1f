//! # Acceso a Recursos
//! src/resources/access.rs
//!
//! GET y PUT sobre archivos del directorio raíz. Cada handler abre el
//! archivo, toma el lock que corresponde, transfiere los bytes y responde
//! por la conexión. El lock se suelta y el archivo se cierra al salir.
//!
//! ## Mapeo de errores de I/O
//!
//! | Clase            | GET | PUT |
//! |------------------|-----|-----|
//! | NotFound         | 404 | 403 |
//! | PermissionDenied | 403 | 403 |
//! | IsDirectory      | 403 | 403 |
//! | Other            | 500 | 500 |

use super::lock::{FileLock, LockMode};
use crate::http::{BodyError, Connection, Response, StatusCode};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Permisos de los archivos creados por PUT (solo el dueño)
const CREATE_MODE: u32 = 0o600;

/// Clase de un error de I/O del sistema de archivos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    /// El archivo (o un componente del path) no existe
    NotFound,

    /// Sin permisos, o sistema de archivos de solo lectura
    PermissionDenied,

    /// El path es un directorio
    IsDirectory,

    /// Cualquier otra falla
    Other,
}

/// Operación que se intentaba sobre el archivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl FileErrorKind {
    /// Clasifica un `io::Error` según su errno
    pub fn classify(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ENOTDIR) => FileErrorKind::NotFound,
            Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EROFS) => {
                FileErrorKind::PermissionDenied
            }
            Some(libc::EISDIR) => FileErrorKind::IsDirectory,
            Some(_) => FileErrorKind::Other,
            None => match err.kind() {
                io::ErrorKind::NotFound => FileErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => FileErrorKind::PermissionDenied,
                _ => FileErrorKind::Other,
            },
        }
    }

    /// Código de estado para esta clase de error en la operación dada
    pub fn status(self, access: Access) -> StatusCode {
        match (self, access) {
            (FileErrorKind::NotFound, Access::Read) => StatusCode::NotFound,
            (FileErrorKind::NotFound, Access::Write) => StatusCode::Forbidden,
            (FileErrorKind::PermissionDenied, _) => StatusCode::Forbidden,
            (FileErrorKind::IsDirectory, _) => StatusCode::Forbidden,
            (FileErrorKind::Other, _) => StatusCode::InternalServerError,
        }
    }
}

/// Status para un `io::Error` durante `access`
pub fn status_for(err: &io::Error, access: Access) -> StatusCode {
    FileErrorKind::classify(err).status(access)
}

/// El socket falló a mitad de la transferencia: no hay respuesta posible
#[derive(Debug, Error)]
#[error("stream failed while answering {status}: {source}")]
pub struct StreamError {
    /// Código que se estaba enviando (o que se habría enviado)
    pub status: StatusCode,
    #[source]
    pub source: io::Error,
}

/// Resultado de un handler: el código que recibió el cliente
pub type HandlerResult = Result<StatusCode, StreamError>;

/// Archivos servidos desde un directorio raíz
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path en disco del URI (ya validado, sin `/` inicial)
    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.root.join(uri)
    }

    /// Sirve el archivo completo con `Content-Length` igual a su tamaño
    pub fn handle_get<S: Read + Write>(&self, uri: &str, conn: &mut Connection<S>) -> HandlerResult {
        let path = self.resolve(uri);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for GET failed");
                return respond(conn, status_for(&e, Access::Read));
            }
        };

        let lock = match FileLock::acquire(&file, LockMode::Shared) {
            Ok(lock) => lock,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "shared lock failed");
                return respond(conn, StatusCode::InternalServerError);
            }
        };

        let metadata = match lock.file().metadata() {
            Ok(metadata) => metadata,
            Err(e) => return respond(conn, status_for(&e, Access::Read)),
        };

        if metadata.is_dir() {
            return respond(conn, StatusCode::Forbidden);
        }

        let mut reader = lock.file();
        conn.send_streamed(&Response::file(metadata.len()), &mut reader)
            .map(|_| StatusCode::Ok)
            .map_err(|source| StreamError {
                status: StatusCode::Ok,
                source,
            })
    }

    /// Crea o reemplaza el archivo con exactamente `declared` bytes del body
    ///
    /// 201 si el archivo no existía, 200 si se sobrescribió. El truncado
    /// ocurre con el lock exclusivo tomado, para que un GET concurrente nunca
    /// vea el archivo a medio reemplazar.
    pub fn handle_put<S: Read + Write>(
        &self,
        uri: &str,
        declared: u64,
        conn: &mut Connection<S>,
    ) -> HandlerResult {
        let path = self.resolve(uri);
        let existed = fs::metadata(&path).is_ok();

        let file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .mode(CREATE_MODE)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for PUT failed");
                return respond(conn, status_for(&e, Access::Write));
            }
        };

        let lock = match FileLock::acquire(&file, LockMode::Exclusive) {
            Ok(lock) => lock,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "exclusive lock failed");
                return respond(conn, StatusCode::InternalServerError);
            }
        };

        if let Err(e) = lock.file().set_len(0) {
            return respond(conn, status_for(&e, Access::Write));
        }

        let mut writer = lock.file();
        match conn.receive_body(declared, &mut writer) {
            Ok(_) => {}
            Err(BodyError::Truncated { expected, received }) => {
                debug!(path = %path.display(), expected, received, "PUT body truncated");
                return respond(conn, StatusCode::BadRequest);
            }
            Err(BodyError::Sink(e)) => {
                warn!(path = %path.display(), error = %e, "writing PUT body failed");
                return respond(conn, status_for(&e, Access::Write));
            }
            Err(BodyError::Stream(source)) => {
                return Err(StreamError {
                    status: StatusCode::InternalServerError,
                    source,
                });
            }
        }
        drop(lock);

        let status = if existed {
            StatusCode::Ok
        } else {
            StatusCode::Created
        };
        respond(conn, status)
    }
}

/// Envía la respuesta de estado `status`
pub fn respond<S: Read + Write>(conn: &mut Connection<S>, status: StatusCode) -> HandlerResult {
    conn.send(&Response::new(status))
        .map(|_| status)
        .map_err(|source| StreamError { status, source })
}
