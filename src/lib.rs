//! # File Server
//! src/lib.rs
//!
//! Servidor de archivos HTTP/1.1 concurrente: un request por conexión,
//! solo GET y PUT, con un pool fijo de workers alimentado por una cola
//! acotada y locks `flock` por archivo.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de la cabecera, máquina de estados de la conexión y respuestas
//! - `resources`: GET/PUT sobre el directorio raíz con locks compartidos/exclusivos
//! - `workers`: cola acotada y pool de threads
//! - `server`: loop de accept, despacho y auditoría
//! - `config`: argumentos de línea de comandos
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::Config;
//! use file_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el loop de accept");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod server;
pub mod workers;

pub use error::ServerError;

#[cfg(test)]
mod testutil;
