//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI. El entorno no configura nada.
//!
//! ## Ejemplos de uso
//!
//! ```bash
//! ./file_server 8080
//! ./file_server 8080 -t 8 --queue-capacity 32 --dir ./data --log-level debug
//! ```

use clap::{Parser, ValueEnum};
use std::path::Path;

/// Nivel mínimo de los logs de diagnóstico
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor de archivos HTTP/1.1 concurrente (GET/PUT)")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Número de threads worker
    #[arg(short = 't', long = "threads", default_value = "4")]
    pub threads: usize,

    /// Capacidad de la cola de conexiones (por defecto, igual a --threads)
    #[arg(long = "queue-capacity")]
    pub queue_capacity: Option<usize>,

    /// Directorio desde donde se sirven y guardan los archivos
    #[arg(long = "dir", default_value = ".")]
    pub data_dir: String,

    /// Nivel de log
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Config {
    /// Parsea los argumentos de la línea de comandos
    ///
    /// Termina el proceso con código distinto de 0 si son inválidos.
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacidad efectiva de la cola
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.threads)
    }

    /// Valida la configuración
    ///
    /// El rango del puerto ya lo impone clap; con `port = 0` (solo posible
    /// desde código) el sistema elige un puerto libre.
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("Worker threads must be >= 1".to_string());
        }

        if self.queue_capacity() == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }

        if !Path::new(&self.data_dir).is_dir() {
            return Err(format!("Data dir is not a directory: {}", self.data_dir));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              HTTP/1.1 File Server Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Data dir:     {}", self.data_dir);
        println!();
        println!("👷 Workers & Queue:");
        println!("   Threads:      {}", self.threads);
        println!("   Queue cap:    {}", self.queue_capacity());
        println!();
        println!("📝 Log level:    {:?}", self.log_level);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            threads: 4,
            queue_capacity: None,
            data_dir: ".".to_string(),
            log_level: LogLevel::Info,
        }
    }
}
