//! Command-line flags layered over the loaded settings.

use books_kernel::settings::{LogFormat, Settings, StorageBackend};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Book catalog HTTP service.
///
/// Flags override values from `config/*.toml` and `BOOKS_*` variables.
#[derive(Debug, Parser)]
#[command(name = "books-app", version, about)]
pub struct Cli {
    /// Store books in PostgreSQL instead of memory
    #[arg(long)]
    pub postgres: bool,

    /// Hostname or IP of the PostgreSQL server
    #[arg(long, value_name = "HOST")]
    pub pghost: Option<String>,

    /// Port of the PostgreSQL server
    #[arg(long, value_name = "PORT")]
    pub pgport: Option<u16>,

    /// PostgreSQL user
    #[arg(long, value_name = "USER")]
    pub pguser: Option<String>,

    /// PostgreSQL password
    #[arg(long, value_name = "PASSWORD", env = "BOOKS_PGPASS", hide_env_values = true)]
    pub pgpass: Option<String>,

    /// PostgreSQL database name
    #[arg(long, value_name = "NAME")]
    pub pgdatabase: Option<String>,

    /// Address the HTTP server binds to
    #[arg(long)]
    pub host: Option<String>,

    /// Port the HTTP server listens on
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
}

impl Cli {
    /// Overlay explicitly given flags onto `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if self.postgres {
            settings.storage.backend = StorageBackend::Postgres;
        }

        let db = &mut settings.database;
        if let Some(host) = &self.pghost {
            db.host = host.clone();
        }
        if let Some(port) = self.pgport {
            db.port = port;
        }
        if let Some(user) = &self.pguser {
            db.user = user.clone();
        }
        if let Some(password) = &self.pgpass {
            db.password = password.clone();
        }
        if let Some(name) = &self.pgdatabase {
            db.name = name.clone();
        }

        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(format) = self.log_format {
            settings.telemetry.log_format = format.into();
        }
    }
}
