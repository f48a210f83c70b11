use clap::Parser;

use crate::config::{AppConfig, StoreBackend};

#[derive(Parser, Debug)]
#[command(name = "contacts-api")]
#[command(about = "Contacts REST API server")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Interface to bind (overrides CONTACTS_API_HOST)")]
    pub host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides CONTACTS_API_PORT / PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep data in process memory instead of Postgres")]
    pub memory: bool,
}

impl Cli {
    /// Command-line flags win over environment configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.memory {
            config.database.backend = StoreBackend::Memory;
        }
    }
}
