use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use navweb_core::NavConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Graph document loaded at startup and by `/admin/reload`.
    pub graph_path: Option<PathBuf>,
    /// Optional shortcut table merged into the obstacle catalog.
    pub shortcuts_path: Option<PathBuf>,
    pub nav: NavConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("NAVWEB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("NAVWEB_PORT") {
            Ok(s) => s.trim().parse::<u16>().with_context(|| format!("NAVWEB_PORT={s} is not a valid port"))?,
            Err(_) => 8080,
        };
        Ok(Self {
            host,
            port,
            graph_path: path_var("NAVWEB_GRAPH"),
            shortcuts_path: path_var("NAVWEB_SHORTCUTS"),
            nav: NavConfig::from_env(),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from)
}
