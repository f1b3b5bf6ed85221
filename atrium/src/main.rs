//! Atrium - a static file server
//!
//! This is the main entry point for the Atrium CLI.

use anyhow::Context;
use atrium_core::config::{ConfigLoader, ServerConfig};
use atrium_core::handler::Chain;
use atrium_core::server::Server;
use atrium_middleware::{BasicAuth, Credentials, StripPrefix};
use atrium_static::{FileServer, FileServerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Atrium - static file server with encoding negotiation and basic auth
#[derive(Parser)]
#[command(name = "atrium")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, "127.0.0.1:8080" by default
    #[arg(long)]
    listen: Option<String>,

    /// Root directory to serve, "." by default
    #[arg(long)]
    root: Option<PathBuf>,

    /// Index file looked up in directories, "index.html" by default
    #[arg(long)]
    index: Option<String>,

    /// Enable auto-generated directory listings
    #[arg(long)]
    auto_index: bool,

    /// Serve dotfiles instead of hiding them
    #[arg(long)]
    no_hide_dotfiles: bool,

    /// Disable response compression
    #[arg(long)]
    no_compress: bool,

    /// Inline credentials (user:bcrypt-hash); enables basic auth and
    /// takes precedence over --auth-file
    #[arg(long)]
    auth: Option<String>,

    /// htpasswd-style credential file (user:bcrypt-hash lines); enables basic auth
    #[arg(long)]
    auth_file: Option<PathBuf>,

    /// Basic auth realm
    #[arg(long)]
    realm: Option<String>,

    /// Literal path prefix stripped from every request
    #[arg(long)]
    strip_prefix: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Merge the config file (if any) with the flag overrides
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(index) = self.index {
            config.index = index;
        }
        if let Some(realm) = self.realm {
            config.realm = realm;
        }
        if self.auth.is_some() {
            config.auth = self.auth;
        }
        if self.auth_file.is_some() {
            config.auth_file = self.auth_file;
        }
        if self.strip_prefix.is_some() {
            config.strip_prefix = self.strip_prefix;
        }
        if self.auto_index {
            config.auto_index = true;
        }
        if self.no_hide_dotfiles {
            config.hide_dotfiles = false;
        }
        if self.no_compress {
            config.compress = false;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = cli.into_config()?;

    tracing::info!("🚀 Starting Atrium v{}", atrium_core::VERSION);
    tracing::info!(
        "📄 Serving {} (auto-index: {}, compression: {})",
        config.root.display(),
        config.auto_index,
        config.compress
    );

    let mut chain = Chain::new();

    // Bad credentials are fatal before the listener ever binds. Inline
    // credentials win over a credential file when both are given.
    let credentials = if let Some(auth) = &config.auth {
        Some(Credentials::parse(auth).context("parsing inline credentials")?)
    } else if let Some(auth_file) = &config.auth_file {
        Some(
            Credentials::load(auth_file)
                .with_context(|| format!("loading credentials from {}", auth_file.display()))?,
        )
    } else {
        None
    };

    if let Some(credentials) = credentials {
        chain = chain.then(BasicAuth::new(credentials, config.realm.clone()));
        tracing::info!("🔐 Basic auth enabled (realm: {})", config.realm);
    }

    if let Some(prefix) = &config.strip_prefix {
        chain = chain.then(StripPrefix::new(prefix.clone()));
    }

    let file_server = FileServer::new(FileServerConfig {
        root: config.root.clone(),
        index: config.index.clone(),
        auto_index: config.auto_index,
        hide_dotfiles: config.hide_dotfiles,
        compress: config.compress,
    });

    let handler = chain.build(Arc::new(file_server));

    let addr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.listen))?;

    Server::new(addr, handler).run().await?;
    Ok(())
}
