//! CLI argument parsing, validation, and startup helpers.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use url::Url;

use crate::ServerConfig;
use crate::selector::{FullScanSelector, Selector, SettingsProbeSelector};
use crate::store::{RtdbClient, TreeStore};
use crate::token::{OauthTokenProvider, ServiceAccount};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// How flagged dashboards are discovered.
#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum SelectStrategy {
    /// One deep read of the dashboards collection
    #[default]
    Scan,
    /// Shallow id listing, then one settings probe per dashboard
    Probe,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gridsweep",
    about = "Clears the data grid logs of dashboards that opted in"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "PORT")]
    pub port: u16,

    /// Realtime Database base URL (e.g. "https://my-project.firebaseio.com")
    #[arg(short, long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Path to a service account key file. Prefer the SERVICE_ACCOUNT_JSON env var
    #[arg(long)]
    pub credentials_file: Option<String>,

    /// Path of the dashboards collection
    #[arg(long, default_value = "dashboards", value_parser = validate_root_path)]
    pub root: String,

    /// Keys deleted per bulk write
    #[arg(long, default_value = "5000")]
    pub batch_size: NonZeroUsize,

    /// Dashboard discovery strategy
    #[arg(long, value_enum, default_value_t = SelectStrategy::Scan)]
    pub strategy: SelectStrategy,

    /// Also run a sweep every N hours (0 leaves sweeps HTTP-triggered only)
    #[arg(long, default_value = "0")]
    pub sweep_every_hours: u64,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_root_path(s: &str) -> Result<String, String> {
    crate::store::validate_path(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the service account key from the environment or a file.
/// Returns None and logs an error if it cannot be loaded.
pub fn load_service_account(credentials_file: Option<&str>) -> Option<ServiceAccount> {
    let raw = if let Ok(raw) = std::env::var("SERVICE_ACCOUNT_JSON") {
        // Clear the environment variable to prevent leaking the key.
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("SERVICE_ACCOUNT_JSON") };
        raw
    } else if let Some(path) = credentials_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read service account file");
                return None;
            }
        }
    } else {
        error!(
            "Service account is required. Set SERVICE_ACCOUNT_JSON (recommended) or use --credentials-file"
        );
        return None;
    };

    match ServiceAccount::from_json(&raw) {
        Ok(account) => Some(account),
        Err(e) => {
            error!(error = %e, "Invalid service account key");
            None
        }
    }
}

/// Parse and validate the database URL.
/// Returns None and logs an error if validation fails.
pub fn validate_database_url(database_url: &str) -> Option<Url> {
    let url = match Url::parse(database_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %database_url, error = %e, "Invalid database URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));

    if !is_https && !is_localhost {
        error!("Database URL must use HTTPS outside local emulators");
        return None;
    }

    Some(url)
}

/// Build the authenticated store client, logging errors if it fails.
pub fn connect_store(base: Url, account: ServiceAccount) -> Option<Arc<RtdbClient>> {
    let email = account.client_email.clone();
    match OauthTokenProvider::new(account) {
        Ok(tokens) => {
            info!(account = %email, "Store credentials ready");
            Some(Arc::new(RtdbClient::new(base, Arc::new(tokens))))
        }
        Err(e) => {
            error!(account = %email, error = %e, "Failed to prepare store credentials");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, store: Arc<dyn TreeStore>) -> ServerConfig {
    let selector: Arc<dyn Selector> = match args.strategy {
        SelectStrategy::Scan => Arc::new(FullScanSelector::new(&args.root)),
        SelectStrategy::Probe => Arc::new(SettingsProbeSelector::new(&args.root)),
    };

    let sweep_every = match args.sweep_every_hours {
        0 => None,
        hours => Some(Duration::from_secs(hours * 60 * 60)),
    };

    ServerConfig {
        store,
        selector,
        root: args.root.clone(),
        batch_size: args.batch_size,
        sweep_every,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_database_url() {
        assert!(validate_database_url("https://demo.firebaseio.com").is_some());
        assert!(validate_database_url("http://localhost:9000").is_some());
        assert!(validate_database_url("http://demo.firebaseio.com").is_none());
        assert!(validate_database_url("not a url").is_none());
    }

    #[test]
    fn test_root_path_value_parser() {
        assert!(validate_root_path("dashboards").is_ok());
        assert!(validate_root_path("/dashboards").is_err());
        assert!(validate_root_path("").is_err());
    }
}
