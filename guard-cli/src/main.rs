// ABOUTME: Command-line front end that fetches a URL only after the user approves
// ABOUTME: the request on their own device. Configuration comes from CIBA_* variables.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ciba_guard::prelude::*;

/// Fetch a protected URL after backchannel approval.
#[derive(Parser, Debug)]
#[command(name = "guard-cli", version, about)]
struct Cli {
    /// Subject identifier of the user who must approve.
    #[arg(long)]
    user: String,

    /// Message shown to the user on their approval device.
    #[arg(long)]
    message: String,

    /// Scope to request; may be repeated.
    #[arg(long = "scope")]
    scopes: Vec<String>,

    /// How to react to `slow_down` replies.
    #[arg(long, value_enum, default_value_t = SlowDown::Increment)]
    slow_down: SlowDown,

    /// Persist the request here and exit instead of waiting for approval.
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `ciba_guard=debug`.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// URL to fetch with the approved credential.
    url: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SlowDown {
    Increment,
    Double,
}

impl From<SlowDown> for SlowDownPolicy {
    fn from(value: SlowDown) -> Self {
        match value {
            SlowDown::Increment => SlowDownPolicy::default(),
            SlowDown::Double => SlowDownPolicy::Double,
        }
    }
}

/// Accept a missing `.env`; anything else wrong with it is an error.
fn env_file_loaded(result: Result<PathBuf, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("loading .env"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_file_loaded(dotenvy::dotenv())?;
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = AuthorizationConfig::from_env().context("loading CIBA_* configuration")?;

    let mut builder = ProtectionParams::builder(&cli.user, &cli.message)
        .scopes(cli.scopes.iter().cloned())
        .slow_down(cli.slow_down.into())
        .on_rejection(|rejection: Rejection| async move { format!("Not authorized: {}", rejection) });
    if let Some(dir) = &cli.store_dir {
        let store = FileStore::open(dir.clone())
            .await
            .with_context(|| format!("opening store at {}", dir.display()))?;
        builder = builder.mode(Mode::Interrupt).store(Arc::new(store));
    }
    let params = builder.build()?;

    let authorizer = BackchannelAuthorizer::new(config, params)?;
    let http = reqwest::Client::new();

    let fetch = authorizer.protect(
        |url: &String| serde_json::json!({ "url": url }),
        move |url: String| {
            let http = http.clone();
            async move {
                let header = CredentialContext::with(|c| c.authorization_header())
                    .context("no credential in scope")?;
                let response = http
                    .get(&url)
                    .header("Authorization", header)
                    .send()
                    .await
                    .with_context(|| format!("GET {}", url))?;
                Ok::<_, anyhow::Error>(format!("{} {}", response.status(), url))
            }
        },
    );

    info!(user = %cli.user, url = %cli.url, "requesting approval");
    match fetch.call(cli.url.clone()).await {
        Ok(line) => {
            println!("{}", line);
            Ok(())
        }
        Err(e) => match e.downcast_ref::<GuardError>() {
            Some(GuardError::Pending { key }) => {
                println!("Approval pending; request stored under {}", key);
                Ok(())
            }
            _ => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenvy::from_filename(dir.path().join("absent.env"));
        assert!(env_file_loaded(result).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GUARD_CLI_TEST_VALUE=\"unterminated").unwrap();

        let result = dotenvy::from_filename(file.path());
        assert!(env_file_loaded(result).is_err());
    }

    #[test]
    fn test_slow_down_flag_maps_to_policy() {
        assert_eq!(SlowDownPolicy::from(SlowDown::Increment), SlowDownPolicy::default());
        assert_eq!(SlowDownPolicy::from(SlowDown::Double), SlowDownPolicy::Double);
    }
}
