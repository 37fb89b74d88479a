use std::sync::Arc;

use auth::PasswordError;
use auth::SecretHasher;
use config::ConfigError;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::domain::session::ports::Clock;
use crate::domain::session::ports::SystemClock;
use crate::domain::session::ports::UserDirectory;
use crate::domain::session::service::AuthService;
use crate::domain::session::validator::SessionValidator;
use crate::outbound::directory::PostgresUserDirectory;
use crate::outbound::revocation::spawn_revocation_sweep;
use crate::outbound::revocation::InMemoryRevocationStore;

const MAX_CONNECTIONS: u32 = 5;

/// Error raised while assembling the service at startup
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid hashing parameters: {0}")]
    Hashing(#[from] PasswordError),

    #[error("directory.database_url is not set")]
    MissingDatabaseUrl,

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Assembled auth service and its background sweep.
pub struct SessionRuntime<UD>
where
    UD: UserDirectory,
{
    pub service: Arc<AuthService<UD>>,
    /// Present when revocation is enabled
    pub revocations: Option<Arc<InMemoryRevocationStore>>,
    /// Revocation pruning task; abort it on shutdown
    pub sweep: Option<JoinHandle<()>>,
}

impl<UD> SessionRuntime<UD>
where
    UD: UserDirectory,
{
    /// Stop the background sweep, if any.
    pub fn shutdown(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            sweep.abort();
        }
    }
}

/// Build the auth service from configuration around a directory.
///
/// With `revocation.enabled` the validator gets an in-memory revocation
/// store and a pruning sweep is spawned; otherwise the deployment is
/// stateless. Must be called inside a tokio runtime.
///
/// # Arguments
/// * `config` - Loaded configuration
/// * `directory` - Principal lookup implementation
///
/// # Returns
/// SessionRuntime holding the service, optional store and sweep handle
///
/// # Errors
/// * `Config` - Keys, skew, lifetime, timeout or sweep interval invalid
/// * `Hashing` - Argon2 rejected the configured cost
pub fn build_session_runtime<UD>(
    config: &Config,
    directory: Arc<UD>,
) -> Result<SessionRuntime<UD>, BootstrapError>
where
    UD: UserDirectory,
{
    let codec = Arc::new(config.token_codec()?);
    let policy = config.session_policy()?;
    let hasher = SecretHasher::with_cost(config.hashing_cost())?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut validator = SessionValidator::new(codec).with_clock(Arc::clone(&clock));
    let (revocations, sweep) = if config.revocation.enabled {
        let interval = config.sweep_interval()?;
        let store = Arc::new(InMemoryRevocationStore::new());
        validator = validator.with_revocation_store(store.clone());
        let sweep = spawn_revocation_sweep(store.clone(), clock, interval);

        tracing::info!(
            sweep_interval_secs = interval.as_secs(),
            "Revocation store enabled"
        );
        (Some(store), Some(sweep))
    } else {
        tracing::info!("Revocation disabled; logout only discards tokens client-side");
        (None, None)
    };

    let service = AuthService::new(directory, validator, hasher, policy)?;

    tracing::info!(
        lifetime_secs = policy.token_lifetime.num_seconds(),
        rotate_on_refresh = policy.rotate_on_refresh,
        "Auth service ready"
    );

    Ok(SessionRuntime {
        service: Arc::new(service),
        revocations,
        sweep,
    })
}

/// Connect the Postgres directory named by `directory.database_url`.
///
/// # Errors
/// * `MissingDatabaseUrl` - No URL configured
/// * `Database` - URL invalid or connection failed
pub async fn connect_directory(config: &Config) -> Result<PostgresUserDirectory, BootstrapError> {
    let url = config
        .directory
        .database_url
        .as_deref()
        .ok_or(BootstrapError::MissingDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(url)
        .await?;

    tracing::info!(
        max_connections = MAX_CONNECTIONS,
        database = "postgresql",
        "Directory connection pool created"
    );

    Ok(PostgresUserDirectory::new(pool))
}
