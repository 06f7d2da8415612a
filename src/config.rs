use camino::Utf8PathBuf;

use crate::error::SobsError;
use crate::export::DEFAULT_ORGANISM;
use crate::loader::DEFAULT_BATCH_SIZE;

pub const DEFAULT_DB_NAME: &str = "sobs.sqlite3";
pub const DEFAULT_EXPORT_PATH: &str = "samples.csv";

pub const ENV_DB_NAME: &str = "SOBS_DB_NAME";
pub const ENV_DB_USER: &str = "SOBS_DB_USER";
pub const ENV_DB_PASSWORD: &str = "SOBS_DB_PASSWORD";
pub const ENV_DB_HOST: &str = "SOBS_DB_HOST";
pub const ENV_DB_PORT: &str = "SOBS_DB_PORT";

// Only `name` is used by the embedded store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub name: Utf8PathBuf,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl DbConfig {
    pub fn has_server_settings(&self) -> bool {
        self.user.is_some() || self.password.is_some() || self.host.is_some() || self.port.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub batch_size: usize,
    pub skip_malformed: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            skip_malformed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub organism: String,
    pub output: Utf8PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            organism: DEFAULT_ORGANISM.to_string(),
            output: Utf8PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_env() -> Result<DbConfig, SobsError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<DbConfig, SobsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = var(ENV_DB_PORT)
            .map(|value| {
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| SobsError::Config(format!("{ENV_DB_PORT}={value} is not a port")))
            })
            .transpose()?;

        Ok(DbConfig {
            name: var(ENV_DB_NAME)
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DB_NAME)),
            user: var(ENV_DB_USER),
            password: var(ENV_DB_PASSWORD),
            host: var(ENV_DB_HOST),
            port,
        })
    }
}
