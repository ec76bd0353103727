//! Service configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in service defaults
//! 2. **Configuration file** – `.inquisitor.toml` in the current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `INQUISITOR_*`, plus the legacy
//!    `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--github-token`, `--channel-id`, ...
//!
//! # Configuration File
//!
//! ```toml
//! github_token = "ghp_example"
//! discord_token = "bot-token"
//! discord_application_id = 1234
//! discord_public_key = "8f3c..."
//! channel_id = 987654321
//! organization = "ModdingInquisition"
//! encryption_password = "linked-account-secret"
//! database_url = "inquisitor.sqlite"
//! webhook_secret = "shared-secret"
//! update_check_interval_minutes = 10
//! ```

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_WEBHOOK_BIND: &str = "0.0.0.0:8080";
const DEFAULT_UPDATE_CHECK_INTERVAL_MINUTES: u64 = 10;
const DEFAULT_INITIAL_DELAY_SECONDS: u64 = 60;
const DEFAULT_ITEM_DELAY_MILLIS: u64 = 100;
const DEFAULT_SLOW_CYCLE_WARNING_SECONDS: u64 = 120;
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The layered loader failed.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Loader failure detail.
        message: String,
    },

    /// A required setting had no value from any source.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A setting had a value outside its accepted range.
    #[error("{field} is invalid: {message}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Pacing for the reconciliation scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Delay before the first cycle after startup.
    pub initial_delay: Duration,
    /// Pause between items within a cycle.
    pub item_delay: Duration,
    /// Cycles longer than this are logged as a warning.
    pub slow_cycle_threshold: Duration,
}

/// Service configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use inquisitor::InquisitorConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = InquisitorConfig::load().expect("failed to load configuration");
/// let settings = config.sync_settings().expect("valid pacing");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "INQUISITOR",
    discovery(
        dotfile_name = ".inquisitor.toml",
        config_file_name = "inquisitor.toml",
        app_name = "inquisitor"
    )
)]
pub struct InquisitorConfig {
    /// GitHub personal access token.
    ///
    /// Can be provided via:
    /// - CLI: `--github-token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `INQUISITOR_GITHUB_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `github_token = "..."`
    #[ortho_config(cli_short = 't')]
    pub github_token: Option<String>,

    /// GitHub REST API base URL.
    #[ortho_config()]
    pub github_api_base: String,

    /// Discord bot token.
    #[ortho_config()]
    pub discord_token: Option<String>,

    /// Discord REST API base URL.
    #[ortho_config()]
    pub discord_api_base: String,

    /// Discord application id, used for interaction follow-ups.
    #[ortho_config()]
    pub discord_application_id: Option<u64>,

    /// Hex-encoded Ed25519 public key for verifying interaction requests.
    #[ortho_config()]
    pub discord_public_key: Option<String>,

    /// Channel that pull request summaries and threads are posted in.
    #[ortho_config(cli_short = 'c')]
    pub channel_id: Option<u64>,

    /// Organization that owns the forks pull requests are opened from.
    #[ortho_config(cli_short = 'o')]
    pub organization: Option<String>,

    /// Local `SQLite` database URL/path.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so use `--migrate-db` or the config file.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Socket address the webhook and interaction server binds to.
    #[ortho_config()]
    pub webhook_bind: String,

    /// Shared secret for `X-Hub-Signature-256`; unsigned deliveries are
    /// accepted when unset.
    #[ortho_config()]
    pub webhook_secret: Option<String>,

    /// Password the linked-account token key is derived from.
    ///
    /// When set, chat edits are made with the submitting user's linked
    /// GitHub token; otherwise they are made as the bot.
    #[ortho_config()]
    pub encryption_password: Option<String>,

    /// Minutes between reconciliation cycles.
    ///
    /// Pull request churn faster than this is only observed as the net
    /// change between two cycles.
    #[ortho_config()]
    pub update_check_interval_minutes: u64,

    /// Seconds to wait after startup before the first cycle.
    #[ortho_config()]
    pub initial_delay_seconds: u64,

    /// Milliseconds to pause between pull requests within a cycle.
    #[ortho_config()]
    pub item_delay_millis: u64,

    /// Cycles longer than this many seconds are logged as a warning.
    #[ortho_config()]
    pub slow_cycle_warning_seconds: u64,

    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    #[ortho_config()]
    pub log_filter: String,
}

impl Default for InquisitorConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_base: DEFAULT_GITHUB_API_BASE.to_owned(),
            discord_token: None,
            discord_api_base: DEFAULT_DISCORD_API_BASE.to_owned(),
            discord_application_id: None,
            discord_public_key: None,
            channel_id: None,
            organization: None,
            database_url: None,
            migrate_db: false,
            webhook_bind: DEFAULT_WEBHOOK_BIND.to_owned(),
            webhook_secret: None,
            encryption_password: None,
            update_check_interval_minutes: DEFAULT_UPDATE_CHECK_INTERVAL_MINUTES,
            initial_delay_seconds: DEFAULT_INITIAL_DELAY_SECONDS,
            item_delay_millis: DEFAULT_ITEM_DELAY_MILLIS,
            slow_cycle_warning_seconds: DEFAULT_SLOW_CYCLE_WARNING_SECONDS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl InquisitorConfig {
    /// Resolves the GitHub token from configuration or the legacy
    /// `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no source provides a value.
    pub fn resolve_github_token(&self) -> Result<String, ConfigError> {
        self.github_token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("github_token"))
    }

    /// Returns the Discord bot token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn require_discord_token(&self) -> Result<&str, ConfigError> {
        self.discord_token
            .as_deref()
            .ok_or(ConfigError::Missing("discord_token"))
    }

    /// Returns the deployment channel id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn require_channel_id(&self) -> Result<u64, ConfigError> {
        self.channel_id.ok_or(ConfigError::Missing("channel_id"))
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("database_url"))
    }

    /// Returns the organization forks live in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn require_organization(&self) -> Result<&str, ConfigError> {
        self.organization
            .as_deref()
            .ok_or(ConfigError::Missing("organization"))
    }

    /// Scheduler pacing derived from the configured intervals.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the update interval is zero.
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        if self.update_check_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "update_check_interval_minutes",
                message: "must be at least one minute".to_owned(),
            });
        }
        Ok(SyncSettings {
            interval: Duration::from_secs(self.update_check_interval_minutes.saturating_mul(60)),
            initial_delay: Duration::from_secs(self.initial_delay_seconds),
            item_delay: Duration::from_millis(self.item_delay_millis),
            slow_cycle_threshold: Duration::from_secs(self.slow_cycle_warning_seconds),
        })
    }
}

#[cfg(test)]
mod tests;
