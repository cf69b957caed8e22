//! Notifier configuration — Rally endpoint settings and server knobs.

use clap::Args;

const DEFAULT_RALLY_URL: &str = "https://rally1.rallydev.com";
const DEFAULT_APPLICATION_NAME: &str = "RallyBuildNotifier";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Rally endpoint settings, shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct RallyConfig {
    /// Rally server URL (WSAPI root is appended)
    #[arg(long = "rally-url", env = "RALLY_URL", default_value = DEFAULT_RALLY_URL)]
    pub url: String,

    /// Rally API key
    #[arg(long = "rally-api-key", env = "RALLY_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Workspace reference used to scope queries
    #[arg(long = "rally-workspace", env = "RALLY_WORKSPACE_REF")]
    pub workspace_ref: Option<String>,

    /// Base URL for artifact deep links (defaults to `<rally-url>/#`)
    #[arg(long = "rally-artifact-base-url", env = "RALLY_ARTIFACT_BASE_URL")]
    pub artifact_base_url: Option<String>,

    /// Integration name reported to Rally
    #[arg(long = "rally-application-name", env = "RALLY_APPLICATION_NAME", default_value = DEFAULT_APPLICATION_NAME)]
    pub application_name: String,

    /// HTTP timeout for Rally requests, in seconds
    #[arg(long = "rally-timeout", env = "RALLY_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl RallyConfig {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
            workspace_ref: None,
            artifact_base_url: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    pub fn workspace(&self) -> Option<&str> {
        self.workspace_ref.as_deref().filter(|w| !w.is_empty())
    }

    /// Root for artifact deep links, without a trailing slash.
    pub fn artifact_base_url(&self) -> String {
        let base = match self.artifact_base_url.as_deref().filter(|b| !b.is_empty()) {
            Some(base) => base.to_string(),
            None => format!("{}/#", self.url.trim_end_matches('/')),
        };
        base.strip_suffix('/').map(str::to_string).unwrap_or(base)
    }

    /// Log configuration gaps once at startup.
    pub fn warn_missing(&self) {
        if self.api_key.is_empty() {
            tracing::warn!("RALLY_API_KEY not set -- Rally will reject authenticated requests");
        }
        if self.workspace().is_none() {
            tracing::debug!("RALLY_WORKSPACE_REF not set -- queries use the key's default workspace");
        }
    }
}

/// Server-only settings, loaded from environment variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Shared secret for notification HMAC validation.
    pub notify_secret: String,
    /// Prometheus exporter listen address.
    pub metrics_addr: Option<std::net::SocketAddr>,
    /// Request timeout for incoming notifications, in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let notify_secret = std::env::var("RALLY_NOTIFIER_SECRET").unwrap_or_default();
        let metrics_addr = std::env::var("RALLY_NOTIFIER_METRICS_ADDR")
            .ok()
            .and_then(|s| s.parse().ok());
        let request_timeout_secs = std::env::var("RALLY_NOTIFIER_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        if notify_secret.is_empty() {
            tracing::warn!("RALLY_NOTIFIER_SECRET not set -- notification signature validation disabled");
        }

        Self {
            notify_secret,
            metrics_addr,
            request_timeout_secs,
        }
    }
}
