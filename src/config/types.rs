use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub regions: RegionsConfig,

    #[serde(default)]
    pub mam: MamConfig,

    #[serde(default)]
    pub audnex: AudnexConfig,

    #[serde(default)]
    pub audible: AudibleConfig,

    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of webhook jobs waiting for the worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long the worker waits on an empty queue before re-checking shutdown
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Webhook requests allowed per minute (0 disables the limit)
    #[serde(default = "default_webhook_rate_limit")]
    pub webhook_rate_limit_per_minute: u32,

    /// Shared secret for HMAC-SHA256 webhook signatures (unset = not checked)
    #[serde(default)]
    pub signature_secret: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_queue_capacity() -> usize {
    100
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_webhook_rate_limit() -> u32 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            queue_capacity: default_queue_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
            webhook_rate_limit_per_minute: default_webhook_rate_limit(),
            signature_secret: None,
        }
    }
}

impl ServerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Minimum delay between any two outbound requests
    #[serde(default = "default_rate_limit_interval_ms")]
    pub rate_limit_interval_ms: u64,

    /// Total attempts for transient failures (429 waits are not counted)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,

    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Wait used when a 429 carries no usable Retry-After header
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,

    /// Upper bound on any single Retry-After wait
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_rate_limit_interval_ms() -> u64 {
    150
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base() -> f64 {
    2.0
}
fn default_backoff_unit_ms() -> u64 {
    1000
}
fn default_retry_after_secs() -> u64 {
    5
}
fn default_max_retry_after_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("audiohook/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            rate_limit_interval_ms: default_rate_limit_interval_ms(),
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            backoff_unit_ms: default_backoff_unit_ms(),
            default_retry_after_secs: default_retry_after_secs(),
            max_retry_after_secs: default_max_retry_after_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionsConfig {
    /// Ranked catalog regions, most preferred first
    #[serde(default = "default_regions")]
    pub list: Vec<String>,

    /// Maximum regions raced concurrently per lookup
    #[serde(default = "default_max_regions_to_try")]
    pub max_regions_to_try: usize,
}

fn default_regions() -> Vec<String> {
    ["us", "uk", "ca", "au", "de", "fr", "it", "es", "in", "jp"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}
fn default_max_regions_to_try() -> usize {
    3
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            list: default_regions(),
            max_regions_to_try: default_max_regions_to_try(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MamConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the tracker API
    #[serde(default = "default_mam_base_url")]
    pub base_url: String,

    /// Host whose item URLs trigger the MAM lookup step
    #[serde(default = "default_mam_domain")]
    pub domain: String,

    /// Value of the `mam_id` session cookie
    #[serde(default)]
    pub session_cookie: Option<String>,
}

fn default_mam_base_url() -> String {
    "https://www.myanonamouse.net".to_string()
}
fn default_mam_domain() -> String {
    "myanonamouse.net".to_string()
}

impl Default for MamConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_mam_base_url(),
            domain: default_mam_domain(),
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudnexConfig {
    #[serde(default = "default_audnex_base_url")]
    pub base_url: String,

    /// Fetch chapter markers for resolved books
    #[serde(default = "default_true")]
    pub fetch_chapters: bool,
}

fn default_audnex_base_url() -> String {
    "https://api.audnex.us".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for AudnexConfig {
    fn default() -> Self {
        Self {
            base_url: default_audnex_base_url(),
            fetch_chapters: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AudibleConfig {
    /// Replace the per-region `https://api.audible{tld}` host
    #[serde(default)]
    pub base_url: Option<String>,

    /// Resolve the chosen search candidate through Audnex for full details
    #[serde(default)]
    pub resolve_with_audnex: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    pub name: String,

    pub url: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}
