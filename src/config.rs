//! Configuration types for mangaone-dl

use crate::cipher::CipherMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

/// Placeholder substituted with the chapter id in templates
pub const CHAPTER_ID_PLACEHOLDER: &str = "{chapter_id}";
/// Placeholder substituted with the title id in templates
pub const TITLE_ID_PLACEHOLDER: &str = "{title_id}";

/// Viewer API request settings
///
/// The upstream service checks these loosely, but they change whenever the web
/// viewer does. Copy fresh values from the browser dev tools if requests start failing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Viewer API endpoint (default: "https://manga-one.com/api/client")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Referer template with `{title_id}` and `{chapter_id}` placeholders
    #[serde(default = "default_referer_template")]
    pub referer_template: String,

    /// Extra request headers sent with the viewer request
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,

    /// Literal cookie flags appended after the session cookies
    #[serde(default = "default_cookie_flags")]
    pub cookie_flags: BTreeMap<String, String>,

    /// Value of the `limit` query parameter (default: 10)
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            referer_template: default_referer_template(),
            headers: default_headers(),
            cookie_flags: default_cookie_flags(),
            page_limit: default_page_limit(),
        }
    }
}

/// Patterns used to scan the viewer payload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Page locator regex; must contain `{chapter_id}`, which is replaced by the
    /// regex-escaped chapter id before compiling
    #[serde(default = "default_locator_pattern")]
    pub locator_pattern: String,

    /// Key regex (default: 64 lowercase hex characters)
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,

    /// IV regex (default: 32 lowercase hex characters)
    #[serde(default = "default_iv_pattern")]
    pub iv_pattern: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            locator_pattern: default_locator_pattern(),
            key_pattern: default_key_pattern(),
            iv_pattern: default_iv_pattern(),
        }
    }
}

/// Page download settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory for relative and scratch placements (default: ".")
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Scratch segment under `base_dir` for the default placement (default: "temp")
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,

    /// Page file extension without the dot (default: "webp")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Delay after each page, in milliseconds (default: 500)
    #[serde(default = "default_page_delay", with = "duration_millis_serde")]
    pub page_delay: Duration,

    /// Cipher mode used for pages (default: cbc)
    #[serde(default)]
    pub cipher_mode: CipherMode,

    /// Per-request timeout, in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Overwrite page files left by an earlier run (default: true)
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            scratch_dir: default_scratch_dir(),
            extension: default_extension(),
            page_delay: default_page_delay(),
            cipher_mode: CipherMode::default(),
            request_timeout: default_request_timeout(),
            overwrite: true,
        }
    }
}

/// Main configuration
///
/// Every field has a default, so `{}` is a complete configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Viewer API request settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Payload scan patterns
    #[serde(default)]
    pub scan: ScanConfig,

    /// Page download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail late in a run
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint: {e}"), "api.endpoint"))?;

        if !self.scan.locator_pattern.contains(CHAPTER_ID_PLACEHOLDER) {
            return Err(Error::config(
                format!("locator pattern must contain {CHAPTER_ID_PLACEHOLDER}"),
                "scan.locator_pattern",
            ));
        }

        let checks = [
            (
                self.scan.locator_pattern.replace(CHAPTER_ID_PLACEHOLDER, "0"),
                "scan.locator_pattern",
            ),
            (self.scan.key_pattern.clone(), "scan.key_pattern"),
            (self.scan.iv_pattern.clone(), "scan.iv_pattern"),
        ];
        for (pattern, key) in checks {
            if let Err(e) = regex::Regex::new(&pattern) {
                return Err(Error::config(format!("invalid regex: {e}"), key));
            }
        }

        let ext = &self.download.extension;
        if ext.is_empty() || ext.contains('.') || ext.contains(['/', '\\']) {
            return Err(Error::config(
                format!("invalid page extension {ext:?}"),
                "download.extension",
            ));
        }

        if self.download.request_timeout.is_zero() {
            return Err(Error::config(
                "request timeout must be non-zero",
                "download.request_timeout",
            ));
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://manga-one.com/api/client".to_string()
}

fn default_referer_template() -> String {
    "https://manga-one.com/manga/{title_id}/chapter/{chapter_id}?type=chapter&sort_type=desc&page=1&limit=10"
        .to_string()
}

fn default_headers() -> BTreeMap<String, String> {
    [
        ("accept", "*/*"),
        ("accept-language", "en-US,en;q=0.9,ja;q=0.8"),
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("priority", "u=1, i"),
        (
            "sec-ch-ua",
            r#""Microsoft Edge";v="143", "Chromium";v="143", "Not A(Brand";v="24""#,
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""Windows""#),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-origin"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_cookie_flags() -> BTreeMap<String, String> {
    [("is_logged_in", "true"), ("is_app_connected", "true")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_page_limit() -> u32 {
    10
}

fn default_locator_pattern() -> String {
    r#"https://app\.manga-one\.com/[^"'\s\x00-\x1F]*?/manga_page_low/{chapter_id}/[^"'\s\x00-\x1F]*"#
        .to_string()
}

fn default_key_pattern() -> String {
    "[a-f0-9]{64}".to_string()
}

fn default_iv_pattern() -> String {
    "[a-f0-9]{32}".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_scratch_dir() -> String {
    "temp".to_string()
}

fn default_extension() -> String {
    "webp".to_string()
}

fn default_page_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
