//! Test configuration helpers for mock and live runs

use mangaone_dl::config::CHAPTER_ID_PLACEHOLDER;
use mangaone_dl::{Config, CredentialProvider, SessionCredentials, StaticCredentials};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// Config pointed at `server`, writing under `base_dir`, with no pacing delay
///
/// The locator pattern is widened to accept the mock server's host.
pub fn mock_config(server: &MockServer, base_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.endpoint = format!("{}/api/client", server.uri());
    config.scan.locator_pattern = format!(
        r#"{}/[^"'\s\x00-\x1F]*?/manga_page_low/{CHAPTER_ID_PLACEHOLDER}/[^"'\s\x00-\x1F]*"#,
        regex::escape(&server.uri())
    );
    config.download.base_dir = base_dir.to_path_buf();
    config.download.page_delay = Duration::ZERO;
    config.download.request_timeout = Duration::from_secs(5);
    config
}

/// Credentials that the mock server accepts
pub fn fake_credentials() -> Arc<dyn CredentialProvider> {
    Arc::new(StaticCredentials::new(SessionCredentials {
        api_session: "test-api-session".to_string(),
        manga_one_session: "test-manga-one-session".to_string(),
        home_popup_start_time: "1700000000".to_string(),
    }))
}

/// Check whether live MangaOne credentials are available (via .env)
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    ["api_session", "manga_one_session", "home_popup_start_time"]
        .iter()
        .all(|name| std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false))
}
