//! Viewer payload extraction
//!
//! Issues the single viewer API request for a chapter and scans the response
//! for page locators and the chapter's key/IV. See [`scan`] for the matching rules.

pub mod scan;

use crate::cipher::redacted_hex;
use crate::client::{build_client, check_status};
use crate::config::{ApiConfig, CHAPTER_ID_PLACEHOLDER, Config, TITLE_ID_PLACEHOLDER};
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::types::{ChapterLocator, ExtractionResult, SessionCredentials};
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER};
use scan::PayloadScanner;
use std::sync::Arc;

/// Fetches a chapter's viewer payload and extracts pages and cipher material
#[derive(Clone)]
pub struct Extractor {
    client: Client,
    api: ApiConfig,
    scanner: PayloadScanner,
    credentials: Arc<dyn CredentialProvider>,
}

impl Extractor {
    /// Create an extractor with its own HTTP client
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        Self::with_client(build_client(config)?, config, credentials)
    }

    /// Create an extractor that shares an existing HTTP client
    pub fn with_client(
        client: Client,
        config: &Config,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            api: config.api.clone(),
            scanner: PayloadScanner::new(&config.scan)?,
            credentials,
        })
    }

    /// Fetch the viewer payload for `locator` and extract pages plus key/IV
    pub async fn extract(&self, locator: &ChapterLocator) -> Result<ExtractionResult> {
        let body = self.fetch_payload(locator).await?;
        let (pages, cipher) = self.scanner.scan(&body, &locator.chapter_id)?;

        tracing::info!(
            title_id = %locator.title_id,
            chapter_id = %locator.chapter_id,
            pages = pages.len(),
            key = %redacted_hex(cipher.key()),
            iv = %redacted_hex(cipher.iv()),
            "extracted chapter payload"
        );
        if pages.is_empty() {
            tracing::warn!(chapter_id = %locator.chapter_id, "no page locators found in payload");
        }

        Ok(ExtractionResult { pages, cipher })
    }

    /// Send the viewer request and return the body decoded as UTF-8 text
    pub async fn fetch_payload(&self, locator: &ChapterLocator) -> Result<String> {
        let credentials = self.credentials.credentials()?;
        let headers = self.request_headers(locator, &credentials)?;

        tracing::debug!(
            endpoint = %self.api.endpoint,
            title_id = %locator.title_id,
            chapter_id = %locator.chapter_id,
            "requesting viewer payload"
        );

        let response = self
            .client
            .post(&self.api.endpoint)
            .query(&self.query(locator))
            .headers(headers)
            .send()
            .await?;
        let response = check_status(response).map_err(|e| {
            tracing::warn!(error = %e, "viewer request rejected");
            e
        })?;

        let bytes = response.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn query(&self, locator: &ChapterLocator) -> Vec<(&'static str, String)> {
        vec![
            ("rq", "viewer_v2".to_string()),
            ("title_id", locator.title_id.clone()),
            ("chapter_id", locator.chapter_id.clone()),
            ("page", "1".to_string()),
            ("limit", self.api.page_limit.to_string()),
            ("sort_type", "desc".to_string()),
            ("list_type", "chapter".to_string()),
            ("free_point", "0".to_string()),
            ("event_point", "0".to_string()),
            ("paid_point", "0".to_string()),
        ]
    }

    fn request_headers(
        &self,
        locator: &ChapterLocator,
        credentials: &SessionCredentials,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.api.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::config(format!("invalid header name {name:?}: {e}"), "api.headers")
            })?;
            headers.insert(name, header_value(value, "api.headers")?);
        }

        headers.insert(
            COOKIE,
            header_value(&self.cookie(credentials), "credentials")?,
        );
        headers.insert(
            REFERER,
            header_value(&self.referer(locator), "api.referer_template")?,
        );
        Ok(headers)
    }

    /// Cookie header: the three session tokens followed by the literal flags
    pub(crate) fn cookie(&self, credentials: &SessionCredentials) -> String {
        let mut pairs = vec![
            format!("api_session={}", credentials.api_session),
            format!("home_popup_start_time={}", credentials.home_popup_start_time),
            format!("manga_one_session={}", credentials.manga_one_session),
        ];
        pairs.extend(
            self.api
                .cookie_flags
                .iter()
                .map(|(name, value)| format!("{name}={value}")),
        );
        pairs.join("; ")
    }

    pub(crate) fn referer(&self, locator: &ChapterLocator) -> String {
        self.api
            .referer_template
            .replace(TITLE_ID_PLACEHOLDER, &locator.title_id)
            .replace(CHAPTER_ID_PLACEHOLDER, &locator.chapter_id)
    }
}

fn header_value(value: &str, key: &str) -> Result<HeaderValue> {
    // The value itself may be a secret; keep it out of the message.
    HeaderValue::from_str(value)
        .map_err(|_| Error::config("header value contains invalid characters", key))
}
