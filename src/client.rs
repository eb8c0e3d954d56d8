//! Shared HTTP client construction

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::Client;

/// Build the HTTP client used for both the viewer request and page fetches
///
/// Every request is bounded by `download.request_timeout`.
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.download.request_timeout)
        .connect_timeout(config.download.request_timeout)
        .build()
        .map_err(Error::Network)
}

/// Turn a non-success status into [`Error::HttpStatus`]
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::HttpStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
