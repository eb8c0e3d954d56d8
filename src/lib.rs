//! # mangaone-dl
//!
//! Library for fetching a MangaOne chapter's viewer payload, extracting the page
//! locators and AES key material from it, and writing the decrypted pages to disk.
//!
//! ## Pipeline
//!
//! - **Extract** - one authenticated viewer request, scanned for page URLs and key/IV
//! - **Download** - pages fetched one at a time in payload order, paced, cancellable
//! - **Decrypt** - AES-256 over each whole page body (CBC + PKCS#7 by default)
//! - **Persist** - `page_001.webp`, `page_002.webp`, ... in the chosen directory
//!
//! ## Quick Start
//!
//! ```no_run
//! use mangaone_dl::{ChapterLocator, Config, EnvCredentials, OutputPlacement, fetch_chapter};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let cancel = CancellationToken::new();
//!
//!     let pages = fetch_chapter(
//!         &config,
//!         Arc::new(EnvCredentials::default()),
//!         &ChapterLocator::new("2852", "321769"),
//!         &OutputPlacement::relative(["pan_wo_nameruna", "ch1"]),
//!         &cancel,
//!     )
//!     .await?;
//!
//!     println!("saved {} pages", pages.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// AES page decryption
pub mod cipher;
/// Shared HTTP client construction
pub mod client;
/// Configuration types
pub mod config;
/// Session credential sources
pub mod credentials;
/// Sequential page downloader
pub mod downloader;
/// Error types
pub mod error;
/// Viewer payload extraction
pub mod extractor;
/// Inter-page pacing
pub mod pacing;
/// Output directory resolution
pub mod placement;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use cipher::{CipherMaterial, CipherMode};
pub use config::{ApiConfig, Config, DownloadConfig, ScanConfig};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use downloader::PageDownloader;
pub use error::{DecryptionError, Error, ExtractionError, Phase, Result};
pub use extractor::Extractor;
pub use pacing::PacingPolicy;
pub use placement::OutputPlacement;
pub use types::{
    ChapterLocator, Event, ExtractionResult, PageFile, ResourceLocator, SessionCredentials,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Extract a chapter and download all of its pages
///
/// Validates `config`, performs the viewer request, then downloads every page
/// into the directory named by `placement`. Both stages share one HTTP client.
/// Returns the written files in page order.
///
/// Use [`Extractor`] and [`PageDownloader`] directly to subscribe to events or
/// resume from a later page.
pub async fn fetch_chapter(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
    locator: &ChapterLocator,
    placement: &OutputPlacement,
    cancel: &CancellationToken,
) -> Result<Vec<PageFile>> {
    config.validate()?;
    let client = client::build_client(config)?;

    let extractor = Extractor::with_client(client.clone(), config, credentials)?;
    let extraction = extractor.extract(locator).await?;

    let downloader = PageDownloader::with_client(client, config);
    downloader
        .download(&extraction.pages, &extraction.cipher, placement, cancel)
        .await
}

/// Cancel `token` when the process receives a termination signal
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// The downloader notices the cancellation before the next page or during the
/// pacing delay, so the page in flight is finished first.
///
/// # Example
///
/// ```no_run
/// use mangaone_dl::cancel_on_shutdown_signal;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     let _guard = cancel_on_shutdown_signal(cancel.clone());
///     // pass `&cancel` to fetch_chapter or PageDownloader::download
/// }
/// ```
pub fn cancel_on_shutdown_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => {
                tracing::info!("shutdown signal received, cancelling download");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
