//! Sequential page download, decryption, and persistence
//!
//! Pages are processed strictly in locator order, one at a time:
//! fetch the encrypted bytes, decrypt the whole buffer, write
//! `page_{index:03}.{ext}`, then pause before the next request.
//! The first failing page stops the run; its index is carried in
//! [`Error::Page`] so a later run can resume with [`PageDownloader::download_from`].

use crate::cipher::{self, CipherMaterial, CipherMode};
use crate::client::{build_client, check_status};
use crate::config::{Config, DownloadConfig};
use crate::error::{Error, Result};
use crate::pacing::PacingPolicy;
use crate::placement::OutputPlacement;
use crate::types::{Event, PageFile, ResourceLocator, page_file_name};
use reqwest::Client;
use std::path::Path;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Event channel capacity; slow subscribers miss old events rather than block pages
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Downloads and decrypts the pages of one chapter
#[derive(Clone)]
pub struct PageDownloader {
    client: Client,
    config: DownloadConfig,
    pacing: PacingPolicy,
    event_tx: broadcast::Sender<Event>,
}

impl PageDownloader {
    /// Create a downloader with its own HTTP client
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    /// Create a downloader that shares an existing HTTP client
    ///
    /// Pacing comes from `download.page_delay`; override it with [`Self::with_pacing`].
    pub fn with_client(client: Client, config: &Config) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            pacing: PacingPolicy::fixed(config.download.page_delay),
            config: config.download.clone(),
            event_tx,
        }
    }

    /// Replace the pacing policy
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Download every page, numbering files from 1 in locator order
    pub async fn download(
        &self,
        pages: &[ResourceLocator],
        cipher: &CipherMaterial,
        placement: &OutputPlacement,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageFile>> {
        self.download_from(1, pages, cipher, placement, cancel).await
    }

    /// Download pages starting at the 1-based `start_index`
    ///
    /// Earlier pages are not fetched; file numbering is the same as a full run.
    pub async fn download_from(
        &self,
        start_index: usize,
        pages: &[ResourceLocator],
        cipher: &CipherMaterial,
        placement: &OutputPlacement,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageFile>> {
        if start_index == 0 {
            return Err(Error::config("page indices start at 1", "start_index"));
        }

        let dir = placement.prepare(&self.config).await?;
        self.emit(Event::DirectoryReady { path: dir.clone() });

        let total = pages.len();
        let mut written = Vec::with_capacity(total.saturating_sub(start_index - 1));

        for (offset, url) in pages.iter().enumerate().skip(start_index - 1) {
            let index = offset + 1;

            if cancel.is_cancelled() {
                return Err(self.cancelled(index));
            }

            self.emit(Event::PageStarted { index, total });
            let page = match self.process_page(index, url, cipher, &dir).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(index, url = %url, error = %e, "page failed, stopping");
                    self.emit(Event::PageFailed {
                        index,
                        error: e.to_string(),
                    });
                    return Err(Error::Page {
                        index,
                        url: url.clone(),
                        source: Box::new(e),
                    });
                }
            };

            let fetched = !page.skipped;
            if page.skipped {
                self.emit(Event::PageSkipped {
                    index,
                    path: page.path.clone(),
                });
            } else {
                self.emit(Event::PageSaved {
                    index,
                    path: page.path.clone(),
                    bytes: page.bytes,
                });
            }
            written.push(page);

            // Nothing follows the last page, so there is nothing to pace.
            if fetched && index < total {
                self.emit(Event::cooldown(self.pacing.delay()));
                tracing::trace!(delay_ms = self.pacing.delay().as_millis() as u64, "cooldown");
                if !self.pacing.pause(cancel).await {
                    return Err(self.cancelled(index + 1));
                }
            }
        }

        tracing::info!(pages = written.len(), path = %dir.display(), "chapter download complete");
        self.emit(Event::Completed {
            pages: written.len(),
        });
        Ok(written)
    }

    async fn process_page(
        &self,
        index: usize,
        url: &str,
        cipher: &CipherMaterial,
        dir: &Path,
    ) -> Result<PageFile> {
        let path = dir.join(page_file_name(index, &self.config.extension));

        if !self.config.overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(index, path = %path.display(), "page exists, skipping");
            return Ok(PageFile {
                index,
                path,
                bytes: 0,
                skipped: true,
            });
        }

        tracing::debug!(index, url = %url, "downloading encrypted page");
        let encrypted = self.fetch_page(url).await?;
        let decrypted = decrypt_page(self.config.cipher_mode, cipher, &encrypted)?;

        tokio::fs::write(&path, &decrypted)
            .await
            .map_err(|e| Error::filesystem(&path, e))?;
        tracing::info!(index, path = %path.display(), bytes = decrypted.len(), "saved page");

        Ok(PageFile {
            index,
            path,
            bytes: decrypted.len() as u64,
            skipped: false,
        })
    }

    /// Fetch one encrypted page as raw bytes; no authentication is attached
    pub async fn fetch_page(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let response = check_status(response)?;
        Ok(response.bytes().await?.to_vec())
    }

    fn cancelled(&self, next_index: usize) -> Error {
        tracing::warn!(next_index, "download cancelled");
        self.emit(Event::Cancelled { next_index });
        Error::Cancelled
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

fn decrypt_page(mode: CipherMode, cipher: &CipherMaterial, encrypted: &[u8]) -> Result<Vec<u8>> {
    Ok(cipher::decrypt(mode, cipher, encrypted)?)
}
