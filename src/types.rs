//! Core types and events

use crate::cipher::CipherMaterial;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// URL of one encrypted page asset
pub type ResourceLocator = String;

/// Identifies one chapter document on the viewer API
///
/// Both ids are opaque tokens, even when they look numeric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLocator {
    /// Title (series) id
    pub title_id: String,
    /// Chapter id
    pub chapter_id: String,
}

impl ChapterLocator {
    /// Create a locator from anything string-like
    pub fn new(title_id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

/// Session cookies required by the viewer API
///
/// `Debug` never prints the token values.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// `api_session` cookie
    pub api_session: String,
    /// `manga_one_session` cookie
    pub manga_one_session: String,
    /// `home_popup_start_time` cookie
    pub home_popup_start_time: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("api_session", &"<redacted>")
            .field("manga_one_session", &"<redacted>")
            .field("home_popup_start_time", &"<redacted>")
            .finish()
    }
}

/// Pages and secrets recovered from one viewer payload
#[derive(Clone, Debug)]
pub struct ExtractionResult {
    /// Page locators in payload order; may be empty
    pub pages: Vec<ResourceLocator>,
    /// Key/IV for every page in the chapter
    pub cipher: CipherMaterial,
}

/// One decrypted page written to disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFile {
    /// 1-based page index
    pub index: usize,
    /// Absolute path of the written file
    pub path: PathBuf,
    /// Number of decrypted bytes written (0 when skipped)
    pub bytes: u64,
    /// True when an existing file was kept instead of rewritten
    pub skipped: bool,
}

/// File name for a page: `page_{index:03}.{ext}`
///
/// The width is a minimum, so index 1000 becomes `page_1000.webp`.
pub fn page_file_name(index: usize, extension: &str) -> String {
    format!("page_{index:03}.{extension}")
}

/// Progress events emitted by the page downloader
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Output directory resolved and created
    DirectoryReady {
        /// Absolute output directory
        path: PathBuf,
    },

    /// About to fetch a page
    PageStarted {
        /// 1-based page index
        index: usize,
        /// Total pages in the chapter
        total: usize,
    },

    /// Page decrypted and written
    PageSaved {
        /// 1-based page index
        index: usize,
        /// Written file
        path: PathBuf,
        /// Decrypted size
        bytes: u64,
    },

    /// Existing file kept (overwrite disabled)
    PageSkipped {
        /// 1-based page index
        index: usize,
        /// Existing file
        path: PathBuf,
    },

    /// Page failed; the run stops here
    PageFailed {
        /// 1-based page index
        index: usize,
        /// Error message
        error: String,
    },

    /// Pacing delay before the next page
    Cooldown {
        /// Delay duration in milliseconds
        delay_ms: u64,
    },

    /// All pages processed
    Completed {
        /// Pages written or skipped
        pages: usize,
    },

    /// Run cancelled before this page
    Cancelled {
        /// First page index not processed
        next_index: usize,
    },
}

impl Event {
    pub(crate) fn cooldown(delay: Duration) -> Self {
        Event::Cooldown {
            delay_ms: delay.as_millis() as u64,
        }
    }
}
