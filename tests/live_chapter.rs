//! End-to-end tests against the real MangaOne service
//!
//! Requires a logged-in browser session exported to `.env`. Compiled only with
//! the `live-tests` feature and additionally marked `#[ignore]`.
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --features live-tests --test live_chapter -- --ignored --nocapture
//! ```
//!
//! # Required environment variables (.env file)
//!
//! - `api_session` - `api_session` cookie value
//! - `manga_one_session` - `manga_one_session` cookie value
//! - `home_popup_start_time` - `home_popup_start_time` cookie value
//! - `MANGAONE_TITLE_ID` / `MANGAONE_CHAPTER_ID` - chapter to fetch (optional, default: 2852 / 321769)

#![cfg(feature = "live-tests")]

mod common;

use common::has_live_credentials;
use mangaone_dl::{
    ChapterLocator, Config, EnvCredentials, Extractor, OutputPlacement, fetch_chapter,
};
use serial_test::serial;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn live_locator() -> ChapterLocator {
    ChapterLocator::new(
        std::env::var("MANGAONE_TITLE_ID").unwrap_or_else(|_| "2852".to_string()),
        std::env::var("MANGAONE_CHAPTER_ID").unwrap_or_else(|_| "321769".to_string()),
    )
}

/// The viewer payload yields at least one page plus key material
#[tokio::test]
#[ignore]
#[serial]
async fn test_live_extraction() {
    if !has_live_credentials() {
        eprintln!("Skipping: MangaOne session cookies not found in .env");
        return;
    }

    let extractor = Extractor::new(&Config::default(), Arc::new(EnvCredentials::default()))
        .expect("extractor");
    let result = extractor.extract(&live_locator()).await;

    let result = result.expect("extraction should succeed with valid session");
    println!("Found {} pages", result.pages.len());
    assert!(!result.pages.is_empty(), "chapter should have pages");
}

/// A full chapter downloads into a temporary directory
#[tokio::test]
#[ignore]
#[serial]
async fn test_live_full_chapter() {
    if !has_live_credentials() {
        eprintln!("Skipping: MangaOne session cookies not found in .env");
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.download.base_dir = temp.path().to_path_buf();

    let pages = fetch_chapter(
        &config,
        Arc::new(EnvCredentials::default()),
        &live_locator(),
        &OutputPlacement::relative(["live"]),
        &CancellationToken::new(),
    )
    .await
    .expect("chapter download");

    for page in &pages {
        let size = std::fs::metadata(&page.path).expect("page file").len();
        println!("{} ({size} bytes)", page.path.display());
        assert!(size > 0);
    }
}
