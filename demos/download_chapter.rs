//! Download one chapter example
//!
//! Reads session cookies from `.env` (or the environment), extracts the chapter
//! payload, and writes decrypted pages under `./pan_wo_nameruna/ch1`.
//!
//! ```bash
//! # .env
//! api_session=...
//! manga_one_session=...
//! home_popup_start_time=...
//!
//! RUST_LOG=mangaone_dl=debug cargo run --example download_chapter
//! ```
//!
//! Pass `TITLE_ID CHAPTER_ID` as arguments to fetch another chapter.

use mangaone_dl::{
    ChapterLocator, Config, EnvCredentials, Event, Extractor, OutputPlacement, PageDownloader,
    cancel_on_shutdown_signal,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let locator = match (args.next(), args.next()) {
        (Some(title_id), Some(chapter_id)) => ChapterLocator::new(title_id, chapter_id),
        _ => ChapterLocator::new("2852", "321769"),
    };

    let config = Config::default();
    config.validate()?;

    let cancel = CancellationToken::new();
    let _signal = cancel_on_shutdown_signal(cancel.clone());

    let client = mangaone_dl::client::build_client(&config)?;
    let credentials = Arc::new(EnvCredentials::default());
    let extractor = Extractor::with_client(client.clone(), &config, credentials)?;
    let extraction = extractor.extract(&locator).await?;
    println!("found {} pages", extraction.pages.len());

    let downloader = PageDownloader::with_client(client, &config);
    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::DirectoryReady { path } => println!("writing to {}", path.display()),
                Event::PageSaved { index, path, bytes } => {
                    println!("  page {index}: {} ({bytes} bytes)", path.display())
                }
                Event::PageFailed { index, error } => eprintln!("  page {index} failed: {error}"),
                Event::Cancelled { next_index } => {
                    eprintln!("cancelled; resume from page {next_index}")
                }
                _ => {}
            }
        }
    });

    let placement = OutputPlacement::relative(["pan_wo_nameruna", "ch1"]);
    match downloader
        .download(&extraction.pages, &extraction.cipher, &placement, &cancel)
        .await
    {
        Ok(pages) => println!("done: {} pages", pages.len()),
        Err(e) => {
            if let Some(index) = e.failed_index() {
                eprintln!("stopped at page {index} ({})", e.error_code());
            }
            return Err(e.into());
        }
    }

    Ok(())
}
