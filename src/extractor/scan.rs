//! Payload scanning: page locators plus the inline key and IV
//!
//! The viewer response is not parsed structurally. Locators are recovered with a
//! pattern anchored on the chapter id, and the secrets are the first hex runs of
//! the right width. The key is searched first and its exact match is cut out of
//! the text before the IV search, because any 64-character key also contains
//! several 32-character runs that would otherwise be mistaken for the IV.

use crate::cipher::CipherMaterial;
use crate::config::{CHAPTER_ID_PLACEHOLDER, ScanConfig};
use crate::error::{ExtractionError, Result};
use crate::types::ResourceLocator;
use regex::Regex;

/// Compiled scan patterns
#[derive(Clone, Debug)]
pub struct PayloadScanner {
    locator_template: String,
    key: Regex,
    iv: Regex,
}

impl PayloadScanner {
    /// Compile the key and IV patterns; the locator pattern is compiled per chapter
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            locator_template: config.locator_pattern.clone(),
            key: compile(&config.key_pattern)?,
            iv: compile(&config.iv_pattern)?,
        })
    }

    /// Recover page locators and cipher material from a payload
    pub fn scan(
        &self,
        text: &str,
        chapter_id: &str,
    ) -> Result<(Vec<ResourceLocator>, CipherMaterial)> {
        let pages = self.find_locators(text, chapter_id)?;
        let (key_hex, iv_hex) = self.find_secrets(text)?;
        let cipher = CipherMaterial::from_hex(&key_hex, &iv_hex)?;
        Ok((pages, cipher))
    }

    /// All non-overlapping locator matches in order of appearance
    pub fn find_locators(&self, text: &str, chapter_id: &str) -> Result<Vec<ResourceLocator>> {
        let pattern = self
            .locator_template
            .replace(CHAPTER_ID_PLACEHOLDER, &regex::escape(chapter_id));
        let re = compile(&pattern)?;
        Ok(re.find_iter(text).map(|m| m.as_str().to_string()).collect())
    }

    /// Key hex, then IV hex from the text with the key's span removed
    pub fn find_secrets(&self, text: &str) -> std::result::Result<(String, String), ExtractionError> {
        let key = self.key.find(text).ok_or(ExtractionError::KeyNotFound)?;
        let key_hex = key.as_str().to_string();

        let mut remaining = String::with_capacity(text.len());
        remaining.push_str(&text[..key.start()]);
        remaining.push_str(&text[key.end()..]);

        let iv_hex = self
            .iv
            .find(&remaining)
            .ok_or(ExtractionError::IvNotFound)?
            .as_str()
            .to_string();

        Ok((key_hex, iv_hex))
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, ExtractionError> {
    Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
