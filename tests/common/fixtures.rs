//! Viewer payload fixtures and a mock MangaOne backend

use mangaone_dl::cipher::{self, CipherMaterial, CipherMode};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 64 hex characters
pub const KEY_HEX: &str = "4f1c2b3a5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708";
/// 32 hex characters, not a substring of `KEY_HEX`
pub const IV_HEX: &str = "a0b1c2d3e4f5061728394a5b6c7d8e9f";

/// Title used by the fixture chapter
pub const TITLE_ID: &str = "2852";
/// Chapter used by the fixture chapter
pub const CHAPTER_ID: &str = "321769";

/// Cipher material matching `KEY_HEX`/`IV_HEX`
pub fn material() -> CipherMaterial {
    CipherMaterial::from_hex(KEY_HEX, IV_HEX).unwrap()
}

/// Fake image bytes for page `index`
pub fn page_plaintext(index: usize) -> Vec<u8> {
    let mut bytes = b"RIFF\0\0\0\0WEBPVP8 ".to_vec();
    bytes.extend(format!("page-{index}").into_bytes());
    bytes
}

/// Path on the mock server under which a page is served
pub fn page_route(chapter_id: &str, index: usize) -> String {
    format!("/s/manga_page_low/{chapter_id}/{index}.webp")
}

/// JSON-ish viewer payload listing `page_urls` plus the key and IV
///
/// Mirrors the real response loosely: URLs are quoted, escaped slashes are
/// absent, and the secrets sit in their own fields after the pages.
pub fn viewer_payload(page_urls: &[String], key_hex: Option<&str>, iv_hex: Option<&str>) -> String {
    let pages: Vec<String> = page_urls
        .iter()
        .map(|u| format!(r#"{{"image_url":"{u}","type":"image"}}"#))
        .collect();
    let mut body = format!(r#"{{"status":"ok","pages":[{}]"#, pages.join(","));
    if let Some(key) = key_hex {
        body.push_str(&format!(r#","encryption_key":"{key}""#));
    }
    if let Some(iv) = iv_hex {
        body.push_str(&format!(r#","iv":"{iv}""#));
    }
    body.push('}');
    body
}

/// Mount `count` encrypted pages for `chapter_id`, each expected exactly once
///
/// Returns the page URLs in order.
pub async fn mount_pages(server: &MockServer, chapter_id: &str, count: usize) -> Vec<String> {
    let material = material();
    let mut urls = Vec::with_capacity(count);
    for index in 1..=count {
        let route = page_route(chapter_id, index);
        let body = cipher::encrypt(CipherMode::Cbc, &material, &page_plaintext(index)).unwrap();
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
        urls.push(format!("{}{}", server.uri(), route));
    }
    urls
}

/// Mount the viewer endpoint returning `body` for the fixture chapter
pub async fn mount_viewer(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/api/client"))
        .and(query_param("rq", "viewer_v2"))
        .and(query_param("chapter_id", CHAPTER_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
