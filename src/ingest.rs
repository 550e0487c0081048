//! HTTP ingestion of the detection file and the sidebar logo.
//!
//! Google Drive serves large files behind a "can't scan for viruses" page;
//! the token it sets in a `download_warning*` cookie has to be echoed back
//! as `confirm` to get the actual bytes.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::data::error::LoadError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc";

/// Content types a tabular download may come back with.
const TABULAR_CONTENT_TYPES: [&str; 3] =
    ["text/csv", "application/vnd.ms-excel", "application/octet-stream"];

fn client(timeout: Duration) -> Result<Client, LoadError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(timeout)
        .build()?)
}

/// The `id` query parameter of a Drive share link.
pub fn extract_file_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

pub fn is_tabular_content_type(content_type: &str) -> bool {
    TABULAR_CONTENT_TYPES
        .iter()
        .any(|t| content_type.contains(t))
}

fn confirm_token(resp: &Response) -> Option<String> {
    resp.cookies()
        .find(|c| c.name().starts_with("download_warning"))
        .map(|c| c.value().to_string())
}

/// Download a CSV file from a Drive link, going through the confirmation
/// step when the host asks for it.
pub fn download_text(url: &str, timeout: Duration) -> Result<String, LoadError> {
    let file_id = extract_file_id(url).ok_or_else(|| LoadError::InvalidLocator(url.to_string()))?;
    let client = client(timeout)?;

    log::info!("Downloading detections from {url}");
    let mut resp = client.get(url).send()?;

    if let Some(token) = confirm_token(&resp) {
        log::debug!("Drive asked for download confirmation, retrying with token");
        resp = client
            .get(DRIVE_DOWNLOAD_URL)
            .query(&[
                ("id", file_id.as_str()),
                ("export", "download"),
                ("confirm", token.as_str()),
            ])
            .send()?;
    }

    let resp = resp.error_for_status()?;
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_tabular_content_type(&content_type) {
        return Err(LoadError::ContentType(content_type));
    }

    let text = resp.text()?;
    log::debug!("Downloaded {} bytes ({content_type})", text.len());
    Ok(text)
}

/// Fetch raw bytes (used for the logo image).
pub fn download_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>, LoadError> {
    let resp = client(timeout)?.get(url).send()?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file_id() {
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?export=download&id=1YlThY76iiE6"),
            Some("1YlThY76iiE6".to_string())
        );
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?id=abc&export=download"),
            Some("abc".to_string())
        );
        assert_eq!(extract_file_id("https://drive.google.com/uc?export=download"), None);
        assert_eq!(extract_file_id("https://drive.google.com/uc?id="), None);
        assert_eq!(extract_file_id("not a url"), None);
    }

    #[test]
    fn test_content_type_check() {
        assert!(is_tabular_content_type("text/csv; charset=utf-8"));
        assert!(is_tabular_content_type("application/octet-stream"));
        assert!(is_tabular_content_type("application/vnd.ms-excel"));
        assert!(!is_tabular_content_type("text/html; charset=utf-8"));
        assert!(!is_tabular_content_type(""));
    }

    #[test]
    fn test_missing_file_id_fails_before_network() {
        let err = download_text("https://drive.google.com/uc?export=download", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidLocator(_)));
    }
}
