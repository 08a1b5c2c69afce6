//! Scryfall bulk data download

use crate::types::*;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const BULK_DATA_ENDPOINT: &str = "https://api.scryfall.com/bulk-data/default-cards";

/// Headers sent with every request to the card data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpIdentity {
    pub user_agent: String,
    pub accept: String,
}

impl Default for HttpIdentity {
    fn default() -> Self {
        Self {
            user_agent: concat!("deckpdf/", env!("CARGO_PKG_VERSION")).to_string(),
            accept: "application/json;q=0.9,*/*;q=0.8".to_string(),
        }
    }
}

impl HttpIdentity {
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(ACCEPT, header_value(&self.accept)?);
        Ok(headers)
    }

    pub fn client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .default_headers(self.header_map()?)
            .build()?)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| DeckError::CardData(format!("invalid header value `{value}`: {e}")))
}

#[derive(Debug, Deserialize)]
struct BulkDataInfo {
    download_uri: String,
}

/// Download the current default-cards dump into `dir`.
///
/// Returns the existing file when the latest dump was already downloaded.
pub async fn fetch_bulk_json(dir: impl AsRef<Path>, identity: &HttpIdentity) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let client = identity.client()?;

    let info_bytes = client
        .get(BULK_DATA_ENDPOINT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let info: BulkDataInfo = serde_json::from_slice(&info_bytes)?;

    let file_name = info
        .download_uri
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            DeckError::CardData(format!("unexpected download uri `{}`", info.download_uri))
        })?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    if tokio::fs::try_exists(&path).await? {
        log::info!("Bulk data {} is up to date", path.display());
        return Ok(path);
    }

    log::info!("Downloading bulk data from {}", info.download_uri);
    let bytes = client
        .get(&info.download_uri)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    tokio::fs::write(&path, &bytes).await?;
    log::info!("Saved {} bytes to {}", bytes.len(), path.display());

    Ok(path)
}
