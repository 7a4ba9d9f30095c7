//! Retrieval of checktype catalog sources.

use tracing::debug;
use url::Url;

use basalt_core::{Error, Result};

/// Retrieves the raw bytes behind a catalog source reference.
///
/// `http` and `https` URLs are fetched over the network, scheme-less
/// references are read as filesystem paths and any other scheme is
/// rejected.
pub async fn fetch(source: &str) -> Result<Vec<u8>> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => http_get(url).await,
        Ok(url) => Err(Error::InvalidUrl {
            url: source.to_string(),
            reason: format!("unsupported scheme {:?}", url.scheme()),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            debug!("reading catalog from file {source}");
            Ok(std::fs::read(source)?)
        }
        Err(e) => Err(Error::InvalidUrl {
            url: source.to_string(),
            reason: e.to_string(),
        }),
    }
}

async fn http_get(url: Url) -> Result<Vec<u8>> {
    debug!("fetching catalog from {url}");
    let fetch_err = |reason: String| Error::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = reqwest::get(url.clone())
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("unexpected status {status}")));
    }
    let body = response.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    Ok(body.to_vec())
}
