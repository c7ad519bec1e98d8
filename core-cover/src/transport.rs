//! Moving cover bytes between the remote store and the codec.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::error::TransportError;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Fetch the raw bytes behind a cover image URL
///
/// Cover URLs are pre-signed CDN links, so no credentials are attached.
#[instrument(skip(http), fields(url = %url))]
pub async fn fetch_bytes(http: &dyn HttpClient, url: &str) -> Result<Bytes, TransportError> {
    let response = http.execute(HttpRequest::new(HttpMethod::Get, url)).await?;

    if !response.is_success() {
        warn!(status = response.status, "Cover fetch failed");
        return Err(TransportError::FetchFailed {
            url: url.to_string(),
            status: response.status,
        });
    }

    debug!(size = response.body.len(), "Fetched cover bytes");
    Ok(response.body)
}

/// Encode cover bytes as the plain base64 body the upload endpoint accepts
pub fn to_upload_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode cover bytes as a `data:image/jpeg;base64,` URL
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", STANDARD.encode(bytes))
}

/// Decode a base64 data URL (any image subtype) or a bare base64 body
pub fn from_data_url(data_url: &str) -> Result<Vec<u8>, TransportError> {
    let body = match data_url.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, body)| body)
            .unwrap_or(rest),
        None => data_url,
    };
    Ok(STANDARD.decode(body.trim())?)
}
