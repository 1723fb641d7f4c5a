//! Single HTTP exchange with a provider, reduced to a [`DownstreamOutcome`].

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::outcome::DownstreamOutcome;

/// Issue one GET and classify the answer. Never retries.
pub(crate) async fn get(http: &reqwest::Client, url: Url) -> DownstreamOutcome<String> {
    debug!("GET {}", url);

    let response = match http.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("GET {} failed before a response: {}", url, e);
            return DownstreamOutcome::TransportError(e.to_string());
        }
    };

    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => DownstreamOutcome::classify(status, body),
        Err(e) => DownstreamOutcome::TransportError(e.to_string()),
    }
}

/// Decode a successful JSON body; a body that does not fit is `Malformed`.
pub(crate) fn decode<T: DeserializeOwned>(body: String) -> DownstreamOutcome<T> {
    match serde_json::from_str(&body) {
        Ok(value) => DownstreamOutcome::Success(value),
        Err(e) => DownstreamOutcome::Malformed(e.to_string()),
    }
}
