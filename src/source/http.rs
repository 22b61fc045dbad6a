//! JSON-over-HTTP fetch with a per-request timeout.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use super::FetchError;

/// GET `url` and decode the JSON body.
///
/// Any non-2xx status is an error; an empty but well-formed body is not.
pub async fn fetch_json<T>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
    timeout: Duration,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            FetchError::Timeout(timeout)
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    };

    let response = client
        .get(url)
        .query(query)
        .header(ACCEPT, "application/json")
        .timeout(timeout)
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    response.json::<T>().await.map_err(classify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;

    #[tokio::test]
    async fn test_fetch_invalid_host() {
        let client = reqwest::Client::new();
        let result: Result<Vec<Device>, _> =
            fetch_json(&client, "http://256.256.256.256/api/devices", &[], Duration::from_millis(100)).await;
        assert!(result.is_err());
    }
}
