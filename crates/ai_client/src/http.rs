use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

/// Longest slice of an error body kept in the error message.
const ERROR_BODY_CHARS: usize = 200;

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Sends `body` as JSON and decodes the JSON answer.
///
/// A non-success status becomes an error carrying the start of the response
/// body, since both backends explain refusals there.
pub(crate) fn post_json<B, R>(request: RequestBuilder, endpoint: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .with_context(|| format!("POST {endpoint} failed"))?;
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().unwrap_or_default();
        bail!("POST {endpoint} returned {status}: {}", excerpt(&detail));
    }
    response
        .json()
        .with_context(|| format!("Failed to parse JSON response from {endpoint}"))
}

fn excerpt(body: &str) -> String {
    body.trim().chars().take(ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_is_trimmed_and_bounded() {
        assert_eq!(excerpt("  quota exceeded \n"), "quota exceeded");
        let long = "가".repeat(500);
        assert_eq!(excerpt(&long).chars().count(), ERROR_BODY_CHARS);
    }
}
