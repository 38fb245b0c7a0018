//! HTTP transport for CRL downloads and OCSP responder queries

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::USER_AGENT;
use crate::errors::RevocationError;

/// Maximum accepted CRL download size
const MAX_CRL_SIZE: usize = 50 * 1024 * 1024; // 50MB

/// Shared HTTP context: timeouts and TLS settings are immutable after
/// construction, the inner client is cheaply cloneable
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    crl_timeout: Duration,
    ocsp_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(
        connect_timeout: Duration,
        ocsp_timeout: Duration,
        crl_timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            crl_timeout,
            ocsp_timeout,
        }
    }

    /// Download a CRL with a GET request. The caller sniffs PEM vs DER.
    pub async fn fetch_crl(&self, crl_url: &str) -> Result<Vec<u8>, RevocationError> {
        let url = Url::parse(crl_url)
            .map_err(|e| RevocationError::Transport(format!("invalid CRL URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .timeout(self.crl_timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error("CRL download", &e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RevocationError::NotFound(crl_url.to_string()));
        }
        if !response.status().is_success() {
            return Err(RevocationError::Transport(format!(
                "CRL server returned status {}",
                response.status()
            )));
        }

        let mut body = Vec::new();
        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error("CRL download", &e))?
        {
            if body.len() + chunk.len() > MAX_CRL_SIZE {
                return Err(RevocationError::Transport(format!(
                    "CRL response too large (>{}MB)",
                    MAX_CRL_SIZE / (1024 * 1024)
                )));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(RevocationError::Transport("empty CRL response".to_string()));
        }
        Ok(body)
    }

    /// POST a DER-encoded OCSP request and return the raw response body
    pub async fn post_ocsp(
        &self,
        responder_url: &str,
        request_der: Vec<u8>,
    ) -> Result<Vec<u8>, RevocationError> {
        let url = Url::parse(responder_url)
            .map_err(|e| RevocationError::Transport(format!("invalid OCSP URL: {e}")))?;

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/ocsp-request")
            .header("Accept", "application/ocsp-response")
            .header("Connection", "close")
            .body(request_der)
            .timeout(self.ocsp_timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error("OCSP query", &e))?;

        if !response.status().is_success() {
            return Err(RevocationError::Transport(format!(
                "OCSP responder returned status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error("OCSP query", &e))?;
        if body.is_empty() {
            return Err(RevocationError::Transport(
                "empty OCSP response".to_string(),
            ));
        }
        Ok(body.to_vec())
    }
}

fn map_reqwest_error(context: &str, e: &reqwest::Error) -> RevocationError {
    if e.is_timeout() {
        RevocationError::Timeout(format!("{context} timed out: {e}"))
    } else {
        RevocationError::Transport(format!("{context} failed: {e}"))
    }
}
