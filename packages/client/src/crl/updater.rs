//! CRL refresh orchestration: fetch, parse, monotonicity check, install

use std::sync::Arc;
use std::time::Duration;

use super::cache::CrlCache;
use super::parser::parse_crl;
use super::Crl;
use crate::cert::ParsedCertificate;
use crate::errors::RevocationError;
use crate::fetch::HttpFetcher;

/// Drives refresh of cached CRLs from distribution point URLs
pub struct CrlUpdater {
    cache: Arc<CrlCache>,
    fetcher: HttpFetcher,
    /// Window before expiry in which `update` performs network I/O
    refresh_threshold: Duration,
}

impl CrlUpdater {
    pub fn new(cache: Arc<CrlCache>, fetcher: HttpFetcher, refresh_threshold: Duration) -> Self {
        Self {
            cache,
            fetcher,
            refresh_threshold,
        }
    }

    pub fn cache(&self) -> &Arc<CrlCache> {
        &self.cache
    }

    /// Refresh the CRL for the certificate's issuer from the certificate's
    /// distribution points and return it. Falls back to a previously cached
    /// CRL when every distribution point fails.
    pub async fn update_from_certificate(
        &self,
        cert: &ParsedCertificate,
        silent: bool,
    ) -> Result<Option<Arc<Crl>>, RevocationError> {
        if cert.crl_urls.is_empty() {
            tracing::warn!(
                "no CRL distribution points in certificate {}, skipping CRL refresh",
                cert.subject
            );
            return Ok(None);
        }

        let mut last_err: Option<RevocationError> = None;
        for crl_url in &cert.crl_urls {
            match self.update(&cert.issuer_der, crl_url, true).await {
                Ok(true) => return Ok(self.cache.get(&cert.issuer_der)),
                Ok(false) => {
                    last_err.get_or_insert_with(|| {
                        RevocationError::Transport(format!("CRL update failed for {crl_url}"))
                    });
                }
                Err(e) => {
                    tracing::warn!("CRL update failed for {crl_url}: {e}");
                    last_err = Some(e);
                }
            }
        }

        // Every distribution point failed; a stale cached CRL beats nothing
        if let Some(cached) = self.cache.get(&cert.issuer_der) {
            tracing::warn!(
                "all CRL distribution points failed for {}, using cached CRL",
                cert.issuer
            );
            return Ok(Some(cached));
        }

        let err = last_err
            .unwrap_or_else(|| RevocationError::Transport("CRL update failed".to_string()));
        if silent {
            tracing::warn!("CRL refresh failed for {}: {err}", cert.issuer);
            Ok(None)
        } else {
            Err(err)
        }
    }

    /// Ensure the cache holds a current CRL for `issuer_der`, fetching from
    /// `url` when the cached one is absent or about to expire. Returns true
    /// when a usable CRL is in the cache afterwards.
    pub async fn update(
        &self,
        issuer_der: &[u8],
        url: &str,
        silent: bool,
    ) -> Result<bool, RevocationError> {
        if !self.cache.expiring_soon(issuer_der, self.refresh_threshold) {
            tracing::debug!("cached CRL still current, skipping fetch of {url}");
            return Ok(true);
        }

        let result = self.fetch_and_install(issuer_der, url).await;
        match result {
            Ok(installed) => Ok(installed),
            Err(e) if silent => {
                tracing::warn!("CRL update from {url} failed: {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_and_install(
        &self,
        issuer_der: &[u8],
        url: &str,
    ) -> Result<bool, RevocationError> {
        let bytes = self.fetcher.fetch_crl(url).await?;
        let crl = parse_crl(&bytes)?;
        self.install(issuer_der, crl)
    }

    /// Issuer check, monotonicity check, and cache installation for an
    /// already-parsed CRL
    pub fn install(&self, issuer_der: &[u8], crl: Crl) -> Result<bool, RevocationError> {
        if crl.issuer_der != issuer_der {
            tracing::warn!(
                "fetched CRL issued by {} does not match the expected issuer",
                crl.issuer
            );
            return Err(RevocationError::Protocol(
                "CRL issuer does not match expected issuer".to_string(),
            ));
        }

        if let Some(cached) = self.cache.get(issuer_der) {
            if crl.crl_number < cached.crl_number {
                tracing::warn!(
                    "CRL number went backward for {} ({} -> {}), rejecting possible rollback",
                    crl.issuer,
                    cached.crl_number,
                    crl.crl_number
                );
                return Err(RevocationError::Protocol(format!(
                    "CRL number regression: cached {} fetched {}",
                    cached.crl_number, crl.crl_number
                )));
            }
            if crl.crl_number == cached.crl_number && crl.this_update <= cached.this_update {
                tracing::debug!("fetched CRL is not newer than cached, keeping cached");
                return Ok(true);
            }
        }

        self.cache.put(crl);
        Ok(true)
    }

    /// Drop every cache entry past its authority window
    pub fn cleanup_expired(&self) -> usize {
        self.cache.remove_expired()
    }
}
