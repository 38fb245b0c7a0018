//! Hash and signature-verification adapters over ring

use ring::digest;
use ring::signature::{self, UnparsedPublicKey};

use crate::errors::RevocationError;

// Signature algorithm OIDs accepted for CRL and OCSP signatures
const OID_SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const OID_SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const OID_SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
const OID_ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const OID_ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const OID_ED25519: &str = "1.3.101.112";

/// Hash algorithm used when constructing OCSP CertIDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    Sha1,
    Sha256,
}

impl HashAlg {
    /// Digest `data`, returning the raw hash bytes
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let alg = match self {
            HashAlg::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            HashAlg::Sha256 => &digest::SHA256,
        };
        digest::digest(alg, data).as_ref().to_vec()
    }

    /// Dotted OID of the algorithm as used in AlgorithmIdentifier
    pub fn oid(&self) -> &'static str {
        match self {
            HashAlg::Sha1 => "1.3.14.3.2.26",
            HashAlg::Sha256 => "2.16.840.1.101.3.4.2.1",
        }
    }

    /// Map an AlgorithmIdentifier OID back to a known hash algorithm
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            "1.3.14.3.2.26" => Some(HashAlg::Sha1),
            "2.16.840.1.101.3.4.2.1" => Some(HashAlg::Sha256),
            _ => None,
        }
    }
}

/// Pure signature verification interface consumed by the CRL validator and
/// OCSP client. `public_key_bits` is the raw `subjectPublicKey` BIT STRING
/// contents of the signer, `sig_alg_oid` the dotted signatureAlgorithm OID.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        sig_alg_oid: &str,
        message: &[u8],
        sig: &[u8],
        public_key_bits: &[u8],
    ) -> Result<(), RevocationError>;
}

/// ring-backed verifier covering the RSA PKCS#1, ECDSA, and Ed25519
/// algorithms that appear on CRLs and OCSP responses in practice
#[derive(Debug, Default, Clone, Copy)]
pub struct RingVerifier;

impl RingVerifier {
    fn algorithm(oid: &str) -> Option<&'static dyn signature::VerificationAlgorithm> {
        match oid {
            OID_SHA1_WITH_RSA => Some(&signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY),
            OID_SHA256_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA256),
            OID_SHA384_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA384),
            OID_SHA512_WITH_RSA => Some(&signature::RSA_PKCS1_2048_8192_SHA512),
            OID_ECDSA_WITH_SHA256 => Some(&signature::ECDSA_P256_SHA256_ASN1),
            OID_ECDSA_WITH_SHA384 => Some(&signature::ECDSA_P384_SHA384_ASN1),
            OID_ED25519 => Some(&signature::ED25519),
            _ => None,
        }
    }
}

impl SignatureVerifier for RingVerifier {
    fn verify(
        &self,
        sig_alg_oid: &str,
        message: &[u8],
        sig: &[u8],
        public_key_bits: &[u8],
    ) -> Result<(), RevocationError> {
        let alg = Self::algorithm(sig_alg_oid).ok_or_else(|| {
            RevocationError::Protocol(format!("unsupported signature algorithm: {sig_alg_oid}"))
        })?;
        UnparsedPublicKey::new(alg, public_key_bits)
            .verify(message, sig)
            .map_err(|_| RevocationError::Protocol("signature verification failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_length() {
        assert_eq!(HashAlg::Sha256.digest(b"abc").len(), 32);
        assert_eq!(HashAlg::Sha1.digest(b"abc").len(), 20);
    }

    #[test]
    fn oid_round_trip() {
        for alg in [HashAlg::Sha1, HashAlg::Sha256] {
            assert_eq!(HashAlg::from_oid(alg.oid()), Some(alg));
        }
        assert_eq!(HashAlg::from_oid("1.2.3.4"), None);
    }

    #[test]
    fn unknown_signature_algorithm_rejected() {
        let err = RingVerifier
            .verify("1.2.3.4", b"msg", b"sig", b"key")
            .unwrap_err();
        assert!(matches!(err, RevocationError::Protocol(_)));
    }
}
