//! Byte-span location inside signed DER structures
//!
//! CertificateList, Certificate, and BasicOCSPResponse share the shape
//! `SEQUENCE { tbs, signatureAlgorithm, signature }`. Signature checks must
//! run over the original tbs bytes, never a re-encoding, so the span of the
//! first inner element is located by walking the raw headers.

use std::ops::Range;

use der::{Encode, Reader};

use crate::errors::RevocationError;

/// Locate the byte span of the to-be-signed element (the first element
/// inside the outer SEQUENCE) in a signed DER structure
pub(crate) fn tbs_span(der_bytes: &[u8]) -> Result<Range<usize>, RevocationError> {
    let mut reader = der::SliceReader::new(der_bytes)
        .map_err(|e| RevocationError::Parse(format!("DER reader: {e}")))?;

    let outer = reader
        .peek_header()
        .map_err(|e| RevocationError::Parse(format!("outer header: {e}")))?;
    if outer.tag != der::Tag::Sequence {
        return Err(RevocationError::Parse(
            "signed structure is not a SEQUENCE".to_string(),
        ));
    }
    let outer_header_len = header_len(&outer)?;
    reader
        .read_slice(to_der_length(outer_header_len)?)
        .map_err(|e| RevocationError::Parse(format!("outer header: {e}")))?;

    let tbs = reader
        .peek_header()
        .map_err(|e| RevocationError::Parse(format!("tbs header: {e}")))?;
    let tbs_header_len = header_len(&tbs)?;
    let tbs_content_len: usize = usize::try_from(tbs.length)
        .map_err(|e| RevocationError::Parse(format!("tbs length: {e}")))?;

    let start = outer_header_len;
    let end = start + tbs_header_len + tbs_content_len;
    if end > der_bytes.len() {
        return Err(RevocationError::Parse(
            "tbs span exceeds buffer".to_string(),
        ));
    }
    Ok(start..end)
}

fn header_len(header: &der::Header) -> Result<usize, RevocationError> {
    let len = header
        .encoded_len()
        .map_err(|e| RevocationError::Parse(format!("header length: {e}")))?;
    usize::try_from(len).map_err(|e| RevocationError::Parse(format!("header length: {e}")))
}

fn to_der_length(len: usize) -> Result<der::Length, RevocationError> {
    der::Length::try_from(len).map_err(|e| RevocationError::Parse(format!("length: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_first_inner_element() {
        // SEQUENCE { SEQUENCE { INTEGER 1 }, NULL }
        let der_bytes = [0x30, 0x07, 0x30, 0x03, 0x02, 0x01, 0x01, 0x05, 0x00];
        let span = tbs_span(&der_bytes).unwrap();
        assert_eq!(span, 2..7);
        assert_eq!(&der_bytes[span], &[0x30, 0x03, 0x02, 0x01, 0x01]);
    }

    #[test]
    fn rejects_non_sequence() {
        let der_bytes = [0x02, 0x01, 0x01];
        assert!(tbs_span(&der_bytes).is_err());
    }

    #[test]
    fn rejects_truncated_tbs() {
        // Outer claims more content than present
        let der_bytes = [0x30, 0x07, 0x30, 0x03, 0x02];
        assert!(tbs_span(&der_bytes).is_err());
    }
}
