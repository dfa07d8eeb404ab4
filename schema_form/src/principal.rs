/* Principal identifiers and their checksummed text form
 *
 * Text form: base32 (RFC 4648, lowercase, no padding) of the big-endian
 * CRC-32 of the bytes followed by the bytes, split into dash-separated
 * groups of five characters. */

use data_encoding::BASE32_NOPAD;
use std::fmt;
use thiserror::Error;

pub const MAX_PRINCIPAL_LEN: usize = 29;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Principal(Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalError {
    #[error("principal is longer than {MAX_PRINCIPAL_LEN} bytes")]
    TooLong,
    #[error("not a valid principal encoding")]
    InvalidEncoding,
    #[error("principal checksum does not match")]
    BadChecksum,
    #[error("principal text is not in canonical form (expected '{0}')")]
    NotCanonical(String),
}

impl Principal {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_PRINCIPAL_LEN {
            return Err(PrincipalError::TooLong);
        }
        Ok(Principal(bytes.to_vec()))
    }

    /* The empty principal */
    pub fn management() -> Self {
        Principal(Vec::new())
    }

    pub fn anonymous() -> Self {
        Principal(vec![0x04])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let decoded = BASE32_NOPAD
            .decode(compact.as_bytes())
            .map_err(|_| PrincipalError::InvalidEncoding)?;
        if decoded.len() < 4 {
            return Err(PrincipalError::InvalidEncoding);
        }

        let (checksum, bytes) = decoded.split_at(4);
        if checksum != crc32fast::hash(bytes).to_be_bytes() {
            return Err(PrincipalError::BadChecksum);
        }
        let principal = Principal::from_slice(bytes)?;

        let canonical = principal.to_text();
        if canonical != text.to_ascii_lowercase() {
            return Err(PrincipalError::NotCanonical(canonical));
        }
        Ok(principal)
    }

    pub fn to_text(&self) -> String {
        let mut raw = crc32fast::hash(&self.0).to_be_bytes().to_vec();
        raw.extend_from_slice(&self.0);
        let encoded = BASE32_NOPAD.encode(&raw).to_ascii_lowercase();

        let mut text = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
