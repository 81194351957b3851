//! Author/committer signature lines as they appear in commit payloads:
//! `<role> <name> <email> <timestamp> <timezone>`.

use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::GitError;

/// Which header line the signature came from.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SignatureType {
    Author,
    Committer,
}

impl Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SignatureType::Author => write!(f, "author"),
            SignatureType::Committer => write!(f, "committer"),
        }
    }
}

impl SignatureType {
    pub fn from_data(data: &[u8]) -> Result<SignatureType, GitError> {
        match data {
            b"author" => Ok(SignatureType::Author),
            b"committer" => Ok(SignatureType::Committer),
            _ => Err(GitError::InvalidSignature(
                String::from_utf8_lossy(data).to_string(),
            )),
        }
    }
}

/// One parsed signature line.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub signature_type: SignatureType,
    pub name: String,
    pub email: String,
    pub timestamp: usize,
    pub timezone: String,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} <{}> {} {}",
            self.signature_type, self.name, self.email, self.timestamp, self.timezone
        )
    }
}

impl Signature {
    /// Parses a full signature line, e.g.
    /// `author Eli Ma <eli@patchwork.dev> 1678101573 +0800`.
    pub fn from_data(data: Vec<u8>) -> Result<Signature, GitError> {
        let invalid = || GitError::InvalidSignature(String::from_utf8_lossy(&data).to_string());

        let role_end = data.find_byte(b' ').ok_or_else(invalid)?;
        let signature_type = SignatureType::from_data(&data[..role_end])?;
        let rest = &data[role_end + 1..];

        let email_open = rest.find(b" <").ok_or_else(invalid)?;
        let email_close = rest.find(b"> ").ok_or_else(invalid)?;
        if email_close < email_open {
            return Err(invalid());
        }

        let name = rest[..email_open].to_str().map_err(|_| invalid())?;
        let email = rest[email_open + 2..email_close]
            .to_str()
            .map_err(|_| invalid())?;

        let tail = rest[email_close + 2..].to_str().map_err(|_| invalid())?;
        let (timestamp, timezone) = tail.split_once(' ').ok_or_else(invalid)?;
        let timestamp: usize = timestamp.parse().map_err(|_| invalid())?;

        Ok(Signature {
            signature_type,
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            timezone: timezone.to_string(),
        })
    }

    pub fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(self.to_string().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use crate::internal::object::signature::{Signature, SignatureType};

    #[test]
    fn test_parse_author_line() {
        let line = b"author Jane Doe <jane@example.com> 1678101573 +0800".to_vec();
        let sig = Signature::from_data(line.clone()).unwrap();
        assert_eq!(sig.signature_type, SignatureType::Author);
        assert_eq!(sig.name, "Jane Doe");
        assert_eq!(sig.email, "jane@example.com");
        assert_eq!(sig.timestamp, 1678101573);
        assert_eq!(sig.timezone, "+0800");
        assert_eq!(sig.to_data().unwrap(), line);
    }

    #[test]
    fn test_parse_committer_line() {
        let line = b"committer bot <bot@ci> 1700000000 +0000".to_vec();
        let sig = Signature::from_data(line).unwrap();
        assert_eq!(sig.signature_type, SignatureType::Committer);
        assert_eq!(sig.name, "bot");
    }

    #[test]
    fn test_rejects_unknown_role() {
        let line = b"tagger Jane <jane@example.com> 1 +0000".to_vec();
        assert!(Signature::from_data(line).is_err());
    }

    #[test]
    fn test_rejects_missing_email_brackets() {
        let line = b"author Jane jane@example.com 1 +0000".to_vec();
        assert!(Signature::from_data(line).is_err());
    }
}
