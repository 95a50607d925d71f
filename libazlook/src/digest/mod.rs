//! Content digests for registry manifests.
//!
//! Wraps `oci_spec::image::Digest` so registry code gets `AzError`s and a
//! couple of display helpers.

use crate::error::{AzError, Result};
use oci_spec::image::Digest as OciDigest;
use std::fmt;
use std::str::FromStr;


/// A validated content digest such as `sha256:7173b8...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl Digest {
    /// Algorithm part, e.g. `sha256`.
    pub fn algorithm(&self) -> String {
        let rendered = self.0.to_string();
        rendered
            .split_once(':')
            .map(|(algorithm, _)| algorithm.to_string())
            .unwrap_or(rendered)
    }

    /// Encoded (hex) part.
    pub fn encoded(&self) -> &str {
        self.0.digest()
    }

    /// First 12 hex characters, the way `docker images` shows IDs.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::digest::Digest;
    ///
    /// let d: Digest = "sha256:7173b809ca12ec5dee4506cd86be934c4596dd234ee82c0662eac04a8c2c71dc"
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(d.short(), "7173b809ca12");
    /// ```
    pub fn short(&self) -> &str {
        let encoded = self.encoded();
        &encoded[..encoded.len().min(12)]
    }
}

impl FromStr for Digest {
    type Err = AzError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| {
            AzError::validation_with_source(format!("Invalid digest format '{}'", s), e)
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
