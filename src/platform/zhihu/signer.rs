//! Request signing
//!
//! Every API call carries `x-zse-96`, derived from the request path and the
//! `d_c0` fingerprint cookie, plus an optional static `x-zst-81` token.

use crate::platform::zhihu::constants::{FINGERPRINT_COOKIE, ZSE_93};
use crate::session::SessionSnapshot;
use crate::{HarvestError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};

/// Signature headers for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub x_zse_96: String,
    /// Empty when no token is configured; the client then omits the header
    pub x_zst_81: String,
}

/// Computes signature headers
#[derive(Debug, Clone, Default)]
pub struct Signer {
    zst_81: String,
}

impl Signer {
    pub fn new(zst_81: impl Into<String>) -> Self {
        Self {
            zst_81: zst_81.into(),
        }
    }

    /// Signs a request
    ///
    /// # Arguments
    ///
    /// * `path` - Full request path including the encoded query string
    /// * `session` - Cookie state the fingerprint is read from
    ///
    /// # Returns
    ///
    /// * `Ok(SignedHeaders)` - Deterministic for identical inputs
    /// * `Err(HarvestError::Signing)` - `d_c0` is missing from the cookies
    pub fn sign(&self, path: &str, session: &SessionSnapshot) -> Result<SignedHeaders> {
        let d_c0 = session
            .cookie(FINGERPRINT_COOKIE)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                HarvestError::Signing(format!("{} not found in cookies", FINGERPRINT_COOKIE))
            })?;

        let source = format!("{}+{}+{}", ZSE_93, path, d_c0);
        let digest = hex::encode(Md5::digest(source.as_bytes()));

        Ok(SignedHeaders {
            x_zse_96: format!("2.0_{}", BASE64.encode(digest)),
            x_zst_81: self.zst_81.clone(),
        })
    }
}
