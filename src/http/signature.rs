//! Telephony provider request signatures.
//!
//! The provider signs each webhook with
//! `base64(HMAC-SHA1(auth_token, url + key1 + value1 + key2 + value2 ...))`
//! where the form parameters are sorted by key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Verifies inbound webhook signatures against the account auth token.
#[derive(Clone)]
pub struct SignatureVerifier {
    auth_token: String,
    public_url: String,
}

impl SignatureVerifier {
    /// Create a verifier for requests the provider posts to `public_url`.
    pub fn new(auth_token: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            public_url: public_url.into(),
        }
    }

    /// Compute the expected signature for a set of form parameters.
    pub fn sign(&self, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut data = self.public_url.clone();
        for (key, value) in sorted {
            data.push_str(key);
            data.push_str(value);
        }

        // HMAC accepts keys of any length.
        let mut mac = match HmacSha1::new_from_slice(self.auth_token.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(data.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Constant-time comparison of `provided` with the expected signature.
    pub fn verify(&self, provided: &str, params: &[(String, String)]) -> bool {
        let expected = self.sign(params);
        if expected.is_empty() {
            return false;
        }
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("public_url", &self.public_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
