//! Webhook verification handshake parameters.

use serde::Deserialize;

/// Query of the verification request: `?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// The challenge to echo when this is a subscribe request carrying the expected token.
    /// With no configured token every request is rejected.
    pub fn accepted_challenge(&self, expected_token: Option<&str>) -> Option<&str> {
        let expected = expected_token?;
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected) {
            return None;
        }
        Some(self.challenge.as_deref().unwrap_or(""))
    }
}
