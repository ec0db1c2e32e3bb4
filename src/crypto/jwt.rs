use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;

/// The claims this client reads from an access token.
///
/// The token is otherwise opaque: the signature is never checked here,
/// that is the backend's job.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Decodes the payload segment of a JWT.
///
/// # Arguments
///
/// * `token` - The compact `header.payload.signature` token.
///
/// # Returns
///
/// The claims, or `None` when the token is not a decodable JWT with an `exp`.
pub fn decode_claims(token: &str) -> Option<AccessClaims> {
    let mut segments = token.trim().split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;

    let payload = payload.trim_end_matches('=');
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(payload))
        .ok()?;

    match sonic_rs::from_slice::<AccessClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Access token payload is not usable: {}", e);
            None
        }
    }
}

/// Returns the `exp` claim of an access token, if it decodes.
pub fn expiry(token: &str) -> Option<i64> {
    decode_claims(token).map(|c| c.exp)
}

/// Truncates a token for log output.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}

#[cfg(test)]
pub(crate) fn encode_unsigned(payload: &str) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let body = general_purpose::URL_SAFE_NO_PAD.encode(payload);
    format!("{header}.{body}.signature")
}
