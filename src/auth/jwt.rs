use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{KitError, Result};

/// User info carried in the JWT payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtUserInfo {
    #[serde(rename = "openId", default)]
    pub open_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Strips the auth scheme (`Bearer <token>`); a bare token is returned as is
pub fn bearer_token(authorization: &str) -> &str {
    let authorization = authorization.trim();
    match authorization.split_once(' ') {
        Some((_, token)) => token.trim(),
        None => authorization,
    }
}

/// Decodes the payload segment of a JWT without checking the signature
pub fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| KitError::token_invalid("token has no payload segment"))?;

    let bytes = decode_segment(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extracts `openId` from an `Authorization` header value
///
/// Returns an empty string when the header is empty or the payload cannot be decoded.
pub fn user_id_from_jwt(authorization: &str) -> String {
    if authorization.is_empty() {
        return String::new();
    }

    match decode_payload::<JwtUserInfo>(bearer_token(authorization)) {
        Ok(info) => info.open_id,
        Err(err) => {
            error!(func_name = "user_id_from_jwt", error = %err, "failed to decode jwt payload");
            String::new()
        }
    }
}

/// Verifies an HS256 token and returns its user info
///
/// `exp` is checked only when present.
pub fn verify_user_info(token: &str, secret: &str) -> Result<JwtUserInfo> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;

    let data = decode::<JwtUserInfo>(
        bearer_token(token),
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

// JWT segments are URL-safe without padding; some issuers emit standard padded base64.
fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    match URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(STANDARD.decode(pad(segment))?),
    }
}

fn pad(segment: &str) -> String {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    padded
}
