//! Unverified JWT claim decoding.

use crate::Result;

use base64::Engine;
use serde_json::Value;
use spadesk_api::{Claims, Role, SpaError};

const SUBJECT_KEYS: &[&str] = &["id", "sub", "userId"];
const TENANT_KEYS: &[&str] = &["spaId", "tenantId", "tenant_id"];

/// Decode the claims of a bearer token without checking its signature.
///
/// The header must parse as a JWT header and the payload must be a JSON object
/// carrying a `role` and a subject (`id`, `sub` or `userId`). A role outside the
/// canonical set decodes as [`Role::Customer`] and is logged.
pub fn decode_claims(token: &str) -> Result<Claims> {
    jsonwebtoken::decode_header(token)
        .map_err(|e| SpaError::Decode(format!("failed to decode header: {e}")))?;

    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| SpaError::Decode("token has no payload segment".to_string()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SpaError::Decode(format!("invalid payload encoding: {e}")))?;
    let payload: Value = serde_json::from_slice(&bytes)
        .map_err(|e| SpaError::Decode(format!("invalid payload json: {e}")))?;

    if !payload.is_object() {
        return Err(SpaError::Decode("payload is not an object".to_string()));
    }

    let raw_role = payload
        .get("role")
        .and_then(Value::as_str)
        .ok_or_else(|| SpaError::Decode("missing role".to_string()))?;
    let (role, mismatch) = Role::from_claim(raw_role);
    if let Some(e) = mismatch {
        tracing::warn!(error = %e, "token role is not canonical, treating as Customer");
    }

    let subject_id = first_claim(&payload, SUBJECT_KEYS)
        .ok_or_else(|| SpaError::Decode("missing subject".to_string()))?;

    Ok(Claims {
        role,
        subject_id,
        tenant_id: first_claim(&payload, TENANT_KEYS),
        expires_at: payload.get("exp").and_then(Value::as_i64),
    })
}

// Ids arrive as strings or numbers depending on the backend.
fn first_claim(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
