use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::AppState;

/// JWT payload used for authentication.
///
/// Only the subject is encoded. There is no `exp`, `iss`, or `aud`, so an
/// issued token stays valid as long as the signing secret does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
}

/// HS256 signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let secret = state.config.jwt.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, username: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: username.to_owned(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject = username, "jwt signed");
        Ok(token)
    }

    /// Decode and check the signature. Bad signature, wrong algorithm, and
    /// malformed tokens all fail here; the caller treats every failure the
    /// same way.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens are issued without `exp`; the default validation would
        // reject them outright.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_returns_subject() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        parts[1].push_str("xx");
        let tampered = parts.join(".");
        assert!(keys.verify(&tampered).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify("not-a-token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[tokio::test]
    async fn verify_rejects_token_signed_with_other_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
        };
        let token = other.sign("alice").expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[tokio::test]
    async fn tokens_carry_no_expiry() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");
        let payload = token.split('.').nth(1).expect("payload segment");
        let bytes = base64_url_decode(payload);
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("payload json");
        assert!(value.get("exp").is_none());
        assert_eq!(value.get("sub").and_then(|v| v.as_str()), Some("alice"));
    }

    fn base64_url_decode(s: &str) -> Vec<u8> {
        // Minimal base64url decoder for inspecting a token payload in tests.
        const TABLE: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        let mut out = Vec::new();
        let mut buf = 0u32;
        let mut bits = 0u32;
        for &c in s.as_bytes() {
            let Some(v) = TABLE.iter().position(|&t| t == c) else {
                continue;
            };
            buf = (buf << 6) | v as u32;
            bits += 6;
            if bits >= 8 {
                bits -= 8;
                out.push((buf >> bits) as u8);
            }
        }
        out
    }
}
