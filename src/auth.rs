use anyhow::Context as _;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Token exchange response from `POST /auth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub refresh_expires_in: u64,
}

/// Identity derived from a token payload. Display-only trust: claims are
/// read without signature verification and must never substitute for the
/// backend's own authorization checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub username: String,
    pub roles: Vec<String>,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == "admin")
    }
}

pub fn token_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/api/auth/token")
}

/// Exchanges credentials for a token via the auth gateway. Single attempt,
/// no retry. A 401 maps to the credentials message the login screen shows;
/// any other failure carries the status.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<TokenResponse> {
    let endpoint = token_endpoint(base_url);
    let body = serde_json::json!({
        "username": username,
        "password": password,
    });

    let response = client
        .post(&endpoint)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        anyhow::bail!("username or password incorrect");
    }
    if !status.is_success() {
        anyhow::bail!("login failed ({status})");
    }

    response.json().await.context("parse token response")
}

/// Decodes the payload segment of a JWT without verifying its signature
/// and derives the display identity from the known claim paths:
/// `preferred_username` (falling back to `sub`) and `realm_access.roles`.
pub fn decode_claims(token: &str) -> anyhow::Result<UserIdentity> {
    let mut segments = token.split('.');
    let payload = segments
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .context("token has no payload segment")?;

    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .context("decode token payload")?;
    let claims: serde_json::Value =
        serde_json::from_slice(&raw).context("parse token payload json")?;

    let username = claims
        .get("preferred_username")
        .and_then(|v| v.as_str())
        .or_else(|| claims.get("sub").and_then(|v| v.as_str()))
        .context("token payload has neither `preferred_username` nor `sub`")?
        .to_string();

    let roles = claims
        .pointer("/realm_access/roles")
        .and_then(|v| v.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(UserIdentity { username, roles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn unsigned_token(claims: serde_json::Value) -> String {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(br#"{"alg":"none"}"#);
        let payload = engine.encode(claims.to_string());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn derives_username_and_roles() {
        let token = unsigned_token(serde_json::json!({
            "preferred_username": "alice",
            "realm_access": { "roles": ["admin", "user"] },
        }));
        let identity = decode_claims(&token).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.roles, vec!["admin", "user"]);
        assert!(identity.is_admin());
    }

    #[test]
    fn falls_back_to_sub_when_preferred_username_missing() {
        let token = unsigned_token(serde_json::json!({ "sub": "u-123" }));
        let identity = decode_claims(&token).unwrap();
        assert_eq!(identity.username, "u-123");
        assert!(identity.roles.is_empty());
        assert!(!identity.is_admin());
    }

    #[test]
    fn missing_roles_path_means_no_roles() {
        let token = unsigned_token(serde_json::json!({
            "preferred_username": "bob",
            "realm_access": {},
        }));
        let identity = decode_claims(&token).unwrap();
        assert!(identity.roles.is_empty());
    }

    #[test]
    fn garbage_token_is_an_error() {
        assert!(decode_claims("not-a-jwt").is_err());
        assert!(decode_claims("a.@@@.c").is_err());
    }

    #[test]
    fn token_endpoint_normalizes_trailing_slash() {
        assert_eq!(
            token_endpoint("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/api/auth/token"
        );
    }
}
