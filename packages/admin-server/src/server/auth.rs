//! Administrator role gate
//!
//! Requests authenticate with HTTP Basic credentials checked against the
//! configured accounts. The gate runs as axum middleware in front of the
//! management routes:
//!
//! - no or unknown credentials: `401` with a `WWW-Authenticate` challenge
//! - a known account without the `Admin` role: `403`

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::Account;
use crate::constants::{ADMIN_ROLE, AUTH_REALM};
use crate::server::http_error::{HttpError, FORBIDDEN, UNAUTHORIZED};
use crate::server::AppState;

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Decode an `Authorization: Basic ...` header into `(username, password)`
pub fn parse_basic_credentials(value: &HeaderValue) -> Option<(String, String)> {
    let value = value.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

// Runtime depends only on the lengths, never on where the inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Look up the account matching `username` and `password`
pub fn authenticate(accounts: &[Account], username: &str, password: &str) -> Option<Principal> {
    accounts
        .iter()
        .find(|account| account.username == username)
        .filter(|account| constant_time_eq(account.password.as_bytes(), password.as_bytes()))
        .map(|account| Principal {
            username: account.username.clone(),
            roles: account.roles.clone(),
        })
}

fn challenge() -> Response {
    let mut response =
        HttpError::new("Authentication required", UNAUTHORIZED).into_response();
    let value = format!("Basic realm=\"{}\"", AUTH_REALM);
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

/// Middleware admitting only principals in the administrator role
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(parse_basic_credentials);

    let Some((username, password)) = credentials else {
        return challenge();
    };

    let Some(principal) = authenticate(&state.accounts, &username, &password) else {
        tracing::warn!(username = %username, "rejected sign-in attempt");
        return challenge();
    };

    if !principal.is_in_role(ADMIN_ROLE) {
        tracing::warn!(username = %principal.username, "missing administrator role");
        return HttpError::new("Administrator role required", FORBIDDEN).into_response();
    }

    tracing::debug!(username = %principal.username, "administrator admitted");
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user_pass: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(user_pass))).unwrap()
    }

    #[test]
    fn test_parse_basic_credentials() {
        assert_eq!(
            parse_basic_credentials(&basic("admin@example.com:p:w")),
            Some(("admin@example.com".to_string(), "p:w".to_string()))
        );
        assert_eq!(parse_basic_credentials(&basic("no-colon")), None);
        assert_eq!(
            parse_basic_credentials(&HeaderValue::from_static("Bearer abc")),
            None
        );
        assert_eq!(
            parse_basic_credentials(&HeaderValue::from_static("Basic !!!")),
            None
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret!"));
        assert!(!constant_time_eq(b"", b"x"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_authenticate() {
        let accounts = vec![
            Account::admin("admin", "secret"),
            Account {
                username: "guest".to_string(),
                password: "guest".to_string(),
                roles: vec![],
            },
        ];

        let principal = authenticate(&accounts, "admin", "secret").unwrap();
        assert!(principal.is_in_role(ADMIN_ROLE));

        let principal = authenticate(&accounts, "guest", "guest").unwrap();
        assert!(!principal.is_in_role(ADMIN_ROLE));

        assert!(authenticate(&accounts, "admin", "wrong").is_none());
        assert!(authenticate(&accounts, "admin", "secre").is_none());
        assert!(authenticate(&accounts, "admin", "").is_none());
        assert!(authenticate(&accounts, "nobody", "secret").is_none());
    }
}
