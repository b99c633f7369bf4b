use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_MAX_AGE_SECS: i64 = 3600;
const SESSION_IDENTITY: &str = "admin";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session secret key must not be empty")]
    EmptySecret,
    #[error("admin token must not be empty")]
    EmptyToken,
}

/// Issues and checks `admin.<issued_at>.<signature>` session tokens.
///
/// The signature is HMAC-SHA256 over `admin.<issued_at>`, base64url encoded
/// without padding. Nothing is stored server side.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    pub fn new(secret_key: &str) -> Result<Self, SessionError> {
        if secret_key.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        let mac =
            HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|_| SessionError::EmptySecret)?;
        Ok(Self { mac })
    }

    pub fn create_session(&self) -> String {
        self.create_session_at(OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn create_session_at(&self, issued_at: i64) -> String {
        let payload = format!("{SESSION_IDENTITY}.{issued_at}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload));
        format!("{payload}.{signature}")
    }

    pub fn verify_session(&self, token: &str) -> bool {
        self.verify_session_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Valid iff well formed, correctly signed, and issued within the last
    /// [`SESSION_MAX_AGE_SECS`] seconds (not in the future).
    pub fn verify_session_at(&self, token: &str, now: i64) -> bool {
        let Some((payload, signature)) = token.rsplit_once('.') else {
            return false;
        };
        let Some((identity, issued_at)) = payload.split_once('.') else {
            return false;
        };
        if identity != SESSION_IDENTITY {
            return false;
        }
        let Ok(issued_at) = issued_at.parse::<i64>() else {
            return false;
        };
        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        now.checked_sub(issued_at)
            .is_some_and(|age| (0..=SESSION_MAX_AGE_SECS).contains(&age))
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Admin credentials: the shared admin token and the session signer.
#[derive(Clone)]
pub struct AdminAuth {
    admin_token: Arc<str>,
    signer: SessionSigner,
}

impl AdminAuth {
    pub fn new(admin_token: &str, secret_key: &str) -> Result<Self, SessionError> {
        if admin_token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self {
            admin_token: Arc::from(admin_token),
            signer: SessionSigner::new(secret_key)?,
        })
    }

    /// Constant-time comparison against the configured admin token.
    pub fn check_token(&self, candidate: &str) -> bool {
        candidate
            .as_bytes()
            .ct_eq(self.admin_token.as_bytes())
            .into()
    }

    pub fn create_session(&self) -> String {
        self.signer.create_session()
    }

    pub fn verify_session(&self, token: &str) -> bool {
        self.signer.verify_session(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_767_225_600;

    fn signer() -> SessionSigner {
        SessionSigner::new("test-secret").expect("signer")
    }

    #[test]
    fn fresh_token_verifies() {
        let signer = signer();
        let token = signer.create_session_at(NOW);
        assert!(token.starts_with(&format!("admin.{NOW}.")));
        assert!(signer.verify_session_at(&token, NOW));
        assert!(signer.verify_session_at(&token, NOW + SESSION_MAX_AGE_SECS));
    }

    #[test]
    fn expired_or_future_tokens_fail() {
        let signer = signer();
        let token = signer.create_session_at(NOW);
        assert!(!signer.verify_session_at(&token, NOW + SESSION_MAX_AGE_SECS + 1));
        assert!(!signer.verify_session_at(&token, NOW - 1));
    }

    #[test]
    fn tampered_tokens_fail() {
        let signer = signer();
        let token = signer.create_session_at(NOW);
        let (_, signature) = token.rsplit_once('.').expect("signature");

        let forged_time = format!("admin.{}.{signature}", NOW + 10);
        assert!(!signer.verify_session_at(&forged_time, NOW + 10));

        let forged_identity = format!("root.{NOW}.{signature}");
        assert!(!signer.verify_session_at(&forged_identity, NOW));

        for garbage in ["", "admin", "admin.abc.def", "admin.1.!!!", "a.b.c.d"] {
            assert!(!signer.verify_session_at(garbage, NOW), "{garbage}");
        }
    }

    #[test]
    fn tokens_do_not_cross_secrets() {
        let token = signer().create_session_at(NOW);
        let other = SessionSigner::new("another-secret").expect("signer");
        assert!(!other.verify_session_at(&token, NOW));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(matches!(SessionSigner::new(""), Err(SessionError::EmptySecret)));
        assert!(matches!(AdminAuth::new("", "key"), Err(SessionError::EmptyToken)));
    }

    #[test]
    fn admin_token_comparison() {
        let auth = AdminAuth::new("letmein", "key").expect("auth");
        assert!(auth.check_token("letmein"));
        assert!(!auth.check_token("letmein!"));
        assert!(!auth.check_token("letmeout"));
        assert!(!auth.check_token(""));
    }

    #[test]
    fn admin_auth_round_trips_live_sessions() {
        let auth = AdminAuth::new("letmein", "key").expect("auth");
        let token = auth.create_session();
        assert!(auth.verify_session(&token));
        assert!(!auth.verify_session(&format!("{token}x")));
    }
}
