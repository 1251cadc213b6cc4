use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_NAMES: [&str; 2] = ["x-csrftoken", "x-csrf-token"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CsrfError {
    #[error("The CSRF token is missing.")]
    Missing,
    #[error("The CSRF token is invalid.")]
    Invalid,
    #[error("The CSRF token has expired.")]
    Expired,
}

/// Issues and checks stateless anti-forgery tokens of the form
/// `<nonce>.<issued_at>.<signature>`.
#[derive(Clone)]
pub struct CsrfGuard {
    secret: Vec<u8>,
    time_limit_secs: i64,
}

impl CsrfGuard {
    pub fn new(secret: impl Into<Vec<u8>>, time_limit_secs: i64) -> Self {
        Self { secret: secret.into(), time_limit_secs }
    }

    pub fn generate(&self) -> String {
        self.generate_at(now_sec())
    }

    fn generate_at(&self, issued_at: i64) -> String {
        let nonce = URL_SAFE_NO_PAD.encode(random_bytes::<16>());
        let payload = format!("{nonce}.{issued_at}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    pub fn verify(&self, token: Option<&str>) -> Result<(), CsrfError> {
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(CsrfError::Missing);
        }

        let (payload, signature) = token.rsplit_once('.').ok_or(CsrfError::Invalid)?;
        let (_, issued_at) = payload.split_once('.').ok_or(CsrfError::Invalid)?;
        let issued_at: i64 = issued_at.parse().map_err(|_| CsrfError::Invalid)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| CsrfError::Invalid)?;

        self.mac(payload).verify_slice(&signature).map_err(|_| CsrfError::Invalid)?;

        if now_sec().saturating_sub(issued_at) > self.time_limit_secs {
            return Err(CsrfError::Expired);
        }
        Ok(())
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC takes keys of any length");
        mac.update(payload.as_bytes());
        mac
    }
}

pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(b"test-secret".to_vec(), 3600)
    }

    #[test]
    fn tokens_are_fresh_and_verifiable() {
        let guard = guard();
        let a = guard.generate();
        let b = guard.generate();

        assert!(!a.is_empty());
        assert_ne!(a, b);
        assert_eq!(guard.verify(Some(a.as_str())), Ok(()));
        assert_eq!(guard.verify(Some(b.as_str())), Ok(()));
    }

    #[test]
    fn missing_token() {
        assert_eq!(guard().verify(None), Err(CsrfError::Missing));
        assert_eq!(guard().verify(Some("  ")), Err(CsrfError::Missing));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_invalid() {
        let token = guard().generate();
        let (payload, _) = token.rsplit_once('.').unwrap();
        let forged = format!("{payload}.AAAA");

        assert_eq!(guard().verify(Some(forged.as_str())), Err(CsrfError::Invalid));
        assert_eq!(guard().verify(Some("garbage")), Err(CsrfError::Invalid));

        let other = CsrfGuard::new(b"another-secret".to_vec(), 3600);
        assert_eq!(other.verify(Some(token.as_str())), Err(CsrfError::Invalid));
    }

    #[test]
    fn old_tokens_expire() {
        let guard = guard();
        let token = guard.generate_at(now_sec() - 7200);
        assert_eq!(guard.verify(Some(token.as_str())), Err(CsrfError::Expired));
    }
}
