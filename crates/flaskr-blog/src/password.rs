//! Salted password hashes.
//!
//! Stored format: `sha256$<salt hex>$<HMAC-SHA256(salt, password) hex>`.

use crate::BlogError;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

fn keyed_mac(salt: &[u8]) -> Hmac<Sha256> {
    Hmac::<Sha256>::new_from_slice(salt).expect("HMAC key length is valid")
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut mac = keyed_mac(&salt);
    mac.update(password.as_bytes());
    let digest = mac.finalize().into_bytes();

    format!("{}${}${}", SCHEME, hex::encode(salt), hex::encode(digest))
}

/// Checks `password` against a hash produced by [`hash_password`].
///
/// # Errors
///
/// Returns `BlogError::InvalidHash` if `stored` is not in the expected format.
pub fn verify_password(stored: &str, password: &str) -> Result<bool, BlogError> {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt_hex), Some(digest_hex)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(BlogError::InvalidHash);
    };
    if scheme != SCHEME {
        return Err(BlogError::InvalidHash);
    }

    let salt = hex::decode(salt_hex).map_err(|_| BlogError::InvalidHash)?;
    let expected = hex::decode(digest_hex).map_err(|_| BlogError::InvalidHash)?;

    let mut mac = keyed_mac(&salt);
    mac.update(password.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}
