//! Random identifiers from the operating system CSPRNG

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Size in bytes of staging ids and placement paths (128 bits)
pub const PATH_ID_SIZE: usize = 16;

/// Size in bytes of opaque tokens (256 bits)
pub const TOKEN_SIZE: usize = 32;

/// Generate `size` random bytes and encode them as unpadded base64url
pub fn random_id(size: usize) -> Result<String, rand::Error> {
    let mut buf = vec![0u8; size];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(URL_SAFE_NO_PAD.encode(&buf))
}
