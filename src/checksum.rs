use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Streams `reader` through SHA-256 and returns the lowercase hex digest.
pub fn sha256_hex<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
