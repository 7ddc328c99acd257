use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_256, Shake256};
use zeroize::Zeroizing;

/// Derives a 256 bit key from secret bytes under a domain separation tag.
pub fn sha3_key(domain: &[u8], secret: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha3_256::new();
    Digest::update(&mut hasher, domain);
    Digest::update(&mut hasher, secret);
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&hasher.finalize());
    key
}

/// Expands secret bytes into a keystream of `len` bytes using SHAKE256.
pub fn shake_keystream(domain: &[u8], secret: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut xof = Shake256::default();
    Update::update(&mut xof, domain);
    Update::update(&mut xof, secret);
    let mut reader = xof.finalize_xof();
    let mut stream = Zeroizing::new(vec![0u8; len]);
    reader.read(&mut stream);
    stream
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_depend_on_domain() {
        let a = sha3_key(b"one", b"secret");
        let b = sha3_key(b"two", b"secret");
        assert_ne!(*a, *b);
        assert_eq!(*a, *sha3_key(b"one", b"secret"));
    }

    #[test]
    fn keystream_prefixes_agree() {
        let short = shake_keystream(b"mask", b"secret", 16);
        let long = shake_keystream(b"mask", b"secret", 64);
        assert_eq!(short.len(), 16);
        assert_eq!(&long[..16], &short[..]);
        assert!(shake_keystream(b"mask", b"secret", 0).is_empty());
    }
}
