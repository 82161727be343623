//! Hash functions used for address derivation.

use ripemd::Ripemd160;
use sha3::{Digest, Sha3_256};

/// Computes SHA3-256 of the input data.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes RIPEMD-160 of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// RIPEMD-160 of SHA3-256, the public key hash embedded in addresses.
pub fn public_key_hash(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha3_256(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn sha3_256_empty_vector() {
        assert_eq!(
            sha3_256(b""),
            hex!("a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a")
        );
    }

    #[test]
    fn ripemd160_empty_vector() {
        assert_eq!(ripemd160(b""), hex!("9c1185a5c5e9fc54612808977ee8f548b2258d31"));
    }
}
