use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{
    consts::{RTMP_HANDSHAKE_SIZE, SHA256_DIGEST_SIZE},
    errors::{HandshakeError, HandshakeResult},
};

/// Two layouts for the digest inside a C1/S1 block:
///
/// schema 1:
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | time (4) | version (4) | key (764 bytes) | digest (764) |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// schema 2:
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | time (4) | version (4) | digest (764) | key (764 bytes) |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The digest sub-block starts with a 4-byte offset into its 728 payload
/// bytes; the HMAC-SHA256 digest covers the whole 1536-byte block minus
/// the 32 digest bytes themselves.
#[derive(Debug, Clone, Copy)]
enum DigestSchema {
    Schema1,
    Schema2,
}

fn digest_offset(block: &[u8; RTMP_HANDSHAKE_SIZE], schema: DigestSchema) -> usize {
    match schema {
        DigestSchema::Schema1 => {
            let base: usize = block[772..776].iter().map(|&b| b as usize).sum();
            base % 728 + 776
        }
        DigestSchema::Schema2 => {
            let base: usize = block[8..12].iter().map(|&b| b as usize).sum();
            base % 728 + 12
        }
    }
}

pub fn make_digest(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut hmac = Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts any key size");
    hmac.update(message);
    hmac.finalize().into_bytes().to_vec()
}

fn digest_at(block: &[u8; RTMP_HANDSHAKE_SIZE], key: &[u8], index: usize) -> Vec<u8> {
    let message = [&block[..index], &block[index + SHA256_DIGEST_SIZE..]].concat();
    make_digest(key, &message)
}

/// Computes and embeds a schema 1 digest into the block.
pub fn imprint_digest(block: &mut [u8; RTMP_HANDSHAKE_SIZE], key: &[u8]) {
    let index = digest_offset(block, DigestSchema::Schema1);
    let digest = digest_at(block, key, index);
    block[index..index + SHA256_DIGEST_SIZE].copy_from_slice(&digest);
}

fn validate_with_schema(
    block: &[u8; RTMP_HANDSHAKE_SIZE],
    key: &[u8],
    schema: DigestSchema,
) -> bool {
    let index = digest_offset(block, schema);
    let expected = digest_at(block, key, index);
    block[index..index + SHA256_DIGEST_SIZE] == expected[..]
}

/// Checks the block against both digest schemas.
pub fn validate_digest(block: &[u8; RTMP_HANDSHAKE_SIZE], key: &[u8]) -> HandshakeResult<()> {
    if validate_with_schema(block, key, DigestSchema::Schema1)
        || validate_with_schema(block, key, DigestSchema::Schema2)
    {
        return Ok(());
    }
    Err(HandshakeError::DigestMismatch)
}

#[cfg(test)]
mod tests {
    use super::{imprint_digest, validate_digest};
    use crate::handshake::consts::{
        RTMP_CLIENT_KEY, RTMP_CLIENT_KEY_FIRST_HALF, RTMP_HANDSHAKE_SIZE,
    };

    #[test]
    fn imprinted_digest_validates() {
        let key = &RTMP_CLIENT_KEY[..RTMP_CLIENT_KEY_FIRST_HALF];
        let mut block = [0u8; RTMP_HANDSHAKE_SIZE];
        utils::random::random_fill(&mut block[8..]);
        imprint_digest(&mut block, key);
        validate_digest(&block, key).unwrap();
    }

    #[test]
    fn tampering_breaks_the_digest() {
        let key = &RTMP_CLIENT_KEY[..RTMP_CLIENT_KEY_FIRST_HALF];
        let mut block = [0u8; RTMP_HANDSHAKE_SIZE];
        utils::random::random_fill(&mut block[8..]);
        imprint_digest(&mut block, key);
        block[100] ^= 0xFF;
        assert!(validate_digest(&block, key).is_err());
    }

    #[test]
    fn plain_random_block_has_no_digest() {
        let key = &RTMP_CLIENT_KEY[..RTMP_CLIENT_KEY_FIRST_HALF];
        let mut block = [0u8; RTMP_HANDSHAKE_SIZE];
        utils::random::random_fill(&mut block[8..]);
        assert!(validate_digest(&block, key).is_err());
    }
}
