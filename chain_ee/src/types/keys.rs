//!
//! Packed public keys and recoverable signatures.
//!
//! Both travel on the wire as a one-byte curve discriminator followed by a
//! fixed payload: 33 bytes of compressed point for keys, 65 bytes of
//! `(recovery_byte, r, s)` for signatures. Types `0` (K1, secp256k1) and `1`
//! (R1, secp256r1) are the genesis key types; anything beyond the configured
//! supported count is rejected by the intrinsic layer with
//! `unactivated_key_type` / `unactivated_signature_type`.
//!

use crate::codec::{CodecError, Pack, Unpack};

pub const KEY_TYPE_K1: u8 = 0;
pub const KEY_TYPE_R1: u8 = 1;

pub const PUBLIC_KEY_DATA_SIZE: usize = 33;
pub const SIGNATURE_DATA_SIZE: usize = 65;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PublicKey {
    pub key_type: u8,
    pub data: [u8; PUBLIC_KEY_DATA_SIZE],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Signature {
    pub sig_type: u8,
    pub data: [u8; SIGNATURE_DATA_SIZE],
}

impl PublicKey {
    pub const fn packed_size() -> usize {
        1 + PUBLIC_KEY_DATA_SIZE
    }
}

impl Signature {
    /// Size of the length-variable trailing component. The two legacy curve
    /// types are entirely fixed-size; the subjective production-time length
    /// cap only applies to later types.
    pub fn variable_size(&self) -> usize {
        0
    }
}

impl Pack for PublicKey {
    fn pack_into(&self, out: &mut Vec<u8>) {
        out.push(self.key_type);
        out.extend_from_slice(&self.data);
    }
}

impl Unpack for PublicKey {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let key_type = u8::unpack_from(input)?;
        let data = <[u8; PUBLIC_KEY_DATA_SIZE]>::unpack_from(input)?;
        Ok(PublicKey { key_type, data })
    }
}

impl Pack for Signature {
    fn pack_into(&self, out: &mut Vec<u8>) {
        out.push(self.sig_type);
        out.extend_from_slice(&self.data);
    }
}

impl Unpack for Signature {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let sig_type = u8::unpack_from(input)?;
        let data = <[u8; SIGNATURE_DATA_SIZE]>::unpack_from(input)?;
        Ok(Signature { sig_type, data })
    }
}
