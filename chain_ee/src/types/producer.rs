//!
//! Producer schedule wire types.
//!
//! Two packed formats exist: format `0` carries the legacy
//! `Vec<ProducerKey>` and is up-converted to single-key authorities; format
//! `1` carries `Vec<ProducerAuthority>` directly. Anything else is rejected
//! by the privileged setter.
//!

use super::{AccountName, PublicKey};
use crate::codec::{CodecError, Pack, Unpack};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProducerKey {
    pub producer_name: AccountName,
    pub block_signing_key: PublicKey,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyWeight {
    pub key: PublicKey,
    pub weight: u16,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BlockSigningAuthority {
    V0 { threshold: u32, keys: Vec<KeyWeight> },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProducerAuthority {
    pub producer_name: AccountName,
    pub authority: BlockSigningAuthority,
}

impl ProducerKey {
    /// Legacy schedule entries become a weight-1, threshold-1 authority.
    pub fn into_authority(self) -> ProducerAuthority {
        ProducerAuthority {
            producer_name: self.producer_name,
            authority: BlockSigningAuthority::V0 {
                threshold: 1,
                keys: vec![KeyWeight {
                    key: self.block_signing_key,
                    weight: 1,
                }],
            },
        }
    }
}

impl Pack for ProducerKey {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.producer_name.pack_into(out);
        self.block_signing_key.pack_into(out);
    }
}

impl Unpack for ProducerKey {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ProducerKey {
            producer_name: AccountName::unpack_from(input)?,
            block_signing_key: PublicKey::unpack_from(input)?,
        })
    }
}

impl Pack for KeyWeight {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.key.pack_into(out);
        self.weight.pack_into(out);
    }
}

impl Unpack for KeyWeight {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(KeyWeight {
            key: PublicKey::unpack_from(input)?,
            weight: u16::unpack_from(input)?,
        })
    }
}

impl Pack for BlockSigningAuthority {
    fn pack_into(&self, out: &mut Vec<u8>) {
        match self {
            BlockSigningAuthority::V0 { threshold, keys } => {
                // variant tag, then fields in declaration order
                crate::codec::VarUint32(0).pack_into(out);
                threshold.pack_into(out);
                keys.pack_into(out);
            }
        }
    }
}

impl Unpack for BlockSigningAuthority {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let tag = crate::codec::VarUint32::unpack_from(input)?;
        match tag.0 {
            0 => Ok(BlockSigningAuthority::V0 {
                threshold: u32::unpack_from(input)?,
                keys: Vec::<KeyWeight>::unpack_from(input)?,
            }),
            _ => Err(CodecError::InvalidDiscriminant(
                "unknown block signing authority variant",
            )),
        }
    }
}

impl Pack for ProducerAuthority {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.producer_name.pack_into(out);
        self.authority.pack_into(out);
    }
}

impl Unpack for ProducerAuthority {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ProducerAuthority {
            producer_name: AccountName::unpack_from(input)?,
            authority: BlockSigningAuthority::unpack_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::name_from_str;

    fn key(fill: u8) -> PublicKey {
        let mut data = [fill; 33];
        data[0] = 0x02;
        PublicKey { key_type: 0, data }
    }

    #[test]
    fn schedule_roundtrips_both_formats() {
        let legacy = vec![ProducerKey {
            producer_name: name_from_str("prodone"),
            block_signing_key: key(7),
        }];
        let packed = legacy.packed();
        assert_eq!(Vec::<ProducerKey>::unpack_all(&packed).unwrap(), legacy);

        let authorities: Vec<ProducerAuthority> =
            legacy.into_iter().map(ProducerKey::into_authority).collect();
        let packed = authorities.packed();
        assert_eq!(
            Vec::<ProducerAuthority>::unpack_all(&packed).unwrap(),
            authorities
        );
    }

    #[test]
    fn legacy_up_conversion_is_single_key() {
        let authority = ProducerKey {
            producer_name: name_from_str("prodone"),
            block_signing_key: key(9),
        }
        .into_authority();
        let BlockSigningAuthority::V0 { threshold, keys } = authority.authority;
        assert_eq!(threshold, 1);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].weight, 1);
    }

    #[test]
    fn unknown_authority_variant_fails() {
        let mut packed = Vec::new();
        name_from_str("prodone").pack_into(&mut packed);
        crate::codec::VarUint32(9).pack_into(&mut packed);
        assert!(ProducerAuthority::unpack_all(&packed).is_err());
    }
}
