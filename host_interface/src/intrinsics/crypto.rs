//!
//! Hashing and signature-recovery intrinsics.
//!
//! Hashing is incremental and yields to `checktime` between fixed-size
//! blocks so a large buffer cannot starve the deadline checker. Recovery
//! supports the two genesis curves: K1 (secp256k1) and R1 (secp256r1);
//! both pack to a one-byte type tag plus a 33-byte compressed point.
//!

use super::{def, ContextAware, I32};
use crate::registry::{HostEnv, IntrinsicTable, Trap, WasmValue};
use chain_ee::codec::{Pack, Unpack};
use chain_ee::config::HASHING_CHECKTIME_BLOCK_SIZE;
use chain_ee::types::{PublicKey, Signature, KEY_TYPE_K1, KEY_TYPE_R1};
use chain_ee::ChainError;
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Feeds guest memory into `digest` in checktime-bounded blocks.
fn encode<D: Digest>(
    env: &mut HostEnv<'_, '_, '_>,
    ptr: u32,
    len: u32,
    mut digest: D,
) -> Result<Vec<u8>, Trap> {
    // validate the whole range up front so chunk offsets cannot wrap
    env.slice(ptr, len)?;
    let mut offset = 0u32;
    let mut remaining = len;
    while remaining > HASHING_CHECKTIME_BLOCK_SIZE {
        let chunk = env.slice(ptr + offset, HASHING_CHECKTIME_BLOCK_SIZE)?;
        digest.update(chunk);
        offset += HASHING_CHECKTIME_BLOCK_SIZE;
        remaining -= HASHING_CHECKTIME_BLOCK_SIZE;
        env.context.checktime()?;
    }
    let chunk = env.slice(ptr + offset, remaining)?;
    digest.update(chunk);
    Ok(digest.finalize().to_vec())
}

fn assert_hash<D: Digest>(
    env: &mut HostEnv<'_, '_, '_>,
    ptr: u32,
    len: u32,
    expected_ptr: u32,
    digest: D,
) -> Result<(), Trap> {
    let size = <D as Digest>::output_size();
    let result = encode(env, ptr, len, digest)?;
    let expected = env.read_bytes(expected_ptr, size as u32)?;
    if result != expected {
        return Err(ChainError::CryptoApi("hash mismatch").into());
    }
    Ok(())
}

fn write_hash<D: Digest>(
    env: &mut HostEnv<'_, '_, '_>,
    ptr: u32,
    len: u32,
    out_ptr: u32,
    digest: D,
) -> Result<(), Trap> {
    let result = encode(env, ptr, len, digest)?;
    env.write_bytes(out_ptr, &result)?;
    Ok(())
}

fn unpack_signature(env: &HostEnv<'_, '_, '_>, ptr: u32, len: u32) -> Result<Signature, Trap> {
    let data = env.read_bytes(ptr, len)?;
    let signature = Signature::unpack_all(&data).map_err(ChainError::from)?;
    if signature.sig_type >= env.context.controller().num_supported_key_types {
        return Err(ChainError::UnactivatedSignatureType.into());
    }
    let controller = env.context.controller();
    if controller.producing_block
        && signature.variable_size() > controller.sig_variable_size_limit
    {
        return Err(ChainError::SigVariableSizeLimit.into());
    }
    Ok(signature)
}

///
/// Recovers the compressed public key from a 65-byte compact recoverable
/// signature over `digest`. The leading signature byte carries the
/// recovery id offset by 31, as the compressed-point convention demands.
///
fn recover(digest: &[u8; 32], signature: &Signature) -> Result<PublicKey, ChainError> {
    let recovery_byte = signature.data[0];
    if recovery_byte < 31 {
        return Err(ChainError::CryptoApi(
            "unable to reconstruct public key from signature",
        ));
    }
    let recovery_id = (recovery_byte - 31) & 0x3;
    let rs = &signature.data[1..65];

    match signature.sig_type {
        KEY_TYPE_K1 => {
            let sig = k256::ecdsa::Signature::from_slice(rs)
                .map_err(|_| ChainError::CryptoApi("malformed signature"))?;
            let rec = k256::ecdsa::RecoveryId::from_byte(recovery_id)
                .ok_or(ChainError::CryptoApi("invalid recovery id"))?;
            let key = k256::ecdsa::VerifyingKey::recover_from_prehash(digest, &sig, rec)
                .map_err(|_| ChainError::CryptoApi("unable to recover public key"))?;
            let point = key.to_encoded_point(true);
            let mut data = [0u8; 33];
            data.copy_from_slice(point.as_bytes());
            Ok(PublicKey {
                key_type: KEY_TYPE_K1,
                data,
            })
        }
        KEY_TYPE_R1 => {
            let sig = p256::ecdsa::Signature::from_slice(rs)
                .map_err(|_| ChainError::CryptoApi("malformed signature"))?;
            let rec = p256::ecdsa::RecoveryId::from_byte(recovery_id)
                .ok_or(ChainError::CryptoApi("invalid recovery id"))?;
            let key = p256::ecdsa::VerifyingKey::recover_from_prehash(digest, &sig, rec)
                .map_err(|_| ChainError::CryptoApi("unable to recover public key"))?;
            let point = key.to_encoded_point(true);
            let mut data = [0u8; 33];
            data.copy_from_slice(point.as_bytes());
            Ok(PublicKey {
                key_type: KEY_TYPE_R1,
                data,
            })
        }
        _ => Err(ChainError::UnactivatedSignatureType),
    }
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "assert_recover_key",
        ContextAware,
        true,
        &[I32, I32, I32, I32, I32],
        None,
        |env, args| {
            let digest = env.read_digest(args.u32(0))?;
            let signature = unpack_signature(env, args.u32(1), args.u32(2))?;
            let expected_data = env.read_bytes(args.u32(3), args.u32(4))?;
            let expected = PublicKey::unpack_all(&expected_data).map_err(ChainError::from)?;
            if expected.key_type >= env.context.controller().num_supported_key_types {
                return Err(ChainError::UnactivatedKeyType.into());
            }
            let recovered = recover(&digest, &signature)?;
            if recovered != expected {
                return Err(ChainError::CryptoApi(
                    "Error expected key different than recovered key",
                )
                .into());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "recover_key",
        ContextAware,
        true,
        &[I32, I32, I32, I32, I32],
        Some(I32),
        |env, args| {
            let digest = env.read_digest(args.u32(0))?;
            let signature = unpack_signature(env, args.u32(1), args.u32(2))?;
            let recovered = recover(&digest, &signature)?;
            let packed = recovered.packed();
            let publen = args.u32(4) as usize;
            if publen < packed.len() {
                return Err(ChainError::wasm_execution(
                    "destination buffer must at least be able to hold an ECC public key",
                )
                .into());
            }
            env.write_bytes(args.u32(3), &packed)?;
            Ok(Some(WasmValue::I32(packed.len() as i32)))
        },
    ));

    table.add(def(
        "assert_sha256",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            assert_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha256::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "assert_sha1",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            assert_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha1::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "assert_sha512",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            assert_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha512::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "assert_ripemd160",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            assert_hash(env, args.u32(0), args.u32(1), args.u32(2), Ripemd160::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "sha256",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            write_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha256::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "sha1",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            write_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha1::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "sha512",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            write_hash(env, args.u32(0), args.u32(1), args.u32(2), Sha512::new())?;
            Ok(None)
        },
    ));

    table.add(def(
        "ripemd160",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            write_hash(env, args.u32(0), args.u32(1), args.u32(2), Ripemd160::new())?;
            Ok(None)
        },
    ));
}
