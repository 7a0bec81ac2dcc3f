//!
//! Authorization-set queries. Key-level satisfiability belongs to the
//! authorization manager outside this core; these checks resolve against
//! the provided permission levels and the account registry.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_ee::codec::Unpack;
use chain_ee::types::{PermissionLevel, PublicKey, Transaction};
use chain_ee::ChainError;

fn unpack_levels(data: &[u8]) -> Result<Vec<PermissionLevel>, ChainError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    Vec::<PermissionLevel>::unpack_all(data).map_err(ChainError::from)
}

fn unpack_keys(data: &[u8]) -> Result<Vec<PublicKey>, ChainError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    Vec::<PublicKey>::unpack_all(data).map_err(ChainError::from)
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "check_transaction_authorization",
        ContextAware,
        false,
        &[I32, I32, I32, I32, I32, I32],
        Some(I32),
        |env, args| {
            let trx_data = env.read_bytes(args.u32(0), args.u32(1))?;
            let keys_data = env.read_bytes(args.u32(2), args.u32(3))?;
            let perms_data = env.read_bytes(args.u32(4), args.u32(5))?;

            let trx = match Transaction::unpack_all(&trx_data) {
                Ok(trx) => trx,
                Err(_) => return Ok(Some(WasmValue::I32(0))),
            };
            let _provided_keys = unpack_keys(&keys_data)?;
            let provided_permissions = unpack_levels(&perms_data)?;

            env.context.checktime()?;
            let satisfied = trx.actions.iter().all(|act| {
                act.authorization
                    .iter()
                    .all(|level| provided_permissions.contains(level))
            });
            Ok(Some(WasmValue::I32(satisfied as i32)))
        },
    ));

    table.add(def(
        "check_permission_authorization",
        ContextAware,
        false,
        &[I64, I64, I32, I32, I32, I32, I64],
        Some(I32),
        |env, args| {
            let delay_us = args.u64(6);
            if delay_us > i64::MAX as u64 {
                return Err(ChainError::ActionValidate("provided delay is too large".into()).into());
            }
            let _provided_keys = unpack_keys(&env.read_bytes(args.u32(2), args.u32(3))?)?;
            let provided_permissions = unpack_levels(&env.read_bytes(args.u32(4), args.u32(5))?)?;

            env.context.checktime()?;
            let wanted = PermissionLevel {
                actor: args.name(0),
                permission: args.name(1),
            };
            let satisfied = provided_permissions.contains(&wanted);
            Ok(Some(WasmValue::I32(satisfied as i32)))
        },
    ));

    table.add(def(
        "get_permission_last_used",
        ContextAware,
        false,
        &[I64, I64],
        Some(I64),
        |env, args| {
            // permission usage tracking lives with the authorization
            // manager; accounts fall back to their creation time here
            let account = args.name(0);
            let meta = env.context.chain_db().account(account).ok_or_else(|| {
                ChainError::ActionValidate(format!("account '{account}' does not exist"))
            })?;
            Ok(Some(WasmValue::I64(meta.creation_time.micros() as i64)))
        },
    ));

    table.add(def(
        "get_account_creation_time",
        ContextAware,
        false,
        &[I64],
        Some(I64),
        |env, args| {
            let account = args.name(0);
            let meta = env.context.chain_db().account(account).ok_or_else(|| {
                ChainError::ActionValidate(format!("account '{account}' does not exist"))
            })?;
            Ok(Some(WasmValue::I64(meta.creation_time.micros() as i64)))
        },
    ));
}
