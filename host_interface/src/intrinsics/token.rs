//!
//! Standard token operations and the system-token list.
//!
//! The balance-mutating intrinsics operate on the receiver's own token;
//! setting the system-token list additionally requires the privileged flag
//! and the system account's authorization.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_ee::codec::{Pack, Unpack};
use chain_ee::config::SYSTEM_ACCOUNT;
use chain_ee::ChainError;
use state_store::SystemToken;

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "get_token_symbol",
        ContextAware,
        false,
        &[I64],
        Some(I64),
        |env, args| {
            let symbol = token_system::get_token_symbol(env.context.chain_db(), args.name(0))?;
            Ok(Some(WasmValue::I64(symbol.0 as i64)))
        },
    ));

    table.add(def(
        "get_token_total_supply",
        ContextAware,
        false,
        &[I64],
        Some(I64),
        |env, args| {
            let supply =
                token_system::get_token_total_supply(env.context.chain_db(), args.name(0))?;
            Ok(Some(WasmValue::I64(supply)))
        },
    ));

    table.add(def(
        "get_token_balance",
        ContextAware,
        false,
        &[I64, I64],
        Some(I64),
        |env, args| {
            let balance = token_system::get_token_balance(
                env.context.chain_db(),
                args.name(0),
                args.name(1),
            );
            Ok(Some(WasmValue::I64(balance)))
        },
    ));

    table.add(def(
        "issue_token",
        ContextAware,
        false,
        &[I64, I64],
        None,
        |env, args| {
            env.context.issue_token(args.name(0), args.i64(1))?;
            Ok(None)
        },
    ));

    table.add(def(
        "transfer_token",
        ContextAware,
        false,
        &[I64, I64, I64],
        None,
        |env, args| {
            env.context
                .transfer_token(args.name(0), args.name(1), args.i64(2))?;
            Ok(None)
        },
    ));

    table.add(def(
        "retire_token",
        ContextAware,
        false,
        &[I64],
        None,
        |env, args| {
            env.context.retire_token(args.i64(0))?;
            Ok(None)
        },
    ));

    // system token api

    table.add(def(
        "get_system_token_count",
        ContextAware,
        false,
        &[],
        Some(I32),
        |env, _| {
            let count = token_system::get_system_token_count(env.context.chain_db());
            Ok(Some(WasmValue::I32(count as i32)))
        },
    ));

    table.add(def(
        "get_system_token_list_packed",
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let tokens = env.context.chain_db().system_token_list().tokens.clone();
            let packed = tokens.packed();
            let written = env.copy_packed(args.u32(0), args.u32(1), &packed)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "set_system_token_list_packed",
        ContextAware,
        false,
        &[I32, I32],
        Some(I64),
        |env, args| {
            // privileged receiver plus system-account authorization
            if !env.context.is_privileged() {
                return Err(ChainError::UnaccessibleApi(
                    "receiver does not have permission to call this API",
                )
                .into());
            }
            env.context.require_authorization(SYSTEM_ACCOUNT)?;

            let data = env.read_bytes(args.u32(0), args.u32(1))?;
            let tokens = Vec::<SystemToken>::unpack_all(&data).map_err(ChainError::from)?;
            let version =
                token_system::set_system_token_list(env.context.chain_db_mut(), tokens)?;
            Ok(Some(WasmValue::I64(version)))
        },
    ));
}
