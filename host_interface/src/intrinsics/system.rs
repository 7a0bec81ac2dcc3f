//!
//! Time, protocol features, sender identity, guest assertions and exit.
//!

use super::{def, ContextAware, Injected, I32, I64};
use crate::registry::{IntrinsicTable, Trap, WasmValue};
use chain_ee::config::MAX_ASSERT_MESSAGE;
use chain_ee::errors::system_error_code;
use chain_ee::ChainError;

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "current_time",
        ContextAware,
        false,
        &[],
        Some(I64),
        |env, _| {
            Ok(Some(WasmValue::I64(
                env.context.current_time().micros() as i64
            )))
        },
    ));

    table.add(def(
        "publication_time",
        ContextAware,
        false,
        &[],
        Some(I64),
        |env, _| {
            Ok(Some(WasmValue::I64(
                env.context.publication_time().micros() as i64,
            )))
        },
    ));

    table.add(def(
        "is_feature_activated",
        ContextAware,
        false,
        &[I32],
        Some(I32),
        |env, args| {
            let digest = env.read_digest(args.u32(0))?;
            let active = env.context.controller().is_protocol_feature_activated(digest);
            Ok(Some(WasmValue::I32(active as i32)))
        },
    ));

    table.add(def(
        "get_sender",
        ContextAware,
        false,
        &[],
        Some(I64),
        |env, _| {
            Ok(Some(WasmValue::I64(
                env.context.get_sender().as_u64() as i64
            )))
        },
    ));

    // context-free system api: assertions terminate the action regardless
    // of the mode they run in

    table.add(def("abort", ContextAware, true, &[], None, |_, _| {
        Err(ChainError::AbortCalled.into())
    }));

    table.add(def(
        "eosio_assert",
        ContextAware,
        true,
        &[I32, I32],
        None,
        |env, args| {
            if args.i32(0) == 0 {
                let message = env.read_cstr(args.u32(1), MAX_ASSERT_MESSAGE)?;
                return Err(ChainError::AssertMessage(message).into());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "eosio_assert_message",
        ContextAware,
        true,
        &[I32, I32, I32],
        None,
        |env, args| {
            if args.i32(0) == 0 {
                let len = (args.u32(2) as usize).min(MAX_ASSERT_MESSAGE);
                let bytes = env.read_bytes(args.u32(1), len as u32)?;
                let message = String::from_utf8_lossy(&bytes).into_owned();
                return Err(ChainError::AssertMessage(message).into());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "eosio_assert_code",
        ContextAware,
        true,
        &[I32, I64],
        None,
        |_, args| {
            if args.i32(0) == 0 {
                let code = args.u64(1);
                if code >= system_error_code::GENERIC_SYSTEM_ERROR {
                    return Err(ChainError::RestrictedErrorCode {
                        substituted: system_error_code::CONTRACT_RESTRICTED_ERROR_CODE,
                    }
                    .into());
                }
                return Err(ChainError::AssertCode(code).into());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "eosio_exit",
        ContextAware,
        true,
        &[I32],
        None,
        |_, _| Err(Trap::Exit),
    ));

    // injected intrinsics

    table.add(def("checktime", Injected, false, &[], None, |env, _| {
        env.context.checktime()?;
        Ok(None)
    }));

    table.add(def(
        "call_depth_assert",
        Injected,
        false,
        &[],
        None,
        |_, _| {
            Err(ChainError::wasm_execution("Exceeded call depth maximum").into())
        },
    ));
}
