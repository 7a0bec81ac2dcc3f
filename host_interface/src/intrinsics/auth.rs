//!
//! Authorization checks and notification scheduling.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "require_auth",
        ContextAware,
        false,
        &[I64],
        None,
        |env, args| {
            env.context.require_authorization(args.name(0))?;
            Ok(None)
        },
    ));

    table.add(def(
        "require_auth2",
        ContextAware,
        false,
        &[I64, I64],
        None,
        |env, args| {
            env.context
                .require_authorization2(args.name(0), args.name(1))?;
            Ok(None)
        },
    ));

    table.add(def(
        "has_auth",
        ContextAware,
        false,
        &[I64],
        Some(I32),
        |env, args| {
            Ok(Some(WasmValue::I32(
                env.context.has_authorization(args.name(0)) as i32,
            )))
        },
    ));

    table.add(def(
        "require_recipient",
        ContextAware,
        false,
        &[I64],
        None,
        |env, args| {
            env.context.require_recipient(args.name(0));
            Ok(None)
        },
    ));

    table.add(def(
        "is_account",
        ContextAware,
        false,
        &[I64],
        Some(I32),
        |env, args| {
            Ok(Some(WasmValue::I32(
                env.context.is_account(args.name(0)) as i32
            )))
        },
    ));
}
