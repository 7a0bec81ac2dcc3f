//!
//! The contract console. Output funnels into the apply context's buffer;
//! floats print in scientific notation at the type's decimal precision and
//! the quad-precision printer goes through a double approximation.
//!

use super::{def, ContextAware, F32, F64, I32, I64};
use crate::registry::{HostEnv, IntrinsicTable};
use softfloat::F128;

fn console_enabled(env: &HostEnv<'_, '_, '_>) -> bool {
    env.context.controller().contracts_console
}

fn append(env: &mut HostEnv<'_, '_, '_>, text: &str) {
    env.context.console_append(text);
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "prints",
        ContextAware,
        true,
        &[I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let text = env.read_cstr(args.u32(0), usize::MAX)?;
                append(env, &text);
            }
            Ok(None)
        },
    ));

    table.add(def(
        "prints_l",
        ContextAware,
        true,
        &[I32, I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let bytes = env.read_bytes(args.u32(0), args.u32(1))?;
                let text = String::from_utf8_lossy(&bytes).into_owned();
                append(env, &text);
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printi",
        ContextAware,
        true,
        &[I64],
        None,
        |env, args| {
            if console_enabled(env) {
                append(env, &args.i64(0).to_string());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printui",
        ContextAware,
        true,
        &[I64],
        None,
        |env, args| {
            if console_enabled(env) {
                append(env, &args.u64(0).to_string());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printi128",
        ContextAware,
        true,
        &[I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let value = env.read_u128(args.u32(0))? as i128;
                append(env, &value.to_string());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printui128",
        ContextAware,
        true,
        &[I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let value = env.read_u128(args.u32(0))?;
                append(env, &value.to_string());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printsf",
        ContextAware,
        true,
        &[F32],
        None,
        |env, args| {
            if console_enabled(env) {
                let value = f32::from_bits(args.f32_bits(0));
                append(env, &format!("{value:.6e}"));
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printdf",
        ContextAware,
        true,
        &[F64],
        None,
        |env, args| {
            if console_enabled(env) {
                let value = f64::from_bits(args.f64_bits(0));
                append(env, &format!("{value:.15e}"));
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printqf",
        ContextAware,
        true,
        &[I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let bits = env.read_u128(args.u32(0))?;
                let approx = f64::from_bits(F128::from_bits(bits).to_f64().to_bits());
                append(env, &format!("{approx:.15e}"));
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printn",
        ContextAware,
        true,
        &[I64],
        None,
        |env, args| {
            if console_enabled(env) {
                append(env, &args.name(0).to_string());
            }
            Ok(None)
        },
    ));

    table.add(def(
        "printhex",
        ContextAware,
        true,
        &[I32, I32],
        None,
        |env, args| {
            if console_enabled(env) {
                let bytes = env.read_bytes(args.u32(0), args.u32(1))?;
                append(env, &hex::encode(bytes));
            }
            Ok(None)
        },
    ));
}
