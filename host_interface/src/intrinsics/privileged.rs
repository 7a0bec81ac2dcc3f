//!
//! Privileged chain administration: resource limits, producer schedules,
//! chain configuration and privilege flags. Every entry is gated on the
//! receiver's privileged flag by the dispatcher.
//!

use super::{def, Privileged, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_ee::codec::{Pack, Unpack};
use chain_ee::config::ChainConfig;
use chain_ee::types::{ProducerAuthority, ProducerKey};
use chain_ee::ChainError;

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "is_feature_active",
        Privileged,
        false,
        &[I64],
        Some(I32),
        |_, _| Ok(Some(WasmValue::I32(0))),
    ));

    table.add(def(
        "activate_feature",
        Privileged,
        false,
        &[I64],
        None,
        |_, _| {
            Err(ChainError::UnsupportedFeature("Unsupported Hardfork Detected").into())
        },
    ));

    table.add(def(
        "preactivate_feature",
        Privileged,
        false,
        &[I32],
        None,
        |env, args| {
            let digest = env.read_digest(args.u32(0))?;
            env.context.controller_mut().preactivate_feature(digest)?;
            Ok(None)
        },
    ));

    table.add(def(
        "set_resource_limits",
        Privileged,
        false,
        &[I64, I64, I64, I64],
        None,
        |env, args| {
            let (account, ram, net, cpu) =
                (args.name(0), args.i64(1), args.i64(2), args.i64(3));
            if ram < -1 {
                return Err(ChainError::wasm_execution(
                    "invalid value for ram resource limit expected [-1,INT64_MAX]",
                )
                .into());
            }
            if net < -1 {
                return Err(ChainError::wasm_execution(
                    "invalid value for net resource weight expected [-1,INT64_MAX]",
                )
                .into());
            }
            if cpu < -1 {
                return Err(ChainError::wasm_execution(
                    "invalid value for cpu resource weight expected [-1,INT64_MAX]",
                )
                .into());
            }
            env.context
                .controller_mut()
                .set_account_limits(account, ram, net, cpu)?;
            Ok(None)
        },
    ));

    table.add(def(
        "get_resource_limits",
        Privileged,
        false,
        &[I64, I32, I32, I32],
        None,
        |env, args| {
            let (ram, net, cpu) = env.context.controller().get_account_limits(args.name(0))?;
            env.write_u64(args.u32(1), ram as u64)?;
            env.write_u64(args.u32(2), net as u64)?;
            env.write_u64(args.u32(3), cpu as u64)?;
            Ok(None)
        },
    ));

    table.add(def(
        "set_proposed_producers",
        Privileged,
        false,
        &[I32, I32],
        Some(I64),
        |env, args| {
            let data = env.read_bytes(args.u32(0), args.u32(1))?;
            let version = propose_legacy(env.context.controller_mut(), &data)?;
            Ok(Some(WasmValue::I64(version)))
        },
    ));

    table.add(def(
        "set_proposed_producers_ex",
        Privileged,
        false,
        &[I64, I32, I32],
        Some(I64),
        |env, args| {
            let format = args.u64(0);
            let data = env.read_bytes(args.u32(1), args.u32(2))?;
            let controller = env.context.controller_mut();
            let version = match format {
                0 => propose_legacy(controller, &data)?,
                1 => {
                    let producers =
                        Vec::<ProducerAuthority>::unpack_all(&data).map_err(ChainError::from)?;
                    chain_core::set_proposed_producers(controller, producers, false)?
                }
                _ => {
                    return Err(ChainError::wasm_execution(
                        "Producer schedule is in an unknown format!",
                    )
                    .into())
                }
            };
            Ok(Some(WasmValue::I64(version)))
        },
    ));

    table.add(def(
        "get_blockchain_parameters_packed",
        Privileged,
        false,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let packed = env.context.chain_db().global().config.packed();
            let written = env.copy_packed(args.u32(0), args.u32(1), &packed)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "set_blockchain_parameters_packed",
        Privileged,
        false,
        &[I32, I32],
        None,
        |env, args| {
            let data = env.read_bytes(args.u32(0), args.u32(1))?;
            let config = ChainConfig::unpack_all(&data).map_err(ChainError::from)?;
            config.validate()?;
            env.context
                .chain_db_mut()
                .modify_global(|global| global.config = config);
            Ok(None)
        },
    ));

    table.add(def(
        "is_privileged",
        Privileged,
        false,
        &[I64],
        Some(I32),
        |env, args| {
            let privileged = env.context.controller().is_privileged(args.name(0));
            Ok(Some(WasmValue::I32(privileged as i32)))
        },
    ));

    table.add(def(
        "set_privileged",
        Privileged,
        false,
        &[I64, I32],
        None,
        |env, args| {
            let account = args.name(0);
            let value = args.i32(1) != 0;
            let known = env
                .context
                .chain_db_mut()
                .modify_account(account, |meta| meta.set_privileged(value));
            if !known {
                return Err(
                    ChainError::ActionValidate(format!("unknown account {account}")).into(),
                );
            }
            Ok(None)
        },
    ));
}

/// Format 0: the legacy `Vec<ProducerKey>` schedule, up-converted to
/// single-key authorities with key validation on.
fn propose_legacy(
    controller: &mut chain_core::Controller,
    data: &[u8],
) -> Result<i64, ChainError> {
    let legacy = Vec::<ProducerKey>::unpack_all(data).map_err(ChainError::from)?;
    let producers: Vec<ProducerAuthority> = legacy
        .into_iter()
        .map(ProducerKey::into_authority)
        .collect();
    chain_core::set_proposed_producers(controller, producers, true)
}
