//!
//! Dispatcher-level tests: category gates, the consensus-visible softfloat
//! edge cases, guest assertions, crypto intrinsics and the privileged
//! surface, all driven through `IntrinsicTable::call`.
//!

use chain_core::{ApplyContext, Controller, TransactionContext};
use chain_ee::codec::Pack;
use chain_ee::config::ACTIVE_PERMISSION;
use chain_ee::errors::system_error_code;
use chain_ee::types::{
    name_from_str, Action, Name, PermissionLevel, TimePoint, Transaction,
};
use chain_ee::ChainError;
use hex_literal::hex;
use host_interface::{HostEnv, IntrinsicTable, Trap, WasmValue};
use token_system::SetTokenMeta;

const MEMORY_SIZE: usize = 64 * 1024;

struct Fixture {
    controller: Controller,
}

impl Fixture {
    fn new() -> Self {
        let mut controller = Controller::new();
        for name in ["eosio", "token", "alice", "bob"] {
            controller
                .db
                .create_account(name_from_str(name), TimePoint(0));
        }
        Fixture { controller }
    }

    fn run<R>(
        &mut self,
        receiver: Name,
        act: Action,
        context_free: bool,
        body: impl FnOnce(&IntrinsicTable, &mut HostEnv<'_, '_, '_>) -> R,
    ) -> R {
        let table = IntrinsicTable::standard();
        let mut memory = vec![0u8; MEMORY_SIZE];
        let mut trx_ctx =
            TransactionContext::new(&mut self.controller, Transaction::default(), TimePoint(0));
        let mut context = ApplyContext::new(&mut trx_ctx, receiver, act, Name(0), context_free, 1);
        let mut env = HostEnv {
            context: &mut context,
            memory: &mut memory,
        };
        let result = body(&table, &mut env);
        drop(env);
        drop(context);
        trx_ctx.abort();
        result
    }
}

fn plain_action(receiver: Name) -> Action {
    Action {
        account: receiver,
        name: name_from_str("anyaction"),
        authorization: vec![PermissionLevel {
            actor: receiver,
            permission: ACTIVE_PERMISSION,
        }],
        data: vec![],
    }
}

fn expect_error(result: Result<Option<WasmValue>, Trap>) -> ChainError {
    match result {
        Err(Trap::Error(error)) => error,
        other => panic!("expected chain error, got {other:?}"),
    }
}

#[test]
fn f32_truncation_boundary() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let over = table.call(
            env,
            "_eosio_f32_trunc_i32s",
            &[WasmValue::F32(2147483648.0f32.to_bits())],
        );
        assert!(matches!(
            expect_error(over),
            ChainError::WasmExecution(msg) if msg.contains("overflow")
        ));

        let ok = table
            .call(
                env,
                "_eosio_f32_trunc_i32s",
                &[WasmValue::F32(2147483520.0f32.to_bits())],
            )
            .unwrap();
        assert_eq!(ok, Some(WasmValue::I32(2147483520)));
    });
}

#[test]
fn f64_min_passes_nan_operands_through() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let nan = f64::NAN.to_bits();
        let pi = 3.14f64.to_bits();

        let first = table
            .call(env, "_eosio_f64_min", &[WasmValue::F64(nan), WasmValue::F64(pi)])
            .unwrap();
        assert_eq!(first, Some(WasmValue::F64(nan)));

        let second = table
            .call(env, "_eosio_f64_min", &[WasmValue::F64(pi), WasmValue::F64(nan)])
            .unwrap();
        assert_eq!(second, Some(WasmValue::F64(nan)));
    });
}

#[test]
fn reserved_assert_code_is_substituted() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let result = table.call(
            env,
            "eosio_assert_code",
            &[WasmValue::I32(0), WasmValue::I64(u64::MAX as i64)],
        );
        assert_eq!(
            expect_error(result),
            ChainError::RestrictedErrorCode {
                substituted: system_error_code::CONTRACT_RESTRICTED_ERROR_CODE
            }
        );

        let plain = table.call(
            env,
            "eosio_assert_code",
            &[WasmValue::I32(0), WasmValue::I64(42)],
        );
        assert_eq!(expect_error(plain), ChainError::AssertCode(42));

        // codes below the 10^19 boundary are NOT reserved, even with the
        // top bit set
        let high_bit = 0x8000_0000_0000_0000u64;
        assert!(high_bit < system_error_code::GENERIC_SYSTEM_ERROR);
        let unreserved = table.call(
            env,
            "eosio_assert_code",
            &[WasmValue::I32(0), WasmValue::I64(high_bit as i64)],
        );
        assert_eq!(expect_error(unreserved), ChainError::AssertCode(high_bit));
    });
}

#[test]
fn privileged_intrinsics_gate_on_receiver_flag() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    let args = [
        WasmValue::I64(name_from_str("bob").as_u64() as i64),
        WasmValue::I64(-1),
        WasmValue::I64(-1),
        WasmValue::I64(-1),
    ];
    fx.run(alice, plain_action(alice), false, |table, env| {
        let denied = table.call(env, "set_resource_limits", &args);
        assert!(matches!(
            expect_error(denied),
            ChainError::UnaccessibleApi(_)
        ));
    });

    // flag the receiver and try again
    fx.controller
        .db
        .modify_account(alice, |meta| meta.set_privileged(true));
    fx.run(alice, plain_action(alice), false, |table, env| {
        table.call(env, "set_resource_limits", &args).unwrap();
    });
}

#[test]
fn context_free_data_needs_context_free_apply() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    let args = [WasmValue::I32(0), WasmValue::I32(0), WasmValue::I32(0)];
    fx.run(alice, plain_action(alice), false, |table, env| {
        let denied = table.call(env, "get_context_free_data", &args);
        assert!(matches!(
            expect_error(denied),
            ChainError::UnaccessibleApi(_)
        ));
    });
    // and the other direction: a db write from a context-free action
    fx.run(alice, plain_action(alice), true, |table, env| {
        let denied = table.call(
            env,
            "db_find_i64",
            &[
                WasmValue::I64(0),
                WasmValue::I64(0),
                WasmValue::I64(0),
                WasmValue::I64(0),
            ],
        );
        assert!(matches!(
            expect_error(denied),
            ChainError::UnaccessibleApi(_)
        ));
    });
}

#[test]
fn oversized_inline_action_is_rejected() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let max = env
            .context
            .chain_db()
            .global()
            .config
            .max_inline_action_size;
        let result = table.call(
            env,
            "send_inline",
            &[WasmValue::I32(0), WasmValue::I32(max as i32)],
        );
        assert_eq!(expect_error(result), ChainError::InlineActionTooBig);
    });
}

#[test]
fn memcpy_rejects_aliasing() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let result = table.call(
            env,
            "memcpy",
            &[WasmValue::I32(100), WasmValue::I32(90), WasmValue::I32(32)],
        );
        assert_eq!(expect_error(result), ChainError::OverlappingMemory);

        // disjoint regions copy fine
        env.write_bytes(0, b"abcdefgh").unwrap();
        table
            .call(
                env,
                "memcpy",
                &[WasmValue::I32(1000), WasmValue::I32(0), WasmValue::I32(8)],
            )
            .unwrap();
        assert_eq!(env.slice(1000, 8).unwrap(), b"abcdefgh");
    });
}

#[test]
fn sha256_intrinsic_matches_fixture() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        env.write_bytes(0, b"abc").unwrap();
        table
            .call(
                env,
                "sha256",
                &[WasmValue::I32(0), WasmValue::I32(3), WasmValue::I32(100)],
            )
            .unwrap();
        let expected =
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(env.slice(100, 32).unwrap(), expected);

        // assert_sha256 against the stored digest passes; a corrupted
        // digest raises the crypto error
        table
            .call(
                env,
                "assert_sha256",
                &[WasmValue::I32(0), WasmValue::I32(3), WasmValue::I32(100)],
            )
            .unwrap();
        env.write_bytes(100, &[0u8]).unwrap();
        let result = table.call(
            env,
            "assert_sha256",
            &[WasmValue::I32(0), WasmValue::I32(3), WasmValue::I32(100)],
        );
        assert_eq!(expect_error(result), ChainError::CryptoApi("hash mismatch"));
    });
}

#[test]
fn recover_key_roundtrip() {
    use k256::ecdsa::SigningKey;

    let secret = [0x11u8; 32];
    let signing = SigningKey::from_slice(&secret).unwrap();
    let digest = [0x42u8; 32];
    let (signature, recovery) = signing.sign_prehash_recoverable(&digest).unwrap();

    // packed signature: type tag, recovery byte (compressed convention),
    // then r and s
    let mut packed_sig = vec![0u8];
    packed_sig.push(31 + recovery.to_byte());
    packed_sig.extend_from_slice(&signature.to_bytes());

    let mut expected_key = vec![0u8];
    expected_key.extend_from_slice(signing.verifying_key().to_encoded_point(true).as_bytes());

    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        env.write_bytes(0, &digest).unwrap();
        env.write_bytes(100, &packed_sig).unwrap();

        let written = table
            .call(
                env,
                "recover_key",
                &[
                    WasmValue::I32(0),
                    WasmValue::I32(100),
                    WasmValue::I32(packed_sig.len() as i32),
                    WasmValue::I32(200),
                    WasmValue::I32(64),
                ],
            )
            .unwrap();
        assert_eq!(written, Some(WasmValue::I32(expected_key.len() as i32)));
        assert_eq!(
            env.slice(200, expected_key.len() as u32).unwrap(),
            &expected_key[..]
        );

        // assert_recover_key agrees with itself and rejects a wrong key
        env.write_bytes(300, &expected_key).unwrap();
        table
            .call(
                env,
                "assert_recover_key",
                &[
                    WasmValue::I32(0),
                    WasmValue::I32(100),
                    WasmValue::I32(packed_sig.len() as i32),
                    WasmValue::I32(300),
                    WasmValue::I32(expected_key.len() as i32),
                ],
            )
            .unwrap();

        let mut wrong = expected_key.clone();
        wrong[5] ^= 1;
        env.write_bytes(300, &wrong).unwrap();
        let result = table.call(
            env,
            "assert_recover_key",
            &[
                WasmValue::I32(0),
                WasmValue::I32(100),
                WasmValue::I32(packed_sig.len() as i32),
                WasmValue::I32(300),
                WasmValue::I32(wrong.len() as i32),
            ],
        );
        assert_eq!(
            expect_error(result),
            ChainError::CryptoApi("Error expected key different than recovered key")
        );
    });
}

#[test]
fn unknown_producer_schedule_format_fails() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.controller
        .db
        .modify_account(alice, |meta| meta.set_privileged(true));
    fx.run(alice, plain_action(alice), false, |table, env| {
        let result = table.call(
            env,
            "set_proposed_producers_ex",
            &[WasmValue::I64(7), WasmValue::I32(0), WasmValue::I32(0)],
        );
        assert!(matches!(
            expect_error(result),
            ChainError::WasmExecution(msg) if msg.contains("unknown format")
        ));
    });
}

#[test]
fn divide_by_zero_in_builtins() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let result = table.call(
            env,
            "__divti3",
            &[
                WasmValue::I32(0),
                WasmValue::I64(5),
                WasmValue::I64(0),
                WasmValue::I64(0),
                WasmValue::I64(0),
            ],
        );
        assert_eq!(expect_error(result), ChainError::Arithmetic("divide by zero"));

        // a valid division writes its 128-bit result to the out pointer
        table
            .call(
                env,
                "__divti3",
                &[
                    WasmValue::I32(0),
                    WasmValue::I64(100),
                    WasmValue::I64(0),
                    WasmValue::I64(7),
                    WasmValue::I64(0),
                ],
            )
            .unwrap();
        assert_eq!(env.read_u128(0).unwrap(), 14);
    });
}

#[test]
fn quad_compare_families_fold_nan() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    fx.run(alice, plain_action(alice), false, |table, env| {
        let nan_hi = 0x7FFF_8000_0000_0000u64;
        let one_hi = 0x3FFF_0000_0000_0000u64;
        let nan_args = [
            WasmValue::I64(0),
            WasmValue::I64(nan_hi as i64),
            WasmValue::I64(0),
            WasmValue::I64(one_hi as i64),
        ];
        let eq = table.call(env, "__eqtf2", &nan_args).unwrap();
        assert_eq!(eq, Some(WasmValue::I32(1)));
        let ge = table.call(env, "__getf2", &nan_args).unwrap();
        assert_eq!(ge, Some(WasmValue::I32(-1)));
        let lt = table.call(env, "__lttf2", &nan_args).unwrap();
        assert_eq!(lt, Some(WasmValue::I32(0)));
        let unord = table.call(env, "__unordtf2", &nan_args).unwrap();
        assert_eq!(unord, Some(WasmValue::I32(1)));

        // ordered operands: 1.0 < 2.0
        let two_hi = 0x4000_0000_0000_0000u64;
        let ordered = [
            WasmValue::I64(0),
            WasmValue::I64(one_hi as i64),
            WasmValue::I64(0),
            WasmValue::I64(two_hi as i64),
        ];
        let cmp = table.call(env, "__cmptf2", &ordered).unwrap();
        assert_eq!(cmp, Some(WasmValue::I32(-1)));
    });
}

#[test]
fn token_intrinsics_issue_and_query() {
    let mut fx = Fixture::new();
    let token = name_from_str("token");
    let alice = name_from_str("alice");

    // token metadata via the built-in action path first
    {
        let meta = SetTokenMeta {
            symbol: chain_ee::types::Symbol::new(
                4,
                chain_ee::types::SymbolCode::from_str_checked("TOK").unwrap(),
            ),
            url: "https://token.example".into(),
            description: "test token".into(),
        };
        let act = Action {
            account: token,
            name: name_from_str("settokenmeta"),
            authorization: vec![PermissionLevel {
                actor: token,
                permission: ACTIVE_PERMISSION,
            }],
            data: meta.packed(),
        };
        let mut trx_ctx =
            TransactionContext::new(&mut fx.controller, Transaction::default(), TimePoint(0));
        trx_ctx
            .execute_action(token, act, &mut chain_core::NoCodeRunner, Name(0), false, 1)
            .unwrap();
        trx_ctx.finalize().unwrap();
    }

    fx.run(token, plain_action(token), false, |table, env| {
        table
            .call(
                env,
                "issue_token",
                &[
                    WasmValue::I64(alice.as_u64() as i64),
                    WasmValue::I64(500),
                ],
            )
            .unwrap();
        let balance = table
            .call(
                env,
                "get_token_balance",
                &[
                    WasmValue::I64(token.as_u64() as i64),
                    WasmValue::I64(alice.as_u64() as i64),
                ],
            )
            .unwrap();
        assert_eq!(balance, Some(WasmValue::I64(500)));
        let supply = table
            .call(
                env,
                "get_token_total_supply",
                &[WasmValue::I64(token.as_u64() as i64)],
            )
            .unwrap();
        assert_eq!(supply, Some(WasmValue::I64(500)));
    });
}

#[test]
fn system_token_list_requires_privilege_and_system_auth() {
    let mut fx = Fixture::new();
    let token = name_from_str("token");
    let eosio = name_from_str("eosio");

    let list = vec![state_store::SystemToken {
        token_id: token,
        token_weight: state_store::SystemToken::weight_1x(),
    }];
    let packed = list.packed();

    // not privileged
    fx.run(eosio, plain_action(eosio), false, |table, env| {
        env.write_bytes(0, &packed).unwrap();
        let result = table.call(
            env,
            "set_system_token_list_packed",
            &[WasmValue::I32(0), WasmValue::I32(packed.len() as i32)],
        );
        assert!(matches!(
            expect_error(result),
            ChainError::UnaccessibleApi(_)
        ));
    });

    fx.controller
        .db
        .modify_account(eosio, |meta| meta.set_privileged(true));

    // privileged, authorized by the system account
    fx.run(eosio, plain_action(eosio), false, |table, env| {
        env.write_bytes(0, &packed).unwrap();
        let version = table
            .call(
                env,
                "set_system_token_list_packed",
                &[WasmValue::I32(0), WasmValue::I32(packed.len() as i32)],
            )
            .unwrap();
        assert_eq!(version, Some(WasmValue::I64(1)));
    });
}

#[test]
fn console_funnels_into_the_context() {
    let mut fx = Fixture::new();
    let alice = name_from_str("alice");
    let console = fx.run(alice, plain_action(alice), false, |table, env| {
        env.write_bytes(0, b"hello ").unwrap();
        table
            .call(env, "prints_l", &[WasmValue::I32(0), WasmValue::I32(6)])
            .unwrap();
        table
            .call(
                env,
                "printn",
                &[WasmValue::I64(name_from_str("alice").as_u64() as i64)],
            )
            .unwrap();
        table
            .call(env, "printi", &[WasmValue::I64(-7)])
            .unwrap();
        env.context.console().to_owned()
    });
    assert_eq!(console, "hello alice-7");
}
