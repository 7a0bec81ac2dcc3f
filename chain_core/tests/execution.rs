//!
//! End-to-end action execution against an in-memory controller: built-in
//! token actions, fee charging across the system-token list, rollback on
//! failure, and the database iterator bridge.
//!

use chain_core::{
    ApplyContext, Controller, IssuePayload, NoCodeRunner, TransactionContext, TransferPayload,
};
use chain_ee::codec::Pack;
use chain_ee::config::ACTIVE_PERMISSION;
use chain_ee::types::{
    name_from_str, Action, Asset, Name, PermissionLevel, Symbol, SymbolCode, TimePoint,
    Transaction, TransactionHeader,
};
use state_store::{IndexKind, SecondaryValue, SystemToken, FEE_TYPE_FIXED_PER_ACTION};
use token_system::SetTokenMeta;

fn symbol(code: &str) -> Symbol {
    Symbol::new(4, SymbolCode::from_str_checked(code).unwrap())
}

fn auth(actor: Name) -> Vec<PermissionLevel> {
    vec![PermissionLevel {
        actor,
        permission: ACTIVE_PERMISSION,
    }]
}

fn action(account: Name, name: &str, authorization: Vec<PermissionLevel>, data: Vec<u8>) -> Action {
    Action {
        account,
        name: name_from_str(name),
        authorization,
        data,
    }
}

fn setup_controller() -> Controller {
    let mut controller = Controller::new();
    for name in ["tokena", "tokenb", "alice", "bob", "payer"] {
        controller
            .db
            .create_account(name_from_str(name), TimePoint(0));
    }
    controller
}

fn setup_token(controller: &mut Controller, token: Name, code: &str) {
    let meta = SetTokenMeta {
        symbol: symbol(code),
        url: "https://token.example".into(),
        description: "token".into(),
    };
    let act = action(token, "settokenmeta", auth(token), meta.packed());
    let mut trx_ctx = TransactionContext::new(controller, Transaction::default(), TimePoint(0));
    trx_ctx
        .execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1)
        .unwrap();
    trx_ctx.finalize().unwrap();
}

fn issue(controller: &mut Controller, token: Name, code: &str, to: Name, amount: i64) {
    let payload = IssuePayload {
        to,
        qty: Asset::new(amount, symbol(code)),
        memo: String::new(),
    };
    let act = action(token, "issue", auth(token), payload.packed());
    let mut trx_ctx = TransactionContext::new(controller, Transaction::default(), TimePoint(0));
    trx_ctx
        .execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1)
        .unwrap();
    trx_ctx.finalize().unwrap();
}

#[test]
fn issue_and_transfer_update_balances() {
    let mut controller = setup_controller();
    let token = name_from_str("tokena");
    let alice = name_from_str("alice");
    let bob = name_from_str("bob");
    setup_token(&mut controller, token, "AAA");
    issue(&mut controller, token, "AAA", alice, 1000);

    let payload = TransferPayload {
        from: alice,
        to: bob,
        qty: Asset::new(250, symbol("AAA")),
        memo: "rent".into(),
    };
    let act = action(token, "transfer", auth(alice), payload.packed());
    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    trx_ctx
        .execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1)
        .unwrap();
    let traces = trx_ctx.finalize().unwrap();

    // transfer notifies both parties: three traces in order
    let receivers: Vec<Name> = traces.iter().map(|t| t.receiver).collect();
    assert_eq!(receivers, vec![token, alice, bob]);

    assert_eq!(
        token_system::get_token_balance(&controller.db, token, alice),
        750
    );
    assert_eq!(
        token_system::get_token_balance(&controller.db, token, bob),
        250
    );
    assert_eq!(
        token_system::get_token_total_supply(&controller.db, token).unwrap(),
        1000
    );
}

#[test]
fn failed_action_reverts_all_writes() {
    let mut controller = setup_controller();
    let token = name_from_str("tokena");
    let alice = name_from_str("alice");
    let bob = name_from_str("bob");
    setup_token(&mut controller, token, "AAA");
    issue(&mut controller, token, "AAA", alice, 100);

    // overdraw fails and must leave balances untouched
    let payload = TransferPayload {
        from: alice,
        to: bob,
        qty: Asset::new(500, symbol("AAA")),
        memo: String::new(),
    };
    let act = action(token, "transfer", auth(alice), payload.packed());
    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    let result = trx_ctx.execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1);
    assert!(result.is_err());
    trx_ctx.abort();

    assert_eq!(
        token_system::get_token_balance(&controller.db, token, alice),
        100
    );
    assert_eq!(
        token_system::get_token_balance(&controller.db, token, bob),
        0
    );
}

#[test]
fn failed_actions_log_diagnostics() {
    let mut controller = setup_controller();
    let logger = chain_ee::logger::BufferLogger::default();
    controller.logger = Box::new(logger.clone());

    let token = name_from_str("tokena");
    let alice = name_from_str("alice");
    let bob = name_from_str("bob");
    setup_token(&mut controller, token, "AAA");
    issue(&mut controller, token, "AAA", alice, 100);

    let payload = TransferPayload {
        from: alice,
        to: bob,
        qty: Asset::new(500, symbol("AAA")),
        memo: String::new(),
    };
    let act = action(token, "transfer", auth(alice), payload.packed());
    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    assert!(trx_ctx
        .execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1)
        .is_err());
    trx_ctx.abort();

    let output = logger.contents();
    assert!(output.contains("transfer"));
    assert!(output.contains("insufficient token balance"));
}

#[test]
fn missing_authorization_is_rejected() {
    let mut controller = setup_controller();
    let token = name_from_str("tokena");
    let alice = name_from_str("alice");
    let bob = name_from_str("bob");
    setup_token(&mut controller, token, "AAA");
    issue(&mut controller, token, "AAA", alice, 100);

    let payload = TransferPayload {
        from: alice,
        to: bob,
        qty: Asset::new(10, symbol("AAA")),
        memo: String::new(),
    };
    // bob signs, alice pays: rejected
    let act = action(token, "transfer", auth(bob), payload.packed());
    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    let result = trx_ctx.execute_action(token, act, &mut NoCodeRunner, Name(0), false, 1);
    assert!(result.is_err());
}

#[test]
fn transaction_fee_walks_system_tokens_in_order() {
    let mut controller = setup_controller();
    let t1 = name_from_str("tokena");
    let t2 = name_from_str("tokenb");
    let payer = name_from_str("payer");
    setup_token(&mut controller, t1, "AAA");
    setup_token(&mut controller, t2, "BBB");
    issue(&mut controller, t1, "AAA", payer, 300);
    issue(&mut controller, t2, "BBB", payer, 500);

    token_system::set_system_token_list(
        &mut controller.db,
        vec![
            SystemToken {
                token_id: t1,
                token_weight: SystemToken::weight_1x(),
            },
            SystemToken {
                token_id: t2,
                token_weight: 2 * SystemToken::weight_1x(),
            },
        ],
    )
    .unwrap();
    // a single action costing 1000
    token_system::set_default_tx_fee(&mut controller.db, 1000, FEE_TYPE_FIXED_PER_ACTION).unwrap();

    let trx = Transaction {
        header: TransactionHeader::default(),
        context_free_actions: vec![],
        actions: vec![action(
            name_from_str("alice"),
            "noop",
            auth(payer),
            vec![],
        )],
    };
    let mut trx_ctx = TransactionContext::new(&mut controller, trx, TimePoint(0));
    trx_ctx.exec(&mut NoCodeRunner).unwrap();
    let traces = trx_ctx.finalize().unwrap();

    // the noop action plus two txfee dispatches, in list order
    let fee_traces: Vec<Name> = traces
        .iter()
        .filter(|t| t.act.name == chain_ee::config::TXFEE_ACTION)
        .map(|t| t.receiver)
        .collect();
    assert_eq!(fee_traces, vec![t1, t2]);

    // t1 fully drained; t2 charged ceil(700 * 1x / 2x) = 350
    assert_eq!(token_system::get_token_balance(&controller.db, t1, payer), 0);
    assert_eq!(
        token_system::get_token_balance(&controller.db, t2, payer),
        150
    );
    // charged amounts were retired from supply
    assert_eq!(
        token_system::get_token_total_supply(&controller.db, t1).unwrap(),
        0
    );
    assert_eq!(
        token_system::get_token_total_supply(&controller.db, t2).unwrap(),
        150
    );
}

#[test]
fn insufficient_fee_funds_fail_without_partial_charge() {
    let mut controller = setup_controller();
    let t1 = name_from_str("tokena");
    let payer = name_from_str("payer");
    setup_token(&mut controller, t1, "AAA");
    issue(&mut controller, t1, "AAA", payer, 10);
    token_system::set_system_token_list(
        &mut controller.db,
        vec![SystemToken {
            token_id: t1,
            token_weight: SystemToken::weight_1x(),
        }],
    )
    .unwrap();
    token_system::set_default_tx_fee(&mut controller.db, 1000, FEE_TYPE_FIXED_PER_ACTION).unwrap();

    let trx = Transaction {
        header: TransactionHeader::default(),
        context_free_actions: vec![],
        actions: vec![action(name_from_str("alice"), "noop", auth(payer), vec![])],
    };
    let mut trx_ctx = TransactionContext::new(&mut controller, trx, TimePoint(0));
    assert!(trx_ctx.exec(&mut NoCodeRunner).is_err());
    trx_ctx.abort();

    // the partial drain was rolled back with the transaction
    assert_eq!(
        token_system::get_token_balance(&controller.db, t1, payer),
        10
    );
}

#[test]
fn iterator_bridge_walks_primary_and_secondary() {
    let mut controller = setup_controller();
    let code = name_from_str("alice");
    let scope = name_from_str("alice");
    let table = name_from_str("entries");

    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    let act = action(code, "touch", auth(code), vec![]);
    let mut ctx = ApplyContext::new(&mut trx_ctx, code, act, Name(0), false, 1);

    let itr1 = ctx
        .db_store_i64(scope, table, code, 10, b"ten")
        .unwrap();
    ctx.db_store_i64(scope, table, code, 30, b"thirty").unwrap();
    ctx.db_store_i64(scope, table, code, 20, b"twenty").unwrap();

    // iterator stability: previous(next(i)) == i while the table is
    // untouched, and the row is unchanged
    let (next, pk) = ctx.db_next_i64(itr1).unwrap();
    assert_eq!(pk, Some(20));
    let (back, pk) = ctx.db_previous_i64(next).unwrap();
    assert_eq!(pk, Some(10));
    assert_eq!(back, itr1);
    assert_eq!(ctx.db_get_i64(itr1).unwrap(), b"ten");

    // the end sentinel steps back to the greatest row
    let end = ctx.db_end_i64(code, scope, table);
    assert!(end < -1);
    let (last, pk) = ctx.db_previous_i64(end).unwrap();
    assert_eq!(pk, Some(30));
    let (after_last, pk) = ctx.db_next_i64(last).unwrap();
    assert_eq!(after_last, end);
    assert_eq!(pk, None);

    // bounds
    let found = ctx.db_lowerbound_i64(code, scope, table, 15);
    let (_, pk) = ctx.db_next_i64(found).unwrap();
    assert_eq!(pk, Some(30));

    // secondary: duplicated keys order by primary key
    let s1 = ctx
        .db_idx_store(scope, table, code, 10, SecondaryValue::U64(7))
        .unwrap();
    ctx.db_idx_store(scope, table, code, 20, SecondaryValue::U64(7))
        .unwrap();
    ctx.db_idx_store(scope, table, code, 30, SecondaryValue::U64(5))
        .unwrap();

    let (itr, pk) = ctx.db_idx_find_secondary(code, scope, table, SecondaryValue::U64(7));
    assert_eq!(pk, Some(10));
    assert_eq!(itr, s1);
    let (_, pk) = ctx.db_idx_next(IndexKind::U64, itr).unwrap();
    assert_eq!(pk, Some(20));
    let (itr, low) = ctx.db_idx_lowerbound(code, scope, table, SecondaryValue::U64(0));
    assert_eq!(low, Some((SecondaryValue::U64(5), 30)));
    let (_, pk) = ctx.db_idx_next(IndexKind::U64, itr).unwrap();
    assert_eq!(pk, Some(10));

    // removal invalidates the handle
    ctx.db_remove_i64(itr1).unwrap();
    assert!(ctx.db_get_i64(itr1).is_err());

    drop(ctx);
    trx_ctx.abort();
}

#[test]
fn deferred_transactions_schedule_and_cancel() {
    let mut controller = setup_controller();
    let alice = name_from_str("alice");
    let mut trx_ctx = TransactionContext::new(&mut controller, Transaction::default(), TimePoint(0));
    let act = action(alice, "touch", auth(alice), vec![]);
    let mut ctx = ApplyContext::new(&mut trx_ctx, alice, act, Name(0), false, 1);

    ctx.schedule_deferred_transaction(77, alice, Transaction::default(), false)
        .unwrap();
    // same sender id without replacement is rejected
    assert!(ctx
        .schedule_deferred_transaction(77, alice, Transaction::default(), false)
        .is_err());
    ctx.schedule_deferred_transaction(77, alice, Transaction::default(), true)
        .unwrap();
    assert!(ctx.cancel_deferred_transaction(77));
    assert!(!ctx.cancel_deferred_transaction(77));
}
