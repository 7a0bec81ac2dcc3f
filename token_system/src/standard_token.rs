//!
//! Standard token manager.
//!

use crate::{ApplyScope, InlineFeeDispatcher};
use chain_ee::codec::{CodecError, Pack, Unpack};
use chain_ee::config::{BILLABLE_SIZE_TOKEN_BALANCE, BILLABLE_SIZE_TOKEN_META, MAX_SYSTEM_TOKENS};
use chain_ee::types::{AccountName, Asset, Symbol};
use chain_ee::ChainError;
use state_store::{ChainDatabase, SystemToken, TokenMetaObject};
use std::collections::BTreeSet;

/// Payload of the built-in `settokenmeta` action.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SetTokenMeta {
    pub symbol: Symbol,
    pub url: String,
    pub description: String,
}

/// Payload of the built-in `txfee` action.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TxFeePayload {
    pub payer: AccountName,
    pub fee: Asset,
}

impl Pack for SetTokenMeta {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.symbol.pack_into(out);
        self.url.pack_into(out);
        self.description.pack_into(out);
    }
}

impl Unpack for SetTokenMeta {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(SetTokenMeta {
            symbol: Symbol::unpack_from(input)?,
            url: String::unpack_from(input)?,
            description: String::unpack_from(input)?,
        })
    }
}

impl Pack for TxFeePayload {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.payer.pack_into(out);
        self.fee.pack_into(out);
    }
}

impl Unpack for TxFeePayload {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TxFeePayload {
            payer: AccountName::unpack_from(input)?,
            fee: Asset::unpack_from(input)?,
        })
    }
}

///
/// Creates or updates a token's metadata. The symbol is immutable once set
/// and an update must actually change the url or description.
///
pub fn set_token_meta_info(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    token_id: AccountName,
    payload: &SetTokenMeta,
) -> Result<(), ChainError> {
    if !payload.symbol.valid() {
        return Err(ChainError::TokenMetaValidation("invalid token symbol"));
    }
    if payload.url.is_empty() || payload.url.len() > 255 {
        return Err(ChainError::TokenMetaValidation("invalid token url size"));
    }
    if payload.description.is_empty() || payload.description.len() > 255 {
        return Err(ChainError::TokenMetaValidation(
            "invalid token description size",
        ));
    }

    if let Some(existing) = db.token_meta(token_id) {
        if existing.symbol != payload.symbol {
            return Err(ChainError::TokenMetaValidation(
                "token symbol cannot be modified once it is set",
            ));
        }
        if existing.url == payload.url && existing.description == payload.description {
            return Err(ChainError::TokenMetaValidation(
                "attempting update token metadata, but new metadata is same as old one",
            ));
        }
        db.modify_token_meta(token_id, |meta| {
            meta.url = payload.url.clone();
            meta.description = payload.description.clone();
        });
    } else {
        db.create_token_meta(TokenMetaObject {
            token_id,
            symbol: payload.symbol,
            total_supply: 0,
            url: payload.url.clone(),
            description: payload.description.clone(),
        });
        scope.add_ram_usage(token_id, BILLABLE_SIZE_TOKEN_META);
    }
    Ok(())
}

pub fn get_token_symbol(db: &ChainDatabase, token_id: AccountName) -> Result<Symbol, ChainError> {
    db.token_meta(token_id)
        .map(|meta| meta.symbol)
        .ok_or(ChainError::TokenMetaValidation("token meta not found"))
}

pub fn get_token_total_supply(
    db: &ChainDatabase,
    token_id: AccountName,
) -> Result<i64, ChainError> {
    db.token_meta(token_id)
        .map(|meta| meta.total_supply)
        .ok_or(ChainError::TokenMetaValidation("token meta not found"))
}

/// Missing balance rows read as zero.
pub fn get_token_balance(db: &ChainDatabase, token_id: AccountName, account: AccountName) -> i64 {
    db.token_balance(token_id, account).unwrap_or(0)
}

/// Signed supply adjustment; the caller owns the sign discipline
/// (issue adds, retire subtracts).
pub fn update_token_total_supply(
    db: &mut ChainDatabase,
    token_id: AccountName,
    delta: i64,
) -> Result<(), ChainError> {
    if db.token_meta(token_id).is_none() {
        return Err(ChainError::TokenMetaValidation("token meta not found"));
    }
    db.modify_token_meta(token_id, |meta| {
        meta.total_supply += delta;
    });
    Ok(())
}

pub fn add_token_balance(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    token_id: AccountName,
    owner: AccountName,
    value: i64,
) -> Result<(), ChainError> {
    if scope.receiver() != token_id {
        return Err(ChainError::InvalidTokenBalanceUpdateAccess(
            "add_token_balance : action context receiver mismatches token-id",
        ));
    }
    match db.token_balance(token_id, owner) {
        Some(balance) => db.set_token_balance(token_id, owner, balance + value),
        None => {
            db.set_token_balance(token_id, owner, value);
            scope.add_ram_usage(owner, BILLABLE_SIZE_TOKEN_BALANCE);
        }
    }
    Ok(())
}

pub fn subtract_token_balance(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    token_id: AccountName,
    owner: AccountName,
    value: i64,
) -> Result<(), ChainError> {
    if scope.receiver() != token_id {
        return Err(ChainError::InvalidTokenBalanceUpdateAccess(
            "subtract_token_balance : action context receiver mismatches token-id",
        ));
    }
    let balance = db
        .token_balance(token_id, owner)
        .ok_or(ChainError::InsufficientTokenBalance { account: owner })?;
    if balance < value {
        return Err(ChainError::InsufficientTokenBalance { account: owner });
    }
    if balance == value {
        db.remove_token_balance(token_id, owner);
        scope.add_ram_usage(owner, -BILLABLE_SIZE_TOKEN_BALANCE);
    } else {
        db.set_token_balance(token_id, owner, balance - value);
    }
    Ok(())
}

///
/// Built-in token actions. The token id is implicitly the action receiver:
/// a contract can only move its own token.
///

pub fn issue_token(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    to: AccountName,
    amount: i64,
) -> Result<(), ChainError> {
    let token_id = scope.receiver();
    if amount <= 0 {
        return Err(ChainError::ActionValidate(
            "issue amount must be positive".into(),
        ));
    }
    add_token_balance(db, scope, token_id, to, amount)?;
    update_token_total_supply(db, token_id, amount)
}

pub fn transfer_token(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    from: AccountName,
    to: AccountName,
    amount: i64,
) -> Result<(), ChainError> {
    let token_id = scope.receiver();
    if amount <= 0 {
        return Err(ChainError::ActionValidate(
            "transfer amount must be positive".into(),
        ));
    }
    if from == to {
        return Err(ChainError::ActionValidate(
            "cannot transfer to self".into(),
        ));
    }
    subtract_token_balance(db, scope, token_id, from, amount)?;
    add_token_balance(db, scope, token_id, to, amount)
}

pub fn retire_token(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    amount: i64,
) -> Result<(), ChainError> {
    let token_id = scope.receiver();
    if amount <= 0 {
        return Err(ChainError::ActionValidate(
            "retire amount must be positive".into(),
        ));
    }
    subtract_token_balance(db, scope, token_id, token_id, amount)?;
    update_token_total_supply(db, token_id, -amount)
}

/// The built-in `txfee` action handler: debits the payer and retires the
/// charged amount from the token's supply. Redistribution to producers
/// happens outside this core.
pub fn apply_txfee(
    db: &mut ChainDatabase,
    scope: &mut dyn ApplyScope,
    payload: &TxFeePayload,
) -> Result<(), ChainError> {
    let token_id = scope.receiver();
    if payload.fee.amount <= 0 {
        return Err(ChainError::TransactionFee(
            "transaction fee amount must be greater than 0".into(),
        ));
    }
    subtract_token_balance(db, scope, token_id, payload.payer, payload.fee.amount)?;
    update_token_total_supply(db, token_id, -payload.fee.amount)
}

pub fn get_system_token_count(db: &ChainDatabase) -> u32 {
    db.system_token_list().tokens.len() as u32
}

///
/// Replaces the weighted fee-token list. The caller has already passed the
/// privileged and system-account authorization gates; this validates the
/// list itself. Returns the new list version, or `-1` when the new list is
/// identical to the current one.
///
pub fn set_system_token_list(
    db: &mut ChainDatabase,
    tokens: Vec<SystemToken>,
) -> Result<i64, ChainError> {
    if tokens.len() > MAX_SYSTEM_TOKENS {
        return Err(ChainError::wasm_execution(
            "System token list exceeds the maximum system token count for this chain",
        ));
    }
    let mut unique = BTreeSet::new();
    for token in &tokens {
        if !db.is_account(token.token_id) {
            return Err(ChainError::wasm_execution(
                "system token list includes a nonexisting account",
            ));
        }
        if !token.valid() {
            return Err(ChainError::wasm_execution(
                "system token list includes an invalid value",
            ));
        }
        unique.insert(token.token_id);
    }
    if unique.len() != tokens.len() {
        return Err(ChainError::wasm_execution(
            "duplicate system token id in system token list",
        ));
    }
    if db.system_token_list().tokens == tokens {
        return Ok(-1);
    }
    Ok(db.set_system_token_list(tokens))
}

///
/// Charges `fee_amount` (denominated at weight `1x`) across the system
/// tokens in declared list order. Each token the payer holds is charged at
/// its weight-scaled equivalent, dispatching one inline `txfee` action per
/// touched token; a partial balance is drained and the remainder carries
/// to the next token in the list.
///
pub fn pay_transaction_fee(
    db: &mut ChainDatabase,
    dispatcher: &mut dyn InlineFeeDispatcher,
    fee_payer: AccountName,
    fee_amount: i64,
) -> Result<(), ChainError> {
    if fee_amount <= 0 {
        return Err(ChainError::TransactionFee(
            "transaction fee amount must be greater than 0".into(),
        ));
    }
    let weight_1x = SystemToken::weight_1x();
    let sys_tokens = db.system_token_list().tokens.clone();
    let mut remaining = fee_amount;

    for sys_token in &sys_tokens {
        let balance = match db.token_balance(sys_token.token_id, fee_payer) {
            Some(balance) => balance,
            None => continue,
        };

        let mut charge = remaining;
        if sys_token.token_weight != weight_1x {
            charge = (remaining * weight_1x + sys_token.token_weight - 1) / sys_token.token_weight;
            if balance >= charge {
                remaining = 0;
            } else {
                charge = balance;
                remaining -= balance * sys_token.token_weight / weight_1x;
            }
        } else if balance >= charge {
            remaining = 0;
        } else {
            charge = balance;
            remaining -= balance;
        }

        let symbol = db
            .token_meta(sys_token.token_id)
            .map(|meta| meta.symbol)
            .ok_or_else(|| {
                ChainError::TransactionFee(format!(
                    "no token meta info for system token {}",
                    sys_token.token_id
                ))
            })?;

        dispatcher.dispatch_txfee(
            db,
            sys_token.token_id,
            fee_payer,
            Asset::new(charge, symbol),
        )?;

        if remaining <= 0 {
            break;
        }
    }

    if remaining > 0 {
        return Err(ChainError::TransactionFee(format!(
            "fee payer {fee_payer} does not have enough system token"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_ee::types::name_from_str;
    use chain_ee::types::SymbolCode;

    struct Scope {
        receiver: AccountName,
        ram: Vec<(AccountName, i64)>,
    }

    impl Scope {
        fn new(receiver: AccountName) -> Self {
            Scope {
                receiver,
                ram: Vec::new(),
            }
        }
    }

    impl ApplyScope for Scope {
        fn receiver(&self) -> AccountName {
            self.receiver
        }

        fn add_ram_usage(&mut self, payer: AccountName, delta: i64) {
            self.ram.push((payer, delta));
        }
    }

    /// Records charges without applying them, standing in for inline
    /// dispatch.
    struct DirectCharge;

    impl InlineFeeDispatcher for DirectCharge {
        fn dispatch_txfee(
            &mut self,
            _db: &mut ChainDatabase,
            _token_id: AccountName,
            _fee_payer: AccountName,
            _fee: Asset,
        ) -> Result<(), ChainError> {
            Ok(())
        }
    }

    fn symbol(code: &str) -> Symbol {
        Symbol::new(4, SymbolCode::from_str_checked(code).unwrap())
    }

    fn meta_payload(code: &str) -> SetTokenMeta {
        SetTokenMeta {
            symbol: symbol(code),
            url: "https://token.example".into(),
            description: "a token".into(),
        }
    }

    fn setup_token(db: &mut ChainDatabase, token: AccountName, code: &str) {
        let mut scope = Scope::new(token);
        set_token_meta_info(db, &mut scope, token, &meta_payload(code)).unwrap();
    }

    #[test]
    fn symbol_is_immutable() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        setup_token(&mut db, token, "KRW");

        let mut scope = Scope::new(token);
        let err = set_token_meta_info(&mut db, &mut scope, token, &meta_payload("USD"));
        assert_eq!(
            err,
            Err(ChainError::TokenMetaValidation(
                "token symbol cannot be modified once it is set"
            ))
        );
    }

    #[test]
    fn noop_meta_update_is_rejected() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        setup_token(&mut db, token, "KRW");

        let mut scope = Scope::new(token);
        let err = set_token_meta_info(&mut db, &mut scope, token, &meta_payload("KRW"));
        assert_eq!(
            err,
            Err(ChainError::TokenMetaValidation(
                "attempting update token metadata, but new metadata is same as old one"
            ))
        );

        let mut changed = meta_payload("KRW");
        changed.description = "a different token".into();
        set_token_meta_info(&mut db, &mut scope, token, &changed).unwrap();
        assert_eq!(db.token_meta(token).unwrap().description, "a different token");
    }

    #[test]
    fn issue_transfer_retire_conserve_supply() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        let alice = name_from_str("alice");
        let bob = name_from_str("bob");
        setup_token(&mut db, token, "KRW");
        let mut scope = Scope::new(token);

        issue_token(&mut db, &mut scope, alice, 1000).unwrap();
        transfer_token(&mut db, &mut scope, alice, bob, 400).unwrap();
        // retire burns from the token account itself
        transfer_token(&mut db, &mut scope, bob, token, 100).unwrap();
        retire_token(&mut db, &mut scope, 100).unwrap();

        let supply = get_token_total_supply(&db, token).unwrap();
        let sum: i64 = db.token_balances_of(token).map(|(_, b)| b).sum();
        assert_eq!(supply, 900);
        assert_eq!(sum, supply);
        assert_eq!(get_token_balance(&db, token, alice), 600);
        assert_eq!(get_token_balance(&db, token, bob), 300);
    }

    #[test]
    fn zero_balance_row_is_removed() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        let alice = name_from_str("alice");
        setup_token(&mut db, token, "KRW");
        let mut scope = Scope::new(token);

        issue_token(&mut db, &mut scope, alice, 50).unwrap();
        let mut scope = Scope::new(token);
        subtract_token_balance(&mut db, &mut scope, token, alice, 50).unwrap();
        assert!(db.token_balance(token, alice).is_none());
        // the RAM held by the row is refunded to its payer
        assert!(scope.ram.contains(&(alice, -BILLABLE_SIZE_TOKEN_BALANCE)));
    }

    #[test]
    fn subtract_needs_sufficient_balance() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        let alice = name_from_str("alice");
        setup_token(&mut db, token, "KRW");
        let mut scope = Scope::new(token);
        issue_token(&mut db, &mut scope, alice, 10).unwrap();

        let err = subtract_token_balance(&mut db, &mut scope, token, alice, 11);
        assert_eq!(
            err,
            Err(ChainError::InsufficientTokenBalance { account: alice })
        );
    }

    #[test]
    fn receiver_gate_blocks_foreign_tokens() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        let other = name_from_str("other");
        let alice = name_from_str("alice");
        setup_token(&mut db, token, "KRW");

        let mut scope = Scope::new(other);
        let err = add_token_balance(&mut db, &mut scope, token, alice, 5);
        assert!(matches!(
            err,
            Err(ChainError::InvalidTokenBalanceUpdateAccess(_))
        ));
    }

    #[test]
    fn system_token_list_validation() {
        let mut db = ChainDatabase::new();
        let t1 = name_from_str("tokena");
        db.create_account(t1, chain_ee::types::TimePoint(0));

        // nonexisting account rejected
        let missing = name_from_str("ghost");
        let err = set_system_token_list(
            &mut db,
            vec![SystemToken {
                token_id: missing,
                token_weight: SystemToken::weight_1x(),
            }],
        );
        assert!(err.is_err());

        // duplicates rejected
        let dup = vec![
            SystemToken {
                token_id: t1,
                token_weight: SystemToken::weight_1x(),
            },
            SystemToken {
                token_id: t1,
                token_weight: 2 * SystemToken::weight_1x(),
            },
        ];
        assert!(set_system_token_list(&mut db, dup).is_err());

        // versions increase monotonically; identical list is rejected
        let list = vec![SystemToken {
            token_id: t1,
            token_weight: SystemToken::weight_1x(),
        }];
        assert_eq!(set_system_token_list(&mut db, list.clone()).unwrap(), 1);
        assert_eq!(set_system_token_list(&mut db, list).unwrap(), -1);
    }

    #[test]
    fn fee_walk_across_two_tokens() {
        let mut db = ChainDatabase::new();
        let t1 = name_from_str("tokena");
        let t2 = name_from_str("tokenb");
        let payer = name_from_str("payer");
        db.create_account(t1, chain_ee::types::TimePoint(0));
        db.create_account(t2, chain_ee::types::TimePoint(0));
        setup_token(&mut db, t1, "AAA");
        setup_token(&mut db, t2, "BBB");

        for (token, amount) in [(t1, 300i64), (t2, 500)] {
            let mut scope = Scope::new(token);
            issue_token(&mut db, &mut scope, payer, amount).unwrap();
        }
        set_system_token_list(
            &mut db,
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

        #[derive(Default)]
        struct Recorder {
            charges: Vec<(AccountName, i64)>,
        }
        impl InlineFeeDispatcher for Recorder {
            fn dispatch_txfee(
                &mut self,
                _db: &mut ChainDatabase,
                token_id: AccountName,
                _fee_payer: AccountName,
                fee: Asset,
            ) -> Result<(), ChainError> {
                self.charges.push((token_id, fee.amount));
                Ok(())
            }
        }

        // payer holds {t1: 300 (1x), t2: 500 (2x)}; charging 1000 drains t1
        // and takes ceil(700 * 1x / 2x) = 350 from t2, in list order
        let mut recorder = Recorder::default();
        pay_transaction_fee(&mut db, &mut recorder, payer, 1000).unwrap();
        assert_eq!(recorder.charges, vec![(t1, 300), (t2, 350)]);
    }

    #[test]
    fn fee_exhaustion_fails() {
        let mut db = ChainDatabase::new();
        let t1 = name_from_str("tokena");
        let payer = name_from_str("payer");
        db.create_account(t1, chain_ee::types::TimePoint(0));
        setup_token(&mut db, t1, "AAA");
        let mut scope = Scope::new(t1);
        issue_token(&mut db, &mut scope, payer, 100).unwrap();
        set_system_token_list(
            &mut db,
            vec![SystemToken {
                token_id: t1,
                token_weight: SystemToken::weight_1x(),
            }],
        )
        .unwrap();

        let err = pay_transaction_fee(&mut db, &mut DirectCharge, payer, 1000);
        assert!(matches!(err, Err(ChainError::TransactionFee(_))));
    }
}
