//!
//! The multi-indexed object database with layered undo.
//!
//! Every mutator records the prior state of the touched key in the topmost
//! undo layer before changing it; reverting a layer replays those records
//! in reverse. Layers nest: the transaction pushes one, each apply context
//! pushes another on top, and a failed action reverts only its own layer.
//!

use crate::index::{IndexKind, SecondaryValue, SortKey};
use crate::objects::{
    AccountMetadata, GlobalPropertyObject, RowValue, SystemToken, SystemTokenListObject, TableKey,
    TableMeta, TokenBalanceObject, TokenMetaObject, TransactionFeeObject,
};
use chain_ee::types::{AccountName, ActionName, Name, TimePoint};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

pub type TableId = u64;

/// Depth returned by `push_undo_layer`; pass back to `revert` or `commit`.
pub type UndoDepth = usize;

#[derive(Debug)]
enum Revert {
    Account(Name, Option<AccountMetadata>),
    Global(Box<GlobalPropertyObject>),
    SystemTokens(SystemTokenListObject),
    TokenMeta(Name, Option<TokenMetaObject>),
    TokenBalance((Name, Name), Option<i64>),
    Fee((Name, Name), Option<TransactionFeeObject>),
    TableIndex(TableKey, Option<TableId>),
    TableMeta(TableId, Option<TableMeta>),
    Row((TableId, u64), Option<RowValue>),
    SecondaryKey(IndexKind, (TableId, SortKey, u64), Option<AccountName>),
    SecondaryByPrimary(IndexKind, (TableId, u64), Option<SortKey>),
}

#[derive(Default, Debug)]
struct SecondaryIndex {
    by_key: BTreeMap<(TableId, SortKey, u64), AccountName>,
    by_primary: BTreeMap<(TableId, u64), SortKey>,
}

#[derive(Default)]
pub struct ChainDatabase {
    accounts: BTreeMap<Name, AccountMetadata>,
    global: GlobalPropertyObject,
    system_tokens: SystemTokenListObject,
    token_meta: BTreeMap<Name, TokenMetaObject>,
    token_balances: BTreeMap<(Name, Name), i64>,
    fees: BTreeMap<(Name, Name), TransactionFeeObject>,
    tables: BTreeMap<TableKey, TableId>,
    table_metas: BTreeMap<TableId, TableMeta>,
    rows: BTreeMap<(TableId, u64), RowValue>,
    secondary: [SecondaryIndex; 5],
    next_table_id: TableId,
    undo: Vec<Vec<Revert>>,
}

impl ChainDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, entry: Revert) {
        if let Some(layer) = self.undo.last_mut() {
            layer.push(entry);
        }
    }

    // ---- undo sessions ----

    pub fn push_undo_layer(&mut self) -> UndoDepth {
        self.undo.push(Vec::new());
        self.undo.len()
    }

    /// Discards every change made at `depth` and above.
    pub fn revert(&mut self, depth: UndoDepth) {
        while self.undo.len() >= depth {
            let layer = match self.undo.pop() {
                Some(layer) => layer,
                None => return,
            };
            for entry in layer.into_iter().rev() {
                self.apply_revert(entry);
            }
        }
    }

    /// Folds the layers at `depth` and above into their parent, keeping the
    /// changes while preserving the parent's ability to revert them.
    pub fn commit(&mut self, depth: UndoDepth) {
        while self.undo.len() >= depth {
            let layer = match self.undo.pop() {
                Some(layer) => layer,
                None => return,
            };
            if let Some(parent) = self.undo.last_mut() {
                parent.extend(layer);
            }
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    fn apply_revert(&mut self, entry: Revert) {
        fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, prior: Option<V>) {
            match prior {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        match entry {
            Revert::Account(name, prior) => restore(&mut self.accounts, name, prior),
            Revert::Global(prior) => self.global = *prior,
            Revert::SystemTokens(prior) => self.system_tokens = prior,
            Revert::TokenMeta(name, prior) => restore(&mut self.token_meta, name, prior),
            Revert::TokenBalance(key, prior) => restore(&mut self.token_balances, key, prior),
            Revert::Fee(key, prior) => restore(&mut self.fees, key, prior),
            Revert::TableIndex(key, prior) => restore(&mut self.tables, key, prior),
            Revert::TableMeta(id, prior) => restore(&mut self.table_metas, id, prior),
            Revert::Row(key, prior) => restore(&mut self.rows, key, prior),
            Revert::SecondaryKey(kind, key, prior) => {
                restore(&mut self.secondary[kind.slot()].by_key, key, prior)
            }
            Revert::SecondaryByPrimary(kind, key, prior) => {
                restore(&mut self.secondary[kind.slot()].by_primary, key, prior)
            }
        }
    }

    // ---- accounts ----

    pub fn create_account(&mut self, name: AccountName, creation_time: TimePoint) {
        let prior = self.accounts.get(&name).copied();
        self.record(Revert::Account(name, prior));
        self.accounts
            .insert(name, AccountMetadata::new(name, creation_time));
    }

    pub fn account(&self, name: AccountName) -> Option<&AccountMetadata> {
        self.accounts.get(&name)
    }

    pub fn is_account(&self, name: AccountName) -> bool {
        self.accounts.contains_key(&name)
    }

    pub fn modify_account(
        &mut self,
        name: AccountName,
        modify: impl FnOnce(&mut AccountMetadata),
    ) -> bool {
        let prior = match self.accounts.get(&name) {
            Some(meta) => Some(*meta),
            None => return false,
        };
        self.record(Revert::Account(name, prior));
        if let Some(meta) = self.accounts.get_mut(&name) {
            modify(meta);
        }
        true
    }

    // ---- global properties ----

    pub fn global(&self) -> &GlobalPropertyObject {
        &self.global
    }

    pub fn modify_global(&mut self, modify: impl FnOnce(&mut GlobalPropertyObject)) {
        let prior = Box::new(self.global.clone());
        self.record(Revert::Global(prior));
        modify(&mut self.global);
    }

    // ---- system token list ----

    pub fn system_token_list(&self) -> &SystemTokenListObject {
        &self.system_tokens
    }

    /// Replaces the list atomically, returning the new version.
    pub fn set_system_token_list(&mut self, tokens: Vec<SystemToken>) -> i64 {
        let prior = self.system_tokens.clone();
        self.record(Revert::SystemTokens(prior));
        self.system_tokens.version += 1;
        self.system_tokens.tokens = tokens;
        self.system_tokens.version
    }

    /// Used when loading from a snapshot: restores both list and version.
    pub fn restore_system_token_list(&mut self, version: i64, tokens: Vec<SystemToken>) {
        let prior = self.system_tokens.clone();
        self.record(Revert::SystemTokens(prior));
        self.system_tokens = SystemTokenListObject { version, tokens };
    }

    // ---- token metadata and balances ----

    pub fn token_meta(&self, token_id: AccountName) -> Option<&TokenMetaObject> {
        self.token_meta.get(&token_id)
    }

    pub fn create_token_meta(&mut self, meta: TokenMetaObject) {
        let token_id = meta.token_id;
        let prior = self.token_meta.get(&token_id).cloned();
        self.record(Revert::TokenMeta(token_id, prior));
        self.token_meta.insert(token_id, meta);
    }

    pub fn modify_token_meta(
        &mut self,
        token_id: AccountName,
        modify: impl FnOnce(&mut TokenMetaObject),
    ) -> bool {
        let prior = match self.token_meta.get(&token_id) {
            Some(meta) => Some(meta.clone()),
            None => return false,
        };
        self.record(Revert::TokenMeta(token_id, prior));
        if let Some(meta) = self.token_meta.get_mut(&token_id) {
            modify(meta);
        }
        true
    }

    pub fn token_meta_rows(&self) -> impl Iterator<Item = &TokenMetaObject> {
        self.token_meta.values()
    }

    pub fn token_balance(&self, token_id: AccountName, account: AccountName) -> Option<i64> {
        self.token_balances.get(&(token_id, account)).copied()
    }

    pub fn set_token_balance(&mut self, token_id: AccountName, account: AccountName, value: i64) {
        let key = (token_id, account);
        let prior = self.token_balances.get(&key).copied();
        self.record(Revert::TokenBalance(key, prior));
        self.token_balances.insert(key, value);
    }

    pub fn remove_token_balance(&mut self, token_id: AccountName, account: AccountName) {
        let key = (token_id, account);
        let prior = self.token_balances.get(&key).copied();
        self.record(Revert::TokenBalance(key, prior));
        self.token_balances.remove(&key);
    }

    pub fn token_balance_rows(&self) -> impl Iterator<Item = TokenBalanceObject> + '_ {
        self.token_balances
            .iter()
            .map(|(&(token_id, account), &balance)| TokenBalanceObject {
                token_id,
                account,
                balance,
            })
    }

    pub fn token_balances_of(
        &self,
        token_id: AccountName,
    ) -> impl Iterator<Item = (AccountName, i64)> + '_ {
        self.token_balances
            .range((token_id, Name(0))..=(token_id, Name(u64::MAX)))
            .map(|(&(_, account), &balance)| (account, balance))
    }

    // ---- transaction fee table ----

    pub fn fee_entry(
        &self,
        code: AccountName,
        action: ActionName,
    ) -> Option<&TransactionFeeObject> {
        self.fees.get(&(code, action))
    }

    pub fn set_fee_entry(&mut self, entry: TransactionFeeObject) {
        let key = (entry.code, entry.action);
        let prior = self.fees.get(&key).copied();
        self.record(Revert::Fee(key, prior));
        self.fees.insert(key, entry);
    }

    pub fn remove_fee_entry(&mut self, code: AccountName, action: ActionName) -> bool {
        let key = (code, action);
        let prior = match self.fees.get(&key) {
            Some(entry) => Some(*entry),
            None => return false,
        };
        self.record(Revert::Fee(key, prior));
        self.fees.remove(&key);
        true
    }

    /// Rows in lexicographic `(code, action)` order, as snapshots demand.
    pub fn fee_rows(&self) -> impl Iterator<Item = &TransactionFeeObject> {
        self.fees.values()
    }

    // ---- contract tables ----

    pub fn find_table(&self, key: TableKey) -> Option<TableId> {
        self.tables.get(&key).copied()
    }

    pub fn table_meta(&self, id: TableId) -> Option<&TableMeta> {
        self.table_metas.get(&id)
    }

    pub fn create_table(&mut self, key: TableKey, payer: AccountName) -> TableId {
        let id = self.next_table_id;
        self.next_table_id += 1;
        self.record(Revert::TableIndex(key, None));
        self.record(Revert::TableMeta(id, None));
        self.tables.insert(key, id);
        self.table_metas.insert(
            id,
            TableMeta {
                key,
                payer,
                row_count: 0,
            },
        );
        id
    }

    pub fn remove_table(&mut self, id: TableId) {
        let meta = match self.table_metas.get(&id) {
            Some(meta) => *meta,
            None => return,
        };
        self.record(Revert::TableIndex(meta.key, Some(id)));
        self.record(Revert::TableMeta(id, Some(meta)));
        self.tables.remove(&meta.key);
        self.table_metas.remove(&id);
    }

    fn bump_row_count(&mut self, id: TableId, delta: i64) {
        let prior = match self.table_metas.get(&id) {
            Some(meta) => *meta,
            None => return,
        };
        self.record(Revert::TableMeta(id, Some(prior)));
        if let Some(meta) = self.table_metas.get_mut(&id) {
            meta.row_count = (meta.row_count as i64 + delta) as u32;
        }
    }

    // ---- primary rows ----

    pub fn row(&self, table: TableId, primary: u64) -> Option<&RowValue> {
        self.rows.get(&(table, primary))
    }

    pub fn insert_row(&mut self, table: TableId, primary: u64, payer: AccountName, value: Vec<u8>) {
        debug_assert!(!self.rows.contains_key(&(table, primary)));
        self.record(Revert::Row((table, primary), None));
        self.rows.insert((table, primary), RowValue { payer, value });
        self.bump_row_count(table, 1);
    }

    pub fn modify_row(&mut self, table: TableId, primary: u64, payer: AccountName, value: Vec<u8>) {
        let prior = self.rows.get(&(table, primary)).cloned();
        debug_assert!(prior.is_some());
        self.record(Revert::Row((table, primary), prior));
        self.rows.insert((table, primary), RowValue { payer, value });
    }

    pub fn remove_row(&mut self, table: TableId, primary: u64) -> Option<RowValue> {
        let prior = self.rows.get(&(table, primary)).cloned()?;
        self.record(Revert::Row((table, primary), Some(prior.clone())));
        self.rows.remove(&(table, primary));
        self.bump_row_count(table, -1);
        Some(prior)
    }

    pub fn next_primary(&self, table: TableId, primary: u64) -> Option<u64> {
        self.rows
            .range((Excluded((table, primary)), Included((table, u64::MAX))))
            .next()
            .map(|(&(_, pk), _)| pk)
    }

    pub fn prev_primary(&self, table: TableId, primary: u64) -> Option<u64> {
        self.rows
            .range((Included((table, 0)), Excluded((table, primary))))
            .next_back()
            .map(|(&(_, pk), _)| pk)
    }

    pub fn lowerbound_primary(&self, table: TableId, primary: u64) -> Option<u64> {
        self.rows
            .range((Included((table, primary)), Included((table, u64::MAX))))
            .next()
            .map(|(&(_, pk), _)| pk)
    }

    pub fn upperbound_primary(&self, table: TableId, primary: u64) -> Option<u64> {
        if primary == u64::MAX {
            return None;
        }
        self.next_primary(table, primary)
    }

    pub fn last_primary(&self, table: TableId) -> Option<u64> {
        self.rows
            .range((table, 0)..=(table, u64::MAX))
            .next_back()
            .map(|(&(_, pk), _)| pk)
    }

    // ---- secondary indices ----

    pub fn insert_secondary(
        &mut self,
        table: TableId,
        value: SecondaryValue,
        primary: u64,
        payer: AccountName,
    ) {
        let kind = value.kind();
        let sort = value.sort_key();
        debug_assert!(!self.secondary[kind.slot()]
            .by_primary
            .contains_key(&(table, primary)));
        self.record(Revert::SecondaryKey(kind, (table, sort, primary), None));
        self.record(Revert::SecondaryByPrimary(kind, (table, primary), None));
        let index = &mut self.secondary[kind.slot()];
        index.by_key.insert((table, sort, primary), payer);
        index.by_primary.insert((table, primary), sort);
    }

    pub fn secondary_by_primary(
        &self,
        kind: IndexKind,
        table: TableId,
        primary: u64,
    ) -> Option<(SecondaryValue, AccountName)> {
        let index = &self.secondary[kind.slot()];
        let sort = *index.by_primary.get(&(table, primary))?;
        let payer = *index.by_key.get(&(table, sort, primary))?;
        Some((SecondaryValue::from_sort_key(kind, sort), payer))
    }

    pub fn update_secondary(
        &mut self,
        table: TableId,
        primary: u64,
        value: SecondaryValue,
        payer: AccountName,
    ) -> bool {
        let kind = value.kind();
        let old_sort = match self.secondary[kind.slot()].by_primary.get(&(table, primary)) {
            Some(sort) => *sort,
            None => return false,
        };
        let old_payer = self.secondary[kind.slot()]
            .by_key
            .get(&(table, old_sort, primary))
            .copied();
        let new_sort = value.sort_key();
        self.record(Revert::SecondaryKey(
            kind,
            (table, old_sort, primary),
            old_payer,
        ));
        self.record(Revert::SecondaryKey(kind, (table, new_sort, primary), None));
        self.record(Revert::SecondaryByPrimary(
            kind,
            (table, primary),
            Some(old_sort),
        ));
        let index = &mut self.secondary[kind.slot()];
        index.by_key.remove(&(table, old_sort, primary));
        index.by_key.insert((table, new_sort, primary), payer);
        index.by_primary.insert((table, primary), new_sort);
        true
    }

    pub fn remove_secondary(&mut self, kind: IndexKind, table: TableId, primary: u64) -> bool {
        let sort = match self.secondary[kind.slot()].by_primary.get(&(table, primary)) {
            Some(sort) => *sort,
            None => return false,
        };
        let payer = self.secondary[kind.slot()]
            .by_key
            .get(&(table, sort, primary))
            .copied();
        self.record(Revert::SecondaryKey(kind, (table, sort, primary), payer));
        self.record(Revert::SecondaryByPrimary(kind, (table, primary), Some(sort)));
        let index = &mut self.secondary[kind.slot()];
        index.by_key.remove(&(table, sort, primary));
        index.by_primary.remove(&(table, primary));
        true
    }

    /// First entry whose key is >= `value`, lowest primary first.
    pub fn lowerbound_secondary(
        &self,
        table: TableId,
        value: SecondaryValue,
    ) -> Option<(SecondaryValue, u64)> {
        let kind = value.kind();
        let sort = value.sort_key();
        self.secondary[kind.slot()]
            .by_key
            .range((Included((table, sort, 0)), Unbounded))
            .next()
            .filter(|(&(tid, _, _), _)| tid == table)
            .map(|(&(_, s, pk), _)| (SecondaryValue::from_sort_key(kind, s), pk))
    }

    /// First entry whose key is strictly greater than `value`.
    pub fn upperbound_secondary(
        &self,
        table: TableId,
        value: SecondaryValue,
    ) -> Option<(SecondaryValue, u64)> {
        let kind = value.kind();
        let sort = value.sort_key();
        self.secondary[kind.slot()]
            .by_key
            .range((Excluded((table, sort, u64::MAX)), Unbounded))
            .next()
            .filter(|(&(tid, _, _), _)| tid == table)
            .map(|(&(_, s, pk), _)| (SecondaryValue::from_sort_key(kind, s), pk))
    }

    /// First entry exactly matching `value`.
    pub fn find_secondary(
        &self,
        table: TableId,
        value: SecondaryValue,
    ) -> Option<(SecondaryValue, u64)> {
        let sort = value.sort_key();
        self.lowerbound_secondary(table, value)
            .filter(|(found, _)| found.sort_key() == sort)
    }

    pub fn next_secondary(
        &self,
        kind: IndexKind,
        table: TableId,
        value: SecondaryValue,
        primary: u64,
    ) -> Option<(SecondaryValue, u64)> {
        let sort = value.sort_key();
        self.secondary[kind.slot()]
            .by_key
            .range((Excluded((table, sort, primary)), Unbounded))
            .next()
            .filter(|(&(tid, _, _), _)| tid == table)
            .map(|(&(_, s, pk), _)| (SecondaryValue::from_sort_key(kind, s), pk))
    }

    pub fn prev_secondary(
        &self,
        kind: IndexKind,
        table: TableId,
        value: SecondaryValue,
        primary: u64,
    ) -> Option<(SecondaryValue, u64)> {
        let sort = value.sort_key();
        self.secondary[kind.slot()]
            .by_key
            .range((Unbounded, Excluded((table, sort, primary))))
            .next_back()
            .filter(|(&(tid, _, _), _)| tid == table)
            .map(|(&(_, s, pk), _)| (SecondaryValue::from_sort_key(kind, s), pk))
    }

    pub fn last_secondary(
        &self,
        kind: IndexKind,
        table: TableId,
    ) -> Option<(SecondaryValue, u64)> {
        self.secondary[kind.slot()]
            .by_key
            .range((
                Included((table, (0, 0), 0)),
                Included((table, (u128::MAX, u128::MAX), u64::MAX)),
            ))
            .next_back()
            .map(|(&(_, s, pk), _)| (SecondaryValue::from_sort_key(kind, s), pk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_ee::types::name_from_str;

    fn table_key() -> TableKey {
        TableKey {
            code: name_from_str("code"),
            scope: name_from_str("scope"),
            table: name_from_str("table"),
        }
    }

    fn payer() -> AccountName {
        name_from_str("payer")
    }

    #[test]
    fn primary_rows_iterate_in_order() {
        let mut db = ChainDatabase::new();
        let tid = db.create_table(table_key(), payer());
        for pk in [5u64, 1, 9, 3] {
            db.insert_row(tid, pk, payer(), vec![pk as u8]);
        }
        assert_eq!(db.lowerbound_primary(tid, 0), Some(1));
        assert_eq!(db.lowerbound_primary(tid, 3), Some(3));
        assert_eq!(db.upperbound_primary(tid, 3), Some(5));
        assert_eq!(db.next_primary(tid, 5), Some(9));
        assert_eq!(db.prev_primary(tid, 5), Some(3));
        assert_eq!(db.last_primary(tid), Some(9));
        assert_eq!(db.table_meta(tid).unwrap().row_count, 4);
    }

    #[test]
    fn revert_restores_rows_and_counts() {
        let mut db = ChainDatabase::new();
        let tid = db.create_table(table_key(), payer());
        db.insert_row(tid, 1, payer(), vec![1]);

        let depth = db.push_undo_layer();
        db.insert_row(tid, 2, payer(), vec![2]);
        db.modify_row(tid, 1, payer(), vec![9]);
        db.remove_row(tid, 1);
        db.revert(depth);

        assert_eq!(db.row(tid, 1).unwrap().value, vec![1]);
        assert!(db.row(tid, 2).is_none());
        assert_eq!(db.table_meta(tid).unwrap().row_count, 1);
    }

    #[test]
    fn nested_sessions_compose() {
        let mut db = ChainDatabase::new();
        let outer = db.push_undo_layer();
        let tid = db.create_table(table_key(), payer());
        db.insert_row(tid, 1, payer(), vec![1]);

        let inner = db.push_undo_layer();
        db.insert_row(tid, 2, payer(), vec![2]);
        db.commit(inner);

        // inner changes survive their commit but roll back with the outer
        assert!(db.row(tid, 2).is_some());
        db.revert(outer);
        assert!(db.find_table(table_key()).is_none());
        assert!(db.row(tid, 1).is_none());
        assert!(db.row(tid, 2).is_none());
    }

    #[test]
    fn secondary_index_walk() {
        let mut db = ChainDatabase::new();
        let tid = db.create_table(table_key(), payer());
        for (pk, key) in [(1u64, 30u64), (2, 10), (3, 20), (4, 20)] {
            db.insert_row(tid, pk, payer(), vec![]);
            db.insert_secondary(tid, SecondaryValue::U64(key), pk, payer());
        }

        let (v, pk) = db.lowerbound_secondary(tid, SecondaryValue::U64(15)).unwrap();
        assert_eq!((v, pk), (SecondaryValue::U64(20), 3));
        let (v, pk) = db.upperbound_secondary(tid, SecondaryValue::U64(20)).unwrap();
        assert_eq!((v, pk), (SecondaryValue::U64(30), 1));
        // duplicate keys order by primary
        let (_, pk) = db
            .next_secondary(IndexKind::U64, tid, SecondaryValue::U64(20), 3)
            .unwrap();
        assert_eq!(pk, 4);
        assert!(db.find_secondary(tid, SecondaryValue::U64(15)).is_none());
        let (_, pk) = db.find_secondary(tid, SecondaryValue::U64(10)).unwrap();
        assert_eq!(pk, 2);
        let (v, pk) = db.last_secondary(IndexKind::U64, tid).unwrap();
        assert_eq!((v, pk), (SecondaryValue::U64(30), 1));
    }

    #[test]
    fn secondary_update_and_revert() {
        let mut db = ChainDatabase::new();
        let tid = db.create_table(table_key(), payer());
        db.insert_row(tid, 7, payer(), vec![]);
        db.insert_secondary(tid, SecondaryValue::U64(100), 7, payer());

        let depth = db.push_undo_layer();
        assert!(db.update_secondary(tid, 7, SecondaryValue::U64(5), payer()));
        let (v, _) = db.secondary_by_primary(IndexKind::U64, tid, 7).unwrap();
        assert_eq!(v, SecondaryValue::U64(5));
        db.revert(depth);
        let (v, _) = db.secondary_by_primary(IndexKind::U64, tid, 7).unwrap();
        assert_eq!(v, SecondaryValue::U64(100));
    }

    #[test]
    fn float_keys_order_and_roundtrip() {
        let mut db = ChainDatabase::new();
        let tid = db.create_table(table_key(), payer());
        let keys = [(-2.5f64, 1u64), (0.0, 2), (1.5, 3)];
        for (f, pk) in keys {
            db.insert_row(tid, pk, payer(), vec![]);
            db.insert_secondary(tid, SecondaryValue::F64(f.to_bits()), pk, payer());
        }
        let (v, pk) = db
            .lowerbound_secondary(tid, SecondaryValue::F64((-10.0f64).to_bits()))
            .unwrap();
        assert_eq!((v, pk), (SecondaryValue::F64((-2.5f64).to_bits()), 1));
        // -0.0 finds the +0.0 row
        let (_, pk) = db
            .find_secondary(tid, SecondaryValue::F64((-0.0f64).to_bits()))
            .unwrap();
        assert_eq!(pk, 2);
    }

    #[test]
    fn token_and_fee_maps_revert() {
        let mut db = ChainDatabase::new();
        let t = name_from_str("token");
        let alice = name_from_str("alice");
        let depth = db.push_undo_layer();
        db.set_token_balance(t, alice, 100);
        db.set_fee_entry(TransactionFeeObject {
            code: t,
            action: name_from_str("transfer"),
            value: 50,
            fee_type: crate::objects::FEE_TYPE_FIXED_PER_ACTION,
        });
        let version = db.set_system_token_list(vec![SystemToken {
            token_id: t,
            token_weight: SystemToken::weight_1x(),
        }]);
        assert_eq!(version, 1);
        db.revert(depth);
        assert!(db.token_balance(t, alice).is_none());
        assert!(db.fee_entry(t, name_from_str("transfer")).is_none());
        assert_eq!(db.system_token_list().version, 0);
        assert!(db.system_token_list().tokens.is_empty());
    }
}
