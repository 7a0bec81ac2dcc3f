//!
//! The database iterator bridge of the apply context.
//!
//! Tables are addressed by `(code, scope, table)`; reads may address any
//! code, writes only the receiver's own tables. RAM for rows and table
//! bookkeeping is billed to the row payer at mutation time. Iterator
//! handles follow the conventions in [`crate::iterator`].
//!

use crate::apply::ApplyContext;
use chain_ee::config::{BILLABLE_SIZE_ROW, BILLABLE_SIZE_TABLE};
use chain_ee::types::Name;
use chain_ee::ChainError;
use state_store::{IndexKind, SecondaryValue, TableId, TableKey};

use crate::iterator::secondary_position;

impl ApplyContext<'_, '_> {
    fn find_table(&self, code: Name, scope: Name, table: Name) -> Option<TableId> {
        self.dbr().find_table(TableKey { code, scope, table })
    }

    fn find_or_create_table(&mut self, scope: Name, table: Name, payer: Name) -> TableId {
        let key = TableKey {
            code: self.receiver,
            scope,
            table,
        };
        if let Some(id) = self.dbr().find_table(key) {
            return id;
        }
        let id = self.db().create_table(key, payer);
        self.add_ram_usage(payer, BILLABLE_SIZE_TABLE);
        id
    }

    /// Removes a table whose last row just vanished, refunding its payer.
    fn remove_table_if_empty(&mut self, table: TableId) {
        let (payer, empty) = match self.dbr().table_meta(table) {
            Some(meta) => (meta.payer, meta.row_count == 0),
            None => return,
        };
        if empty {
            self.db().remove_table(table);
            self.add_ram_usage(payer, -BILLABLE_SIZE_TABLE);
        }
    }

    fn check_write_access(&self, table: TableId) -> Result<(), ChainError> {
        let meta = self
            .dbr()
            .table_meta(table)
            .ok_or_else(|| ChainError::db_api("table not found"))?;
        if meta.key.code != self.receiver {
            return Err(ChainError::db_api(
                "db access violation: may only mutate tables owned by the receiver",
            ));
        }
        Ok(())
    }

    // ---- primary index ----

    pub fn db_store_i64(
        &mut self,
        scope: Name,
        table: Name,
        payer: Name,
        id: u64,
        value: &[u8],
    ) -> Result<i32, ChainError> {
        if payer == Name(0) {
            return Err(ChainError::db_api(
                "must specify a valid account to pay for new record",
            ));
        }
        let tid = self.find_or_create_table(scope, table, payer);
        if self.dbr().row(tid, id).is_some() {
            return Err(ChainError::db_api("record with this primary key already exists"));
        }
        self.db().insert_row(tid, id, payer, value.to_vec());
        self.add_ram_usage(payer, BILLABLE_SIZE_ROW + value.len() as i64);
        Ok(self.primary_itr.add(tid, id))
    }

    pub fn db_update_i64(
        &mut self,
        iterator: i32,
        payer: Name,
        value: &[u8],
    ) -> Result<(), ChainError> {
        let (tid, pk) = self.primary_itr.get(iterator)?;
        self.check_write_access(tid)?;
        let old = self
            .dbr()
            .row(tid, pk)
            .cloned()
            .ok_or_else(|| ChainError::db_api("invalid iterator"))?;
        let payer = if payer == Name(0) { old.payer } else { payer };

        let old_size = BILLABLE_SIZE_ROW + old.value.len() as i64;
        let new_size = BILLABLE_SIZE_ROW + value.len() as i64;
        if payer != old.payer {
            self.add_ram_usage(old.payer, -old_size);
            self.add_ram_usage(payer, new_size);
        } else if old_size != new_size {
            self.add_ram_usage(payer, new_size - old_size);
        }
        self.db().modify_row(tid, pk, payer, value.to_vec());
        Ok(())
    }

    pub fn db_remove_i64(&mut self, iterator: i32) -> Result<(), ChainError> {
        let (tid, pk) = self.primary_itr.get(iterator)?;
        self.check_write_access(tid)?;
        let removed = self
            .db()
            .remove_row(tid, pk)
            .ok_or_else(|| ChainError::db_api("invalid iterator"))?;
        self.add_ram_usage(
            removed.payer,
            -(BILLABLE_SIZE_ROW + removed.value.len() as i64),
        );
        self.remove_table_if_empty(tid);
        self.primary_itr.remove(iterator);
        Ok(())
    }

    pub fn db_get_i64(&self, iterator: i32) -> Result<&[u8], ChainError> {
        let (tid, pk) = self.primary_itr.get(iterator)?;
        self.dbr()
            .row(tid, pk)
            .map(|row| row.value.as_slice())
            .ok_or_else(|| ChainError::db_api("invalid iterator"))
    }

    pub fn db_next_i64(&mut self, iterator: i32) -> Result<(i32, Option<u64>), ChainError> {
        if iterator < -1 {
            // cannot step past an end iterator
            return Ok((-1, None));
        }
        let (tid, pk) = self.primary_itr.get(iterator)?;
        match self.dbr().next_primary(tid, pk) {
            Some(next) => Ok((self.primary_itr.add(tid, next), Some(next))),
            None => Ok((self.primary_itr.end_iterator(tid), None)),
        }
    }

    pub fn db_previous_i64(&mut self, iterator: i32) -> Result<(i32, Option<u64>), ChainError> {
        if iterator < -1 {
            let tid = self.primary_itr.table_of_end(iterator)?;
            return match self.dbr().last_primary(tid) {
                Some(pk) => Ok((self.primary_itr.add(tid, pk), Some(pk))),
                None => Ok((-1, None)),
            };
        }
        let (tid, pk) = self.primary_itr.get(iterator)?;
        match self.dbr().prev_primary(tid, pk) {
            Some(prev) => Ok((self.primary_itr.add(tid, prev), Some(prev))),
            None => Ok((-1, None)),
        }
    }

    pub fn db_find_i64(&mut self, code: Name, scope: Name, table: Name, id: u64) -> i32 {
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return -1,
        };
        if self.dbr().row(tid, id).is_some() {
            self.primary_itr.add(tid, id)
        } else {
            self.primary_itr.end_iterator(tid)
        }
    }

    pub fn db_lowerbound_i64(&mut self, code: Name, scope: Name, table: Name, id: u64) -> i32 {
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return -1,
        };
        match self.dbr().lowerbound_primary(tid, id) {
            Some(pk) => self.primary_itr.add(tid, pk),
            None => self.primary_itr.end_iterator(tid),
        }
    }

    pub fn db_upperbound_i64(&mut self, code: Name, scope: Name, table: Name, id: u64) -> i32 {
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return -1,
        };
        match self.dbr().upperbound_primary(tid, id) {
            Some(pk) => self.primary_itr.add(tid, pk),
            None => self.primary_itr.end_iterator(tid),
        }
    }

    pub fn db_end_i64(&mut self, code: Name, scope: Name, table: Name) -> i32 {
        match self.find_table(code, scope, table) {
            Some(tid) => self.primary_itr.end_iterator(tid),
            None => -1,
        }
    }

    // ---- secondary indices ----

    fn sec_cache(&mut self, kind: IndexKind) -> &mut crate::iterator::SecondaryCache {
        &mut self.secondary_itr[kind.slot()]
    }

    pub fn db_idx_store(
        &mut self,
        scope: Name,
        table: Name,
        payer: Name,
        id: u64,
        value: SecondaryValue,
    ) -> Result<i32, ChainError> {
        if payer == Name(0) {
            return Err(ChainError::db_api(
                "must specify a valid account to pay for new record",
            ));
        }
        let kind = value.kind();
        let tid = self.find_or_create_table(scope, table, payer);
        if self.dbr().secondary_by_primary(kind, tid, id).is_some() {
            return Err(ChainError::db_api(
                "secondary index entry for this primary key already exists",
            ));
        }
        self.db().insert_secondary(tid, value, id, payer);
        self.add_ram_usage(payer, BILLABLE_SIZE_ROW + kind.key_size() as i64);
        Ok(self.sec_cache(kind).add(tid, secondary_position(value, id)))
    }

    pub fn db_idx_update(
        &mut self,
        kind: IndexKind,
        iterator: i32,
        payer: Name,
        value: SecondaryValue,
    ) -> Result<(), ChainError> {
        if value.kind() != kind {
            return Err(ChainError::db_api("secondary value type mismatch"));
        }
        let (tid, (_, pk)) = self.sec_cache(kind).get(iterator)?;
        self.check_write_access(tid)?;
        let (_, old_payer) = self
            .dbr()
            .secondary_by_primary(kind, tid, pk)
            .ok_or_else(|| ChainError::db_api("invalid iterator"))?;
        let payer = if payer == Name(0) { old_payer } else { payer };
        if payer != old_payer {
            let size = BILLABLE_SIZE_ROW + kind.key_size() as i64;
            self.add_ram_usage(old_payer, -size);
            self.add_ram_usage(payer, size);
        }
        self.db().update_secondary(tid, pk, value, payer);
        self.sec_cache(kind)
            .update(iterator, secondary_position(value, pk));
        Ok(())
    }

    pub fn db_idx_remove(&mut self, kind: IndexKind, iterator: i32) -> Result<(), ChainError> {
        let (tid, (_, pk)) = self.sec_cache(kind).get(iterator)?;
        self.check_write_access(tid)?;
        let (_, payer) = self
            .dbr()
            .secondary_by_primary(kind, tid, pk)
            .ok_or_else(|| ChainError::db_api("invalid iterator"))?;
        self.db().remove_secondary(kind, tid, pk);
        self.add_ram_usage(payer, -(BILLABLE_SIZE_ROW + kind.key_size() as i64));
        self.remove_table_if_empty(tid);
        self.sec_cache(kind).remove(iterator);
        Ok(())
    }

    pub fn db_idx_find_secondary(
        &mut self,
        code: Name,
        scope: Name,
        table: Name,
        value: SecondaryValue,
    ) -> (i32, Option<u64>) {
        let kind = value.kind();
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return (-1, None),
        };
        match self.dbr().find_secondary(tid, value) {
            Some((found, pk)) => (
                self.sec_cache(kind).add(tid, secondary_position(found, pk)),
                Some(pk),
            ),
            None => (self.sec_cache(kind).end_iterator(tid), None),
        }
    }

    pub fn db_idx_find_primary(
        &mut self,
        kind: IndexKind,
        code: Name,
        scope: Name,
        table: Name,
        primary: u64,
    ) -> (i32, Option<SecondaryValue>) {
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return (-1, None),
        };
        match self.dbr().secondary_by_primary(kind, tid, primary) {
            Some((value, _)) => (
                self.sec_cache(kind)
                    .add(tid, secondary_position(value, primary)),
                Some(value),
            ),
            None => (self.sec_cache(kind).end_iterator(tid), None),
        }
    }

    pub fn db_idx_lowerbound(
        &mut self,
        code: Name,
        scope: Name,
        table: Name,
        value: SecondaryValue,
    ) -> (i32, Option<(SecondaryValue, u64)>) {
        let kind = value.kind();
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return (-1, None),
        };
        match self.dbr().lowerbound_secondary(tid, value) {
            Some((found, pk)) => (
                self.sec_cache(kind).add(tid, secondary_position(found, pk)),
                Some((found, pk)),
            ),
            None => (self.sec_cache(kind).end_iterator(tid), None),
        }
    }

    pub fn db_idx_upperbound(
        &mut self,
        code: Name,
        scope: Name,
        table: Name,
        value: SecondaryValue,
    ) -> (i32, Option<(SecondaryValue, u64)>) {
        let kind = value.kind();
        let tid = match self.find_table(code, scope, table) {
            Some(tid) => tid,
            None => return (-1, None),
        };
        match self.dbr().upperbound_secondary(tid, value) {
            Some((found, pk)) => (
                self.sec_cache(kind).add(tid, secondary_position(found, pk)),
                Some((found, pk)),
            ),
            None => (self.sec_cache(kind).end_iterator(tid), None),
        }
    }

    pub fn db_idx_end(&mut self, kind: IndexKind, code: Name, scope: Name, table: Name) -> i32 {
        match self.find_table(code, scope, table) {
            Some(tid) => self.sec_cache(kind).end_iterator(tid),
            None => -1,
        }
    }

    pub fn db_idx_next(
        &mut self,
        kind: IndexKind,
        iterator: i32,
    ) -> Result<(i32, Option<u64>), ChainError> {
        if iterator < -1 {
            return Ok((-1, None));
        }
        let (tid, (sort, pk)) = self.sec_cache(kind).get(iterator)?;
        let value = SecondaryValue::from_sort_key(kind, sort);
        match self.dbr().next_secondary(kind, tid, value, pk) {
            Some((next, next_pk)) => Ok((
                self.sec_cache(kind)
                    .add(tid, secondary_position(next, next_pk)),
                Some(next_pk),
            )),
            None => Ok((self.sec_cache(kind).end_iterator(tid), None)),
        }
    }

    pub fn db_idx_previous(
        &mut self,
        kind: IndexKind,
        iterator: i32,
    ) -> Result<(i32, Option<u64>), ChainError> {
        if iterator < -1 {
            let tid = self.sec_cache(kind).table_of_end(iterator)?;
            return match self.dbr().last_secondary(kind, tid) {
                Some((value, pk)) => Ok((
                    self.sec_cache(kind).add(tid, secondary_position(value, pk)),
                    Some(pk),
                )),
                None => Ok((-1, None)),
            };
        }
        let (tid, (sort, pk)) = self.sec_cache(kind).get(iterator)?;
        let value = SecondaryValue::from_sort_key(kind, sort);
        match self.dbr().prev_secondary(kind, tid, value, pk) {
            Some((prev, prev_pk)) => Ok((
                self.sec_cache(kind)
                    .add(tid, secondary_position(prev, prev_pk)),
                Some(prev_pk),
            )),
            None => Ok((-1, None)),
        }
    }

    /// The stored secondary value for an iterator, for read-back intrinsics.
    pub fn db_idx_value(
        &mut self,
        kind: IndexKind,
        iterator: i32,
    ) -> Result<SecondaryValue, ChainError> {
        let (_, (sort, _)) = self.sec_cache(kind).get(iterator)?;
        Ok(SecondaryValue::from_sort_key(kind, sort))
    }
}
