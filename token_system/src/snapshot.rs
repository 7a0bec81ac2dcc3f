//!
//! Snapshot sections contributed by the token and fee managers: rows are
//! written one section per index, in index order.
//!

use chain_ee::codec::CodecError;
use chain_ee::snapshot::{read_packed_rows, write_packed_rows, SnapshotReader, SnapshotWriter};
use state_store::{
    ChainDatabase, SystemToken, TokenBalanceObject, TokenMetaObject, TransactionFeeObject,
};

pub const SECTION_TOKEN_META: &str = "token_meta";
pub const SECTION_TOKEN_BALANCE: &str = "token_balance";
pub const SECTION_TRANSACTION_FEE: &str = "transaction_fee";
pub const SECTION_SYSTEM_TOKEN_LIST: &str = "system_token_list_version";

pub fn add_to_snapshot(db: &ChainDatabase, writer: &mut dyn SnapshotWriter) {
    write_packed_rows(writer, SECTION_TOKEN_META, db.token_meta_rows().cloned());
    write_packed_rows(writer, SECTION_TOKEN_BALANCE, db.token_balance_rows());
    write_packed_rows(writer, SECTION_TRANSACTION_FEE, db.fee_rows().copied());
    let list = db.system_token_list();
    writer.write_section(SECTION_SYSTEM_TOKEN_LIST, &mut |emit| {
        use chain_ee::codec::Pack;
        let mut row = Vec::new();
        list.version.pack_into(&mut row);
        list.tokens.pack_into(&mut row);
        emit(row);
    });
}

pub fn read_from_snapshot(
    db: &mut ChainDatabase,
    reader: &dyn SnapshotReader,
) -> Result<(), CodecError> {
    for meta in read_packed_rows::<TokenMetaObject>(reader, SECTION_TOKEN_META)? {
        db.create_token_meta(meta);
    }
    for row in read_packed_rows::<TokenBalanceObject>(reader, SECTION_TOKEN_BALANCE)? {
        db.set_token_balance(row.token_id, row.account, row.balance);
    }
    for entry in read_packed_rows::<TransactionFeeObject>(reader, SECTION_TRANSACTION_FEE)? {
        db.set_fee_entry(entry);
    }
    reader.read_section(SECTION_SYSTEM_TOKEN_LIST, &mut |bytes| {
        use chain_ee::codec::Unpack;
        let mut input = bytes;
        let version = i64::unpack_from(&mut input)?;
        let tokens = Vec::<SystemToken>::unpack_from(&mut input)?;
        db.restore_system_token_list(version, tokens);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_ee::snapshot::InMemorySnapshot;
    use chain_ee::types::name_from_str;
    use chain_ee::types::{Symbol, SymbolCode};
    use state_store::FEE_TYPE_FIXED_PER_ACTION;

    #[test]
    fn sections_roundtrip() {
        let mut db = ChainDatabase::new();
        let token = name_from_str("tkn");
        db.create_token_meta(TokenMetaObject {
            token_id: token,
            symbol: Symbol::new(4, SymbolCode::from_str_checked("KRW").unwrap()),
            total_supply: 777,
            url: "https://example".into(),
            description: "krw token".into(),
        });
        db.set_token_balance(token, name_from_str("alice"), 777);
        db.set_fee_entry(TransactionFeeObject {
            code: token,
            action: name_from_str("transfer"),
            value: 100,
            fee_type: FEE_TYPE_FIXED_PER_ACTION,
        });
        db.set_system_token_list(vec![SystemToken {
            token_id: token,
            token_weight: SystemToken::weight_1x(),
        }]);

        let mut snapshot = InMemorySnapshot::new();
        add_to_snapshot(&db, &mut snapshot);

        let mut restored = ChainDatabase::new();
        read_from_snapshot(&mut restored, &snapshot).unwrap();
        assert_eq!(restored.token_meta(token).unwrap().total_supply, 777);
        assert_eq!(restored.token_balance(token, name_from_str("alice")), Some(777));
        assert_eq!(
            restored
                .fee_entry(token, name_from_str("transfer"))
                .unwrap()
                .value,
            100
        );
        assert_eq!(restored.system_token_list().version, 1);
        assert_eq!(restored.system_token_list().tokens.len(), 1);
    }
}
