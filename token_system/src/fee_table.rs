//!
//! Transaction-fee table manager.
//!
//! Fees are keyed by `(code, action)`. Two sentinel keys provide fallbacks:
//! `(0, action)` for the built-in common actions every account has, and
//! `(0, 0)` for the chain-wide default. A lookup walks exact → common →
//! default → hard-coded constant.
//!

use chain_ee::codec::{CodecError, Pack, Unpack};
use chain_ee::config::DEFAULT_TX_FEE_VALUE;
use chain_ee::types::{AccountName, ActionName, Name};
use chain_ee::ChainError;
use state_store::{ChainDatabase, TransactionFeeObject, FEE_TYPE_FIXED_PER_ACTION};

/// The resolved fee for one action, as returned to guest code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TxFeeForAction {
    pub value: i64,
    pub fee_type: u32,
}

impl Pack for TxFeeForAction {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.value.pack_into(out);
        self.fee_type.pack_into(out);
    }
}

impl Unpack for TxFeeForAction {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TxFeeForAction {
            value: i64::unpack_from(input)?,
            fee_type: u32::unpack_from(input)?,
        })
    }
}

pub fn set_tx_fee_for_action(
    db: &mut ChainDatabase,
    code: AccountName,
    action: ActionName,
    value: i64,
    fee_type: u32,
) -> Result<(), ChainError> {
    if value < 0 {
        return Err(ChainError::TransactionFee(
            "tx fee value must be >= 0".into(),
        ));
    }
    if fee_type != FEE_TYPE_FIXED_PER_ACTION {
        return Err(ChainError::TransactionFee(
            "currently set_tx_fee_for_action supports only fixed_tx_fee_per_action_type".into(),
        ));
    }
    db.set_fee_entry(TransactionFeeObject {
        code,
        action,
        value,
        fee_type,
    });
    Ok(())
}

pub fn set_tx_fee_for_common_action(
    db: &mut ChainDatabase,
    action: ActionName,
    value: i64,
    fee_type: u32,
) -> Result<(), ChainError> {
    set_tx_fee_for_action(db, Name(0), action, value, fee_type)
}

pub fn set_default_tx_fee(
    db: &mut ChainDatabase,
    value: i64,
    fee_type: u32,
) -> Result<(), ChainError> {
    set_tx_fee_for_action(db, Name(0), Name(0), value, fee_type)
}

/// Deleting requires the row to exist.
pub fn unset_tx_fee_entry_for_action(
    db: &mut ChainDatabase,
    code: AccountName,
    action: ActionName,
) -> Result<(), ChainError> {
    if !db.remove_fee_entry(code, action) {
        return Err(ChainError::TransactionFee("tx fee db row not found".into()));
    }
    Ok(())
}

pub fn get_tx_fee_for_action(
    db: &ChainDatabase,
    code: AccountName,
    action: ActionName,
) -> TxFeeForAction {
    for key in [(code, action), (Name(0), action), (Name(0), Name(0))] {
        if let Some(entry) = db.fee_entry(key.0, key.1) {
            return TxFeeForAction {
                value: entry.value,
                fee_type: entry.fee_type,
            };
        }
    }
    TxFeeForAction {
        value: DEFAULT_TX_FEE_VALUE,
        fee_type: FEE_TYPE_FIXED_PER_ACTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_ee::types::name_from_str;

    #[test]
    fn lookup_falls_back_in_order() {
        let mut db = ChainDatabase::new();
        let code = name_from_str("dex");
        let action = name_from_str("settle");

        // nothing configured: hard default
        let fee = get_tx_fee_for_action(&db, code, action);
        assert_eq!(fee.value, DEFAULT_TX_FEE_VALUE);

        set_default_tx_fee(&mut db, 500, FEE_TYPE_FIXED_PER_ACTION).unwrap();
        assert_eq!(get_tx_fee_for_action(&db, code, action).value, 500);

        set_tx_fee_for_common_action(&mut db, action, 300, FEE_TYPE_FIXED_PER_ACTION).unwrap();
        assert_eq!(get_tx_fee_for_action(&db, code, action).value, 300);

        set_tx_fee_for_action(&mut db, code, action, 100, FEE_TYPE_FIXED_PER_ACTION).unwrap();
        assert_eq!(get_tx_fee_for_action(&db, code, action).value, 100);

        // another action on the same code still resolves to the common fee
        let other = name_from_str("cancel");
        assert_eq!(get_tx_fee_for_action(&db, code, other).value, 500);
    }

    #[test]
    fn setter_validation() {
        let mut db = ChainDatabase::new();
        let code = name_from_str("dex");
        let action = name_from_str("settle");
        assert!(set_tx_fee_for_action(&mut db, code, action, -1, FEE_TYPE_FIXED_PER_ACTION).is_err());
        assert!(set_tx_fee_for_action(&mut db, code, action, 10, 99).is_err());
    }

    #[test]
    fn unset_requires_existing_row() {
        let mut db = ChainDatabase::new();
        let code = name_from_str("dex");
        let action = name_from_str("settle");
        assert!(unset_tx_fee_entry_for_action(&mut db, code, action).is_err());
        set_tx_fee_for_action(&mut db, code, action, 10, FEE_TYPE_FIXED_PER_ACTION).unwrap();
        unset_tx_fee_entry_for_action(&mut db, code, action).unwrap();
        assert!(db.fee_entry(code, action).is_none());
    }
}
