//!
//! Actions and transactions as they travel between guest and host.
//!

use super::{AccountName, ActionName, PermissionName, TimePointSec};
use crate::codec::{CodecError, Pack, Unpack};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: PermissionName,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Action {
    pub account: AccountName,
    pub name: ActionName,
    pub authorization: Vec<PermissionLevel>,
    pub data: Vec<u8>,
}

/// Header fields shared by every transaction; the remaining fields follow in
/// declaration order when packed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TransactionHeader {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub delay_sec: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
}

impl Transaction {
    /// The account fees for this transaction are charged to: the actor of
    /// the first authorization of the first action.
    pub fn first_authorizer(&self) -> Option<AccountName> {
        self.actions
            .first()
            .and_then(|a| a.authorization.first())
            .map(|p| p.actor)
    }
}

impl Pack for PermissionLevel {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.actor.pack_into(out);
        self.permission.pack_into(out);
    }
}

impl Unpack for PermissionLevel {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(PermissionLevel {
            actor: AccountName::unpack_from(input)?,
            permission: PermissionName::unpack_from(input)?,
        })
    }
}

impl Pack for Action {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.account.pack_into(out);
        self.name.pack_into(out);
        self.authorization.pack_into(out);
        self.data.pack_into(out);
    }
}

impl Unpack for Action {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Action {
            account: AccountName::unpack_from(input)?,
            name: ActionName::unpack_from(input)?,
            authorization: Vec::<PermissionLevel>::unpack_from(input)?,
            data: Vec::<u8>::unpack_from(input)?,
        })
    }
}

impl Pack for TransactionHeader {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.expiration.pack_into(out);
        self.ref_block_num.pack_into(out);
        self.ref_block_prefix.pack_into(out);
        self.delay_sec.pack_into(out);
    }
}

impl Unpack for TransactionHeader {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TransactionHeader {
            expiration: TimePointSec::unpack_from(input)?,
            ref_block_num: u16::unpack_from(input)?,
            ref_block_prefix: u32::unpack_from(input)?,
            delay_sec: u32::unpack_from(input)?,
        })
    }
}

impl Pack for Transaction {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.header.pack_into(out);
        self.context_free_actions.pack_into(out);
        self.actions.pack_into(out);
    }
}

impl Unpack for Transaction {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Transaction {
            header: TransactionHeader::unpack_from(input)?,
            context_free_actions: Vec::<Action>::unpack_from(input)?,
            actions: Vec::<Action>::unpack_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::name_from_str;

    #[test]
    fn action_roundtrip() {
        let act = Action {
            account: name_from_str("eosio.token"),
            name: name_from_str("transfer"),
            authorization: vec![PermissionLevel {
                actor: name_from_str("alice"),
                permission: name_from_str("active"),
            }],
            data: vec![1, 2, 3, 4],
        };
        let packed = act.packed();
        assert_eq!(Action::unpack_all(&packed).unwrap(), act);
    }

    #[test]
    fn transaction_roundtrip_and_first_authorizer() {
        let trx = Transaction {
            header: TransactionHeader {
                expiration: TimePointSec(600),
                ref_block_num: 7,
                ref_block_prefix: 0xdead_beef,
                delay_sec: 0,
            },
            context_free_actions: vec![],
            actions: vec![Action {
                account: name_from_str("eosio"),
                name: name_from_str("voteproducer"),
                authorization: vec![PermissionLevel {
                    actor: name_from_str("bob"),
                    permission: name_from_str("active"),
                }],
                data: vec![],
            }],
        };
        let packed = trx.packed();
        let back = Transaction::unpack_all(&packed).unwrap();
        assert_eq!(back, trx);
        assert_eq!(back.first_authorizer(), Some(name_from_str("bob")));
    }
}
