//!
//! Read-only view of the transaction-vote accumulator. The accumulator
//! itself (decay, accrual per transaction) lives outside this core; the
//! intrinsics only page through its sorted snapshot.
//!

use chain_ee::codec::{CodecError, Pack, Unpack};
use chain_ee::types::AccountName;

/// One vote receiver with its decayed weighted vote amount.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TxVoteStatForAccount {
    pub account: AccountName,
    pub tx_votes_weighted: f64,
    pub tx_votes: i64,
}

impl Pack for TxVoteStatForAccount {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.account.pack_into(out);
        out.extend_from_slice(&self.tx_votes_weighted.to_bits().to_le_bytes());
        self.tx_votes.pack_into(out);
    }
}

impl Unpack for TxVoteStatForAccount {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let account = AccountName::unpack_from(input)?;
        let weighted_bits = u64::unpack_from(input)?;
        let tx_votes = i64::unpack_from(input)?;
        Ok(TxVoteStatForAccount {
            account,
            tx_votes_weighted: f64::from_bits(weighted_bits),
            tx_votes,
        })
    }
}

impl Pack for Vec<TxVoteStatForAccount> {
    fn pack_into(&self, out: &mut Vec<u8>) {
        chain_ee::codec::VarUint32(self.len() as u32).pack_into(out);
        for stat in self {
            stat.pack_into(out);
        }
    }
}

pub trait TransactionVoteLedger {
    /// Sorted by decayed weighted vote amount, descending; `offset_rank`
    /// skips the first n receivers for pagination.
    fn top_vote_receivers(&self, offset_rank: u32, limit: u32) -> Vec<TxVoteStatForAccount>;

    fn total_weighted_votes(&self) -> f64;
}

#[derive(Default)]
pub struct NullVoteLedger;

impl TransactionVoteLedger for NullVoteLedger {
    fn top_vote_receivers(&self, _offset_rank: u32, _limit: u32) -> Vec<TxVoteStatForAccount> {
        Vec::new()
    }

    fn total_weighted_votes(&self) -> f64 {
        0.0
    }
}
