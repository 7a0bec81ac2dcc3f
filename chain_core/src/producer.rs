//!
//! Proposed producer schedule validation and adoption.
//!

use crate::controller::Controller;
use chain_ee::config::MAX_PRODUCERS;
use chain_ee::types::{BlockSigningAuthority, ProducerAuthority};
use chain_ee::ChainError;
use state_store::ProposedSchedule;
use std::collections::BTreeSet;

///
/// Validates a schedule and stores it as the proposed schedule, returning
/// its version. `validate_keys` is set for the legacy v0 format whose keys
/// arrive unchecked.
///
pub fn set_proposed_producers(
    controller: &mut Controller,
    producers: Vec<ProducerAuthority>,
    validate_keys: bool,
) -> Result<i64, ChainError> {
    if producers.len() > MAX_PRODUCERS {
        return Err(ChainError::wasm_execution(
            "Producer schedule exceeds the maximum producer count for this chain",
        ));
    }
    if producers.is_empty() {
        return Err(ChainError::wasm_execution("Producer schedule cannot be empty"));
    }

    let num_supported_key_types = controller.num_supported_key_types;
    let mut unique_producers = BTreeSet::new();
    for producer in &producers {
        if !controller.db.is_account(producer.producer_name) {
            return Err(ChainError::wasm_execution(
                "producer schedule includes a nonexisting account",
            ));
        }
        let BlockSigningAuthority::V0 { threshold, keys } = &producer.authority;
        let mut sum_weights: u32 = 0;
        let mut unique_keys = BTreeSet::new();
        for kw in keys {
            if kw.key.key_type >= num_supported_key_types {
                return Err(ChainError::UnactivatedKeyType);
            }
            if validate_keys && !key_is_plausible(&kw.key) {
                return Err(ChainError::wasm_execution(
                    "producer schedule includes an invalid key",
                ));
            }
            sum_weights = sum_weights.saturating_add(kw.weight as u32);
            unique_keys.insert(kw.key);
        }
        if unique_keys.len() != keys.len() {
            return Err(ChainError::wasm_execution(
                "producer schedule includes a duplicated key",
            ));
        }
        if *threshold == 0 {
            return Err(ChainError::wasm_execution(
                "producer schedule includes an authority with a threshold of 0",
            ));
        }
        if sum_weights < *threshold {
            return Err(ChainError::wasm_execution(
                "producer schedule includes an unsatisfiable authority",
            ));
        }
        unique_producers.insert(producer.producer_name);
    }
    if unique_producers.len() != producers.len() {
        return Err(ChainError::wasm_execution(
            "duplicate producer name in producer schedule",
        ));
    }

    let version = controller.db.global().schedule_version + 1;
    controller.db.modify_global(|global| {
        global.proposed_schedule = Some(ProposedSchedule {
            version,
            producers: producers.clone(),
        });
    });
    Ok(version as i64)
}

/// A packed key must carry a plausible compressed-point prefix.
fn key_is_plausible(key: &chain_ee::types::PublicKey) -> bool {
    matches!(key.data[0], 0x02 | 0x03)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_ee::types::{name_from_str, KeyWeight, PublicKey, TimePoint};

    fn key(fill: u8) -> PublicKey {
        let mut data = [fill; 33];
        data[0] = 0x02;
        PublicKey { key_type: 0, data }
    }

    fn authority(k: PublicKey) -> BlockSigningAuthority {
        BlockSigningAuthority::V0 {
            threshold: 1,
            keys: vec![KeyWeight { key: k, weight: 1 }],
        }
    }

    #[test]
    fn duplicate_producer_rejected() {
        let mut controller = Controller::new();
        let p = name_from_str("prod");
        controller.db.create_account(p, TimePoint(0));
        let schedule = vec![
            ProducerAuthority {
                producer_name: p,
                authority: authority(key(1)),
            },
            ProducerAuthority {
                producer_name: p,
                authority: authority(key(2)),
            },
        ];
        let err = set_proposed_producers(&mut controller, schedule, true);
        assert_eq!(
            err,
            Err(ChainError::wasm_execution(
                "duplicate producer name in producer schedule"
            ))
        );
    }

    #[test]
    fn valid_schedule_bumps_version() {
        let mut controller = Controller::new();
        let a = name_from_str("proda");
        let b = name_from_str("prodb");
        controller.db.create_account(a, TimePoint(0));
        controller.db.create_account(b, TimePoint(0));
        let schedule = vec![
            ProducerAuthority {
                producer_name: a,
                authority: authority(key(1)),
            },
            ProducerAuthority {
                producer_name: b,
                authority: authority(key(2)),
            },
        ];
        let version = set_proposed_producers(&mut controller, schedule, true).unwrap();
        assert_eq!(version, 1);
        let proposed = controller.db.global().proposed_schedule.clone().unwrap();
        assert_eq!(proposed.producers.len(), 2);
    }

    #[test]
    fn unknown_key_type_rejected() {
        let mut controller = Controller::new();
        let p = name_from_str("prod");
        controller.db.create_account(p, TimePoint(0));
        let mut bad = key(1);
        bad.key_type = 9;
        let schedule = vec![ProducerAuthority {
            producer_name: p,
            authority: authority(bad),
        }];
        assert_eq!(
            set_proposed_producers(&mut controller, schedule, false),
            Err(ChainError::UnactivatedKeyType)
        );
    }

    #[test]
    fn unsatisfiable_authority_rejected() {
        let mut controller = Controller::new();
        let p = name_from_str("prod");
        controller.db.create_account(p, TimePoint(0));
        let schedule = vec![ProducerAuthority {
            producer_name: p,
            authority: BlockSigningAuthority::V0 {
                threshold: 5,
                keys: vec![KeyWeight {
                    key: key(1),
                    weight: 1,
                }],
            },
        }];
        assert!(set_proposed_producers(&mut controller, schedule, true).is_err());
    }
}
