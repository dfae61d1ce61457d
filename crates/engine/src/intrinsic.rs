//! Transaction intrinsic gas with schedule overrides.
//!
//! Mirrors the protocol intrinsic-gas formula with every term read through
//! the schedule. Only invoked when the schedule carries a `TX_*` override;
//! the baseline execution reports the provider's own value.

use bytes::Bytes;
use gascope_common::ChainRules;
use gascope_common::types::Transaction;

use crate::constants::*;
use crate::schedule::{GasSchedule, keys};

/// Intrinsic gas plus the EIP-7623 floor for a transaction.
///
/// Arithmetic is checked; any overflow returns `(0, 0)`, marking the
/// transaction ineligible under the proposed schedule.
#[expect(clippy::too_many_arguments)]
pub fn intrinsic_gas(
    schedule: &GasSchedule,
    data: &Bytes,
    access_list_len: u64,
    storage_keys_len: u64,
    is_contract_creation: bool,
    is_aa_txn: bool,
    authorizations_len: u64,
    rules: &ChainRules,
) -> (u64, u64) {
    let mut gas = if is_contract_creation && rules.is_homestead {
        schedule.get_or(keys::TX_CREATE_BASE, TX_GAS_CONTRACT_CREATION)
    } else if is_aa_txn {
        // Account-abstraction base cost stays fixed; the override surface
        // stops at ordinary transaction framing.
        TX_AA_GAS
    } else {
        schedule.get_or(keys::TX_BASE, TX_GAS)
    };

    let mut floor_gas = schedule.get_or(keys::TX_BASE, TX_GAS);

    let data_len = u64::try_from(data.len()).unwrap_or(u64::MAX);
    if data_len > 0 {
        let mut non_zero_bytes: u64 = 0;
        for byte in data.iter() {
            if *byte != 0 {
                non_zero_bytes += 1;
            }
        }

        // Pre-Istanbul calldata was priced at 68 per non-zero byte; the
        // EIP-2028 repricing drops the default to 16.
        let non_zero_gas_default = if rules.is_istanbul {
            TX_DATA_NON_ZERO_GAS_EIP2028
        } else {
            TX_DATA_NON_ZERO_GAS_FRONTIER
        };
        let non_zero_gas = schedule.get_or(keys::TX_DATA_NONZERO, non_zero_gas_default);

        let Some(product) = non_zero_bytes.checked_mul(non_zero_gas) else {
            return (0, 0);
        };
        let Some(total) = gas.checked_add(product) else {
            return (0, 0);
        };
        gas = total;

        let zero_bytes = data_len - non_zero_bytes;
        let Some(product) =
            zero_bytes.checked_mul(schedule.get_or(keys::TX_DATA_ZERO, TX_DATA_ZERO_GAS))
        else {
            return (0, 0);
        };
        let Some(total) = gas.checked_add(product) else {
            return (0, 0);
        };
        gas = total;

        if is_contract_creation && rules.is_shanghai {
            let num_words = crate::gas::to_word_size(data_len);
            let Some(product) = num_words
                .checked_mul(schedule.get_or(keys::TX_INIT_CODE_WORD, INIT_CODE_WORD_GAS))
            else {
                return (0, 0);
            };
            let Some(total) = gas.checked_add(product) else {
                return (0, 0);
            };
            gas = total;
        }

        if rules.is_prague {
            let Some(token_len) = non_zero_bytes
                .checked_mul(3)
                .and_then(|nz| data_len.checked_add(nz))
            else {
                return (0, 0);
            };
            let Some(data_gas) = token_len.checked_mul(
                schedule.get_or(keys::TX_FLOOR_PER_TOKEN, TX_TOTAL_COST_FLOOR_PER_TOKEN),
            ) else {
                return (0, 0);
            };
            let Some(total) = floor_gas.checked_add(data_gas) else {
                return (0, 0);
            };
            floor_gas = total;
        }
    }

    if access_list_len > 0 {
        let Some(product) = access_list_len
            .checked_mul(schedule.get_or(keys::TX_ACCESS_LIST_ADDR, TX_ACCESS_LIST_ADDRESS_GAS))
        else {
            return (0, 0);
        };
        let Some(total) = gas.checked_add(product) else {
            return (0, 0);
        };
        gas = total;

        let Some(product) = storage_keys_len
            .checked_mul(schedule.get_or(keys::TX_ACCESS_LIST_KEY, TX_ACCESS_LIST_STORAGE_KEY_GAS))
        else {
            return (0, 0);
        };
        let Some(total) = gas.checked_add(product) else {
            return (0, 0);
        };
        gas = total;
    }

    let Some(product) =
        authorizations_len.checked_mul(schedule.get_or(keys::TX_AUTH_COST, TX_AUTH_TUPLE_GAS))
    else {
        return (0, 0);
    };
    let Some(total) = gas.checked_add(product) else {
        return (0, 0);
    };
    gas = total;

    (gas, floor_gas)
}

/// Intrinsic gas for a transaction from the block reader's model.
pub fn intrinsic_gas_for_tx(
    schedule: &GasSchedule,
    tx: &Transaction,
    rules: &ChainRules,
) -> (u64, u64) {
    intrinsic_gas(
        schedule,
        &tx.data,
        tx.access_list_len(),
        tx.storage_keys_len(),
        tx.is_contract_creation(),
        false,
        tx.authorization_count,
        rules,
    )
}
