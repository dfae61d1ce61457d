//! Precompile pricing with schedule overrides.
//!
//! Fixed-cost precompiles expose one `PC_<NAME>` key for the whole charge;
//! formula-priced ones expose one key per parameter. The caller passes the
//! charge its own implementation would make (`default_gas`), which covers
//! the precompiles we leave untouched (ECREC and friends) and the MODEXP
//! formula, where only the floor is adjustable.

use crate::constants::*;
use crate::gas::to_word_size;
use crate::schedule::{GasSchedule, keys};

/// Precompile names as dispatched here. The set matches the engine's
/// Prague/Osaka surface.
pub mod names {
    pub const ECREC: &str = "ECREC";
    pub const SHA256: &str = "SHA256";
    pub const RIPEMD160: &str = "RIPEMD160";
    pub const ID: &str = "ID";
    pub const MODEXP: &str = "MODEXP";
    pub const BN254_ADD: &str = "BN254_ADD";
    pub const BN254_MUL: &str = "BN254_MUL";
    pub const BN254_PAIRING: &str = "BN254_PAIRING";
    pub const BLAKE2F: &str = "BLAKE2F";
    pub const KZG_POINT_EVALUATION: &str = "KZG_POINT_EVALUATION";
    pub const BLS12_G1ADD: &str = "BLS12_G1ADD";
    pub const BLS12_G1MSM: &str = "BLS12_G1MSM";
    pub const BLS12_G2ADD: &str = "BLS12_G2ADD";
    pub const BLS12_G2MSM: &str = "BLS12_G2MSM";
    pub const BLS12_PAIRING_CHECK: &str = "BLS12_PAIRING_CHECK";
    pub const BLS12_MAP_FP_TO_G1: &str = "BLS12_MAP_FP_TO_G1";
    pub const BLS12_MAP_FP2_TO_G2: &str = "BLS12_MAP_FP2_TO_G2";
    pub const P256VERIFY: &str = "P256VERIFY";
}

/// Gas for a precompile call under the schedule. Unrecognized names fall
/// back to `default_gas` unchanged.
pub fn precompile_gas(
    schedule: &GasSchedule,
    name: &str,
    input: &[u8],
    default_gas: u64,
) -> u64 {
    match name {
        // Fixed-gas precompiles, one total key each.
        names::ECREC
        | names::BN254_ADD
        | names::BN254_MUL
        | names::BLS12_G1ADD
        | names::BLS12_G2ADD
        | names::BLS12_MAP_FP_TO_G1
        | names::BLS12_MAP_FP2_TO_G2
        | names::KZG_POINT_EVALUATION
        | names::P256VERIFY => {
            let key = format!("PC_{name}");
            schedule.get_or(&key, default_gas)
        }

        names::SHA256 => base_per_word(
            schedule,
            keys::PC_SHA256_BASE,
            keys::PC_SHA256_PER_WORD,
            input,
            SHA256_BASE_GAS,
            SHA256_PER_WORD_GAS,
        ),
        names::RIPEMD160 => base_per_word(
            schedule,
            keys::PC_RIPEMD160_BASE,
            keys::PC_RIPEMD160_PER_WORD,
            input,
            RIPEMD160_BASE_GAS,
            RIPEMD160_PER_WORD_GAS,
        ),
        names::ID => base_per_word(
            schedule,
            keys::PC_ID_BASE,
            keys::PC_ID_PER_WORD,
            input,
            IDENTITY_BASE_GAS,
            IDENTITY_PER_WORD_GAS,
        ),
        names::MODEXP => modexp_floor(schedule, default_gas),
        names::BN254_PAIRING => base_per_pair(
            schedule,
            keys::PC_BN254_PAIRING_BASE,
            keys::PC_BN254_PAIRING_PER_PAIR,
            input,
            BN254_PAIRING_PAIR_LENGTH,
            BN254_PAIRING_BASE_GAS,
            BN254_PAIRING_PER_PAIR_GAS,
        ),
        names::BLAKE2F => blake2f(schedule, input),
        names::BLS12_PAIRING_CHECK => base_per_pair(
            schedule,
            keys::PC_BLS12_PAIRING_CHECK_BASE,
            keys::PC_BLS12_PAIRING_CHECK_PER_PAIR,
            input,
            BLS12_PAIRING_CHECK_PAIR_LENGTH,
            BLS12_PAIRING_CHECK_BASE_GAS,
            BLS12_PAIRING_CHECK_PER_PAIR_GAS,
        ),
        names::BLS12_G1MSM => msm(
            schedule,
            keys::PC_BLS12_G1MSM_MUL_GAS,
            input,
            BLS12_G1_MSM_PAIR_LENGTH,
            BLS12_G1_MUL_GAS,
            &BLS12_G1_MSM_DISCOUNT,
        ),
        names::BLS12_G2MSM => msm(
            schedule,
            keys::PC_BLS12_G2MSM_MUL_GAS,
            input,
            BLS12_G2_MSM_PAIR_LENGTH,
            BLS12_G2_MUL_GAS,
            &BLS12_G2_MSM_DISCOUNT,
        ),

        _ => default_gas,
    }
}

/// `base + per_word × ⌈len/32⌉` (SHA256, RIPEMD160, IDENTITY).
fn base_per_word(
    schedule: &GasSchedule,
    base_key: &str,
    per_word_key: &str,
    input: &[u8],
    default_base: u64,
    default_per_word: u64,
) -> u64 {
    let base = schedule.get_or(base_key, default_base);
    let per_word = schedule.get_or(per_word_key, default_per_word);
    let words = to_word_size(u64::try_from(input.len()).unwrap_or(u64::MAX));
    base.saturating_add(per_word.saturating_mul(words))
}

/// `base + per_pair × (len / pair_size)` (BN254 and BLS12 pairings).
fn base_per_pair(
    schedule: &GasSchedule,
    base_key: &str,
    per_pair_key: &str,
    input: &[u8],
    pair_size: usize,
    default_base: u64,
    default_per_pair: u64,
) -> u64 {
    let base = schedule.get_or(base_key, default_base);
    let per_pair = schedule.get_or(per_pair_key, default_per_pair);
    let pairs = u64::try_from(input.len() / pair_size).unwrap_or(u64::MAX);
    base.saturating_add(per_pair.saturating_mul(pairs))
}

/// `base + per_round × rounds`, with the round count read from the first
/// four input bytes. Anything but the exact 213-byte layout prices to
/// zero; the precompile itself rejects the call downstream.
fn blake2f(schedule: &GasSchedule, input: &[u8]) -> u64 {
    if input.len() != BLAKE2F_INPUT_LENGTH {
        return 0;
    }
    let Some(rounds_bytes) = input.get(0..4) else {
        return 0;
    };
    let Ok(rounds_bytes): Result<[u8; 4], _> = rounds_bytes.try_into() else {
        return 0;
    };
    let rounds = u64::from(u32::from_be_bytes(rounds_bytes));
    let base = schedule.get_or(keys::PC_BLAKE2F_BASE, BLAKE2F_BASE_GAS);
    let per_round = schedule.get_or(keys::PC_BLAKE2F_PER_ROUND, BLAKE2F_PER_ROUND_GAS);
    base.saturating_add(per_round.saturating_mul(rounds))
}

/// `k × mul_gas × discount[k] / 1000`. The discount table is fixed; only
/// the per-point multiplier is a key. Counts past the table clamp to the
/// final entry.
fn msm(
    schedule: &GasSchedule,
    mul_gas_key: &str,
    input: &[u8],
    point_size: usize,
    default_mul_gas: u64,
    discount_table: &[u64; 128],
) -> u64 {
    let k = input.len() / point_size;
    if k == 0 {
        return 0;
    }
    let mul_gas = schedule.get_or(mul_gas_key, default_mul_gas);

    let discount = if k <= discount_table.len() {
        discount_table[k - 1]
    } else {
        discount_table[discount_table.len() - 1]
    };

    let k = u64::try_from(k).unwrap_or(u64::MAX);
    k.saturating_mul(mul_gas).saturating_mul(discount) / BLS12_MSM_MULTIPLIER
}

/// MODEXP: the EIP-2565/7883 formula is not re-parameterised; only its
/// floor moves.
fn modexp_floor(schedule: &GasSchedule, default_gas: u64) -> u64 {
    let min_gas = schedule.get_or(keys::PC_MODEXP_MIN_GAS, MODEXP_MIN_GAS);
    default_gas.max(min_gas)
}
