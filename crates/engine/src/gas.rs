//! Gas rules whose numeric inputs come from a [`GasSchedule`].
//!
//! Every function here mirrors a protocol gas formula with its constants
//! replaced by parameters bound at dispatch-table build time. Subtractions
//! that combine user-supplied values saturate; additions and
//! multiplications are checked and report [`GasError::Overflow`].

use ethereum_types::{Address, H256, U256};
use gascope_common::ChainRules;

use crate::constants::{MAX_MEMORY_SIZE, MEMORY_GAS, MEMORY_QUAD_DIVISOR, WORD_SIZE_IN_BYTES};
use crate::errors::GasError;
use crate::provider::StateAccess;

/// Per-frame memory accounting shared with the interpreter.
///
/// `last_gas_cost` is the total expansion fee already charged for this
/// frame; expansion charges only the delta above it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryGauge {
    pub len: u64,
    pub last_gas_cost: u64,
}

/// Immutable-stack view of the executing frame, handed to dynamic gas
/// rules by the interpreter. Carries no backreference into the VM.
#[derive(Debug)]
pub struct GasFrame<'a> {
    /// Operand stack, bottom first; the top of the stack is the last element.
    pub stack: &'a [U256],
    /// Account the frame executes under (SLOAD/SSTORE target).
    pub address: Address,
    pub memory: &'a mut MemoryGauge,
}

impl GasFrame<'_> {
    /// Stack item `n` positions below the top.
    pub fn back(&self, n: usize) -> Result<U256, GasError> {
        let len = self.stack.len();
        len.checked_sub(n.checked_add(1).ok_or(GasError::Overflow)?)
            .and_then(|idx| self.stack.get(idx))
            .copied()
            .ok_or(GasError::Overflow)
    }
}

/// Number of 32-byte words needed to hold `size` bytes.
pub fn to_word_size(size: u64) -> u64 {
    if size > u64::MAX - (WORD_SIZE_IN_BYTES - 1) {
        return u64::MAX / WORD_SIZE_IN_BYTES + 1;
    }
    (size + (WORD_SIZE_IN_BYTES - 1)) / WORD_SIZE_IN_BYTES
}

/// Quadratic memory expansion fee for growing the frame's memory to
/// `new_mem_size` bytes. Charges only the delta above what this frame has
/// already paid. Sizes past `MAX_MEMORY_SIZE` would overflow the square
/// term and are rejected.
pub fn memory_gas_cost(memory: &mut MemoryGauge, new_mem_size: u64) -> Result<u64, GasError> {
    if new_mem_size == 0 {
        return Ok(0);
    }
    if new_mem_size > MAX_MEMORY_SIZE {
        return Err(GasError::Overflow);
    }

    let new_mem_size_words = to_word_size(new_mem_size);
    let new_mem_size = new_mem_size_words * WORD_SIZE_IN_BYTES;

    if new_mem_size > memory.len {
        let square = new_mem_size_words * new_mem_size_words;
        let lin_coef = new_mem_size_words * MEMORY_GAS;
        let quad_coef = square / MEMORY_QUAD_DIVISOR;
        let new_total_fee = lin_coef + quad_coef;

        let fee = new_total_fee.saturating_sub(memory.last_gas_cost);
        memory.last_gas_cost = new_total_fee;

        return Ok(fee);
    }
    Ok(0)
}

/// Parameters for the EIP-2929 SLOAD rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SloadParams {
    pub cold_cost: u64,
    pub warm_cost: u64,
}

pub fn sload(
    params: &SloadParams,
    state: &mut dyn StateAccess,
    frame: &GasFrame<'_>,
) -> Result<u64, GasError> {
    let slot = h256_from_u256(frame.back(0)?);
    if state.add_slot_to_access_list(frame.address, slot) {
        Ok(params.cold_cost)
    } else {
        Ok(params.warm_cost)
    }
}

/// Parameters for the EIP-2929 + EIP-2200 SSTORE rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstoreParams {
    pub cold_sload_cost: u64,
    pub warm_read_cost: u64,
    pub set_gas: u64,
    pub reset_gas: u64,
    pub clearing_refund: u64,
    pub sentry_gas: u64,
}

/// SSTORE clearing refund derived from the schedule's values:
/// `(SSTORE_RESET − SLOAD_COLD) + 1900`, zero when the subtraction would
/// underflow.
pub fn clearing_refund(reset_gas: u64, cold_sload_cost: u64) -> u64 {
    match reset_gas.checked_sub(cold_sload_cost) {
        Some(diff) => diff + crate::constants::TX_ACCESS_LIST_STORAGE_KEY_GAS,
        None => 0,
    }
}

pub fn sstore(
    params: &SstoreParams,
    state: &mut dyn StateAccess,
    frame: &GasFrame<'_>,
    scope_gas: u64,
) -> Result<u64, GasError> {
    // EIP-2200 minimum gas availability invariant.
    if scope_gas <= params.sentry_gas {
        return Err(GasError::ReentrancySentry);
    }

    let slot = h256_from_u256(frame.back(0)?);
    let new_value = frame.back(1)?;

    let current = state.storage_value(frame.address, slot);
    let mut cost = 0u64;
    if state.add_slot_to_access_list(frame.address, slot) {
        cost = params.cold_sload_cost;
    }

    if current == new_value {
        // noop (1)
        return cost
            .checked_add(params.warm_read_cost)
            .ok_or(GasError::Overflow);
    }

    let original = state.committed_storage_value(frame.address, slot);
    if original == current {
        if original.is_zero() {
            // create slot (2.1.1)
            return cost.checked_add(params.set_gas).ok_or(GasError::Overflow);
        }
        if new_value.is_zero() {
            // delete slot (2.1.2b)
            state.add_refund(params.clearing_refund);
        }
        // write existing slot (2.1.2)
        return cost
            .checked_add(params.reset_gas.saturating_sub(params.cold_sload_cost))
            .ok_or(GasError::Overflow);
    }
    if !original.is_zero() {
        if current.is_zero() {
            // recreate slot (2.2.1.1)
            state.sub_refund(params.clearing_refund);
        } else if new_value.is_zero() {
            // delete slot (2.2.1.2)
            state.add_refund(params.clearing_refund);
        }
    }
    if original == new_value {
        if original.is_zero() {
            // reset to original inexistent slot (2.2.2.1)
            state.add_refund(params.set_gas.saturating_sub(params.warm_read_cost));
        } else {
            // reset to original existing slot (2.2.2.2)
            let reset_minus_cold = params.reset_gas.saturating_sub(params.cold_sload_cost);
            state.add_refund(reset_minus_cold.saturating_sub(params.warm_read_cost));
        }
    }
    // dirty update (2.2)
    cost.checked_add(params.warm_read_cost)
        .ok_or(GasError::Overflow)
}

/// EXP: `base + per_byte × byte_len(exponent)`.
pub fn exp(base_gas: u64, byte_gas: u64, frame: &GasFrame<'_>) -> Result<u64, GasError> {
    let exponent = frame.back(1)?;
    #[expect(clippy::as_conversions)] // bit count is at most 256
    let byte_len = (exponent.bits() as u64 + 7) / 8;

    // No overflow check needed on the product: byte_len is at most 32.
    let gas = byte_len * byte_gas;
    gas.checked_add(base_gas).ok_or(GasError::Overflow)
}

/// KECCAK256: memory expansion plus a per-word charge over the hashed range.
pub fn keccak256(
    word_gas: u64,
    frame: &mut GasFrame<'_>,
    memory_size: u64,
) -> Result<u64, GasError> {
    let gas = memory_gas_cost(frame.memory, memory_size)?;
    let data_len = u256_to_u64(frame.back(1)?)?;
    let word_cost = to_word_size(data_len)
        .checked_mul(word_gas)
        .ok_or(GasError::Overflow)?;
    gas.checked_add(word_cost).ok_or(GasError::Overflow)
}

/// LOG0..LOG4: memory expansion + base + topics + per-byte data charge.
pub fn log(
    num_topics: u64,
    base_gas: u64,
    topic_gas: u64,
    data_gas: u64,
    frame: &mut GasFrame<'_>,
    memory_size: u64,
) -> Result<u64, GasError> {
    let requested_size = u256_to_u64(frame.back(1)?)?;

    let mut gas = memory_gas_cost(frame.memory, memory_size)?;
    gas = gas.checked_add(base_gas).ok_or(GasError::Overflow)?;
    gas = gas
        .checked_add(num_topics.checked_mul(topic_gas).ok_or(GasError::Overflow)?)
        .ok_or(GasError::Overflow)?;

    let data_cost = requested_size
        .checked_mul(data_gas)
        .ok_or(GasError::Overflow)?;
    gas.checked_add(data_cost).ok_or(GasError::Overflow)
}

/// Copy family (CALLDATACOPY, CODECOPY, RETURNDATACOPY, EXTCODECOPY,
/// MCOPY): memory expansion + per-word copy charge. `stack_pos` locates the
/// length operand (2 for most, 3 for EXTCODECOPY).
pub fn copy(
    stack_pos: usize,
    copy_gas: u64,
    frame: &mut GasFrame<'_>,
    memory_size: u64,
) -> Result<u64, GasError> {
    let gas = memory_gas_cost(frame.memory, memory_size)?;
    let words = u256_to_u64(frame.back(stack_pos)?)?;
    let copy_cost = to_word_size(words)
        .checked_mul(copy_gas)
        .ok_or(GasError::Overflow)?;
    gas.checked_add(copy_cost).ok_or(GasError::Overflow)
}

/// Parameters shared by the CALL-family rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallParams {
    pub cold_access_cost: u64,
    pub warm_access_cost: u64,
    pub value_xfer_cost: u64,
    pub new_account_cost: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// Cost charged for a CALL-family opcode plus the gas allocated to the
/// child frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallCharge {
    pub cost: u64,
    pub child_gas: u64,
}

/// EIP-2929 CALL-family wrapper. The warm cost is already charged through
/// the opcode's constant-gas slot, so a cold access costs the difference.
/// The surcharge is deducted from `scope_gas` before the inner calculator
/// runs so the 63/64ths split sees the correct residual, then added back
/// to the reported cost.
pub fn call_variant(
    kind: CallKind,
    params: &CallParams,
    state: &mut dyn StateAccess,
    frame: &mut GasFrame<'_>,
    scope_gas: u64,
    memory_size: u64,
    rules: &ChainRules,
) -> Result<CallCharge, GasError> {
    let addr = address_from_u256(frame.back(1)?);

    let cold_cost = params
        .cold_access_cost
        .saturating_sub(params.warm_access_cost);

    let was_cold = state.add_address_to_access_list(addr);
    let mut scope_gas = scope_gas;
    if was_cold {
        if scope_gas < cold_cost {
            return Err(GasError::OutOfGas);
        }
        scope_gas -= cold_cost;
    }

    let mut charge = match kind {
        CallKind::Call => call_inner(params, state, frame, scope_gas, memory_size, rules)?,
        CallKind::CallCode => callcode_inner(params, state, frame, scope_gas, memory_size, rules)?,
        CallKind::DelegateCall | CallKind::StaticCall => {
            plain_call_inner(state, frame, scope_gas, memory_size, rules)?
        }
    };
    if was_cold {
        charge.cost = charge.cost.checked_add(cold_cost).ok_or(GasError::Overflow)?;
    }
    Ok(charge)
}

/// Inner CALL calculator: value transfer, account creation, memory
/// expansion and the child allocation.
fn call_inner(
    params: &CallParams,
    state: &mut dyn StateAccess,
    frame: &mut GasFrame<'_>,
    scope_gas: u64,
    memory_size: u64,
    rules: &ChainRules,
) -> Result<CallCharge, GasError> {
    let transfers_value = !frame.back(2)?.is_zero();
    let address = address_from_u256(frame.back(1)?);

    let mut gas = 0u64;
    if rules.is_spurious_dragon {
        // EIP-161: creation is only charged when value reaches a dead account.
        if transfers_value && state.account_is_empty(address) {
            gas += params.new_account_cost;
        }
    } else if !state.account_exists(address) {
        gas += params.new_account_cost;
    }

    if transfers_value {
        gas = gas
            .checked_add(params.value_xfer_cost)
            .ok_or(GasError::Overflow)?;
    }

    let memory_gas = memory_gas_cost(frame.memory, memory_size)?;
    gas = gas.checked_add(memory_gas).ok_or(GasError::Overflow)?;

    let child_gas = call_gas(rules.is_tangerine, scope_gas, gas, frame.back(0)?)?;
    let cost = gas.checked_add(child_gas).ok_or(GasError::Overflow)?;
    Ok(CallCharge { cost, child_gas })
}

/// Inner CALLCODE calculator: like CALL without the new-account clause.
fn callcode_inner(
    params: &CallParams,
    _state: &mut dyn StateAccess,
    frame: &mut GasFrame<'_>,
    scope_gas: u64,
    memory_size: u64,
    rules: &ChainRules,
) -> Result<CallCharge, GasError> {
    let mut gas = 0u64;
    if !frame.back(2)?.is_zero() {
        gas = gas
            .checked_add(params.value_xfer_cost)
            .ok_or(GasError::Overflow)?;
    }

    let memory_gas = memory_gas_cost(frame.memory, memory_size)?;
    gas = gas.checked_add(memory_gas).ok_or(GasError::Overflow)?;

    let child_gas = call_gas(rules.is_tangerine, scope_gas, gas, frame.back(0)?)?;
    let cost = gas.checked_add(child_gas).ok_or(GasError::Overflow)?;
    Ok(CallCharge { cost, child_gas })
}

/// Inner DELEGATECALL/STATICCALL calculator: no value clauses at all.
fn plain_call_inner(
    _state: &mut dyn StateAccess,
    frame: &mut GasFrame<'_>,
    scope_gas: u64,
    memory_size: u64,
    rules: &ChainRules,
) -> Result<CallCharge, GasError> {
    let gas = memory_gas_cost(frame.memory, memory_size)?;
    let child_gas = call_gas(rules.is_tangerine, scope_gas, gas, frame.back(0)?)?;
    let cost = gas.checked_add(child_gas).ok_or(GasError::Overflow)?;
    Ok(CallCharge { cost, child_gas })
}

/// EIP-150 child allocation: once the opcode's own charges (`base`) are
/// paid, at most `available − available/64` flows to the child. Before
/// Tangerine Whistle the requested amount passes through unclamped.
pub fn call_gas(
    is_tangerine: bool,
    available_gas: u64,
    base: u64,
    requested: U256,
) -> Result<u64, GasError> {
    if is_tangerine {
        // If the frame cannot even cover the base charges, the child gets
        // nothing rather than underflowing.
        let Some(available_gas) = available_gas.checked_sub(base) else {
            return Ok(0);
        };
        let gas = available_gas - available_gas / 64;
        if requested.bits() > 64 || gas < requested.low_u64() {
            return Ok(gas);
        }
    }
    if requested.bits() > 64 {
        return Err(GasError::Overflow);
    }
    Ok(requested.low_u64())
}

pub(crate) fn u256_to_u64(value: U256) -> Result<u64, GasError> {
    if value.bits() > 64 {
        return Err(GasError::Overflow);
    }
    Ok(value.low_u64())
}

pub(crate) fn h256_from_u256(value: U256) -> H256 {
    H256(value.to_big_endian())
}

pub(crate) fn address_from_u256(value: U256) -> Address {
    let bytes = value.to_big_endian();
    Address::from_slice(&bytes[12..])
}
