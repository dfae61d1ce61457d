//! Per-opcode aggregation for the dual-execution comparison.

use std::collections::BTreeMap;

use bytes::Bytes;
use ethereum_types::{Address, U256};
use gascope_common::opcode_name;
use gascope_common::types::Receipt;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::tracer::{OpScope, TraceHooks};

/// Counts and gas for one mnemonic, original and simulated side by side.
/// Tracked separately because the two executions may diverge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcodeSummary {
    pub original_count: u64,
    pub original_gas: u64,
    pub simulated_count: u64,
    pub simulated_gas: u64,
}

/// An error observed inside a nested call frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallError {
    pub depth: usize,
    #[serde(rename = "type")]
    pub call_type: String,
    pub error: String,
    /// Target contract address, truncated for display.
    pub address: String,
}

#[derive(Debug, Clone)]
struct CallFrameInfo {
    depth: usize,
    call_type: &'static str,
    address: String,
}

/// A CALL-family charge whose child allocation is not yet known.
#[derive(Debug, Clone, Copy)]
struct PendingCall {
    cost: u64,
    depth: usize,
    call_type: &'static str,
}

/// Raw per-opcode data from a single execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracerBreakdown {
    pub count: u64,
    pub gas: u64,
}

/// Aggregating tracer: per-opcode counts and gas, revert count and
/// per-frame call errors for one execution.
///
/// CALL-family opcodes report `overhead + child_gas` as their cost; only
/// the overhead belongs to the opcode. The charge is held pending until
/// `on_enter` reveals the child allocation. If the next opcode arrives at
/// the same depth first, the call failed before a child frame existed and
/// the full cost stays with the opcode.
#[derive(Debug, Default)]
pub struct SummaryTracer {
    gas_used: FxHashMap<&'static str, u64>,
    opcode_counts: FxHashMap<&'static str, u64>,
    total_gas_used: u64,

    call_stack: Vec<CallFrameInfo>,
    call_errors: Vec<CallError>,

    pending_call: Option<PendingCall>,
}

impl SummaryTracer {
    pub fn new() -> Self {
        Self {
            gas_used: FxHashMap::default(),
            opcode_counts: FxHashMap::default(),
            call_stack: Vec::with_capacity(16),
            call_errors: Vec::with_capacity(8),
            ..Default::default()
        }
    }

    /// Raw per-opcode data; the driver combines two of these into
    /// [`OpcodeSummary`] rows.
    pub fn raw_breakdown(&self) -> FxHashMap<&'static str, TracerBreakdown> {
        let mut result = FxHashMap::default();
        for (op, count) in &self.opcode_counts {
            let gas = self.gas_used.get(op).copied().unwrap_or_default();
            result.insert(*op, TracerBreakdown { count: *count, gas });
        }
        result
    }

    pub fn total_gas_used(&self) -> u64 {
        self.total_gas_used
    }

    /// REVERT opcodes executed, nested calls included.
    pub fn revert_count(&self) -> u64 {
        self.opcode_counts.get("REVERT").copied().unwrap_or_default()
    }

    pub fn total_opcode_count(&self) -> u64 {
        self.opcode_counts.values().sum()
    }

    pub fn call_errors(&self) -> &[CallError] {
        &self.call_errors
    }
}

impl TraceHooks for SummaryTracer {
    fn on_tx_end(&mut self, _receipt: &Receipt, _err: Option<&str>) {
        // Edge case: the transaction ended abnormally right after a CALL.
        if let Some(pending) = self.pending_call.take() {
            *self.gas_used.entry(pending.call_type).or_default() += pending.cost;
            self.total_gas_used += pending.cost;
        }
    }

    fn on_enter(
        &mut self,
        depth: usize,
        op_byte: u8,
        _from: Address,
        to: Address,
        _is_precompile: bool,
        _input: &Bytes,
        gas: u64,
        _value: U256,
        _code: &[u8],
    ) {
        let call_type = opcode_name(op_byte);

        // `on_enter` fires at the parent's depth, before the child frame
        // increments it: the child allocation is `gas`, so the opcode's
        // own share is the difference.
        if let Some(pending) = self.pending_call {
            if pending.depth == depth {
                let overhead = pending.cost.saturating_sub(gas);
                *self.gas_used.entry(pending.call_type).or_default() += overhead;
                self.total_gas_used += overhead;
                self.pending_call = None;
            }
        }

        let mut address = format!("0x{}", hex::encode(to.as_bytes()));
        address.truncate(20);

        self.call_stack.push(CallFrameInfo {
            depth,
            call_type,
            address,
        });
    }

    fn on_exit(
        &mut self,
        _depth: usize,
        _output: &Bytes,
        _gas_used: u64,
        err: Option<&str>,
        reverted: bool,
    ) {
        let Some(frame) = self.call_stack.pop() else {
            return;
        };

        if err.is_some() || reverted {
            self.call_errors.push(CallError {
                depth: frame.depth,
                call_type: frame.call_type.to_string(),
                error: err.unwrap_or("execution reverted").to_string(),
                address: frame.address,
            });
        }
    }

    fn on_opcode(
        &mut self,
        _pc: u64,
        op_byte: u8,
        _gas: u64,
        cost: u64,
        _scope: &OpScope<'_>,
        _return_data: &[u8],
        depth: usize,
        _err: Option<&str>,
    ) {
        let op = opcode_name(op_byte);

        // A pending CALL at the same depth means the call failed before a
        // child frame was created; the whole cost belongs to the opcode.
        if let Some(pending) = self.pending_call {
            if pending.depth == depth {
                *self.gas_used.entry(pending.call_type).or_default() += pending.cost;
                self.total_gas_used += pending.cost;
                self.pending_call = None;
            }
        }

        *self.opcode_counts.entry(op).or_default() += 1;

        if matches!(op_byte, 0xF1 | 0xF2 | 0xF4 | 0xFA) {
            self.pending_call = Some(PendingCall {
                cost,
                depth,
                call_type: op,
            });
            return;
        }

        *self.gas_used.entry(op).or_default() += cost;
        self.total_gas_used += cost;
    }
}

/// Merges the raw breakdowns from the baseline and simulated executions.
pub fn combine_breakdowns(
    original: &SummaryTracer,
    simulated: &SummaryTracer,
) -> BTreeMap<String, OpcodeSummary> {
    let mut result: BTreeMap<String, OpcodeSummary> = BTreeMap::new();

    for (op, data) in original.raw_breakdown() {
        let entry = result.entry(op.to_string()).or_default();
        entry.original_count = data.count;
        entry.original_gas = data.gas;
    }
    for (op, data) in simulated.raw_breakdown() {
        let entry = result.entry(op.to_string()).or_default();
        entry.simulated_count = data.count;
        entry.simulated_gas = data.gas;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use gascope_common::Opcode;

    fn opcode(tracer: &mut SummaryTracer, op: Opcode, cost: u64, depth: usize) {
        let stack: [U256; 0] = [];
        let scope = OpScope {
            stack: &stack,
            refund: 0,
        };
        tracer.on_opcode(0, op.into(), 1_000_000, cost, &scope, &[], depth, None);
    }

    fn enter(tracer: &mut SummaryTracer, op: Opcode, depth: usize, gas: u64) {
        tracer.on_enter(
            depth,
            op.into(),
            Address::zero(),
            Address::repeat_byte(0xBB),
            false,
            &Bytes::new(),
            gas,
            U256::zero(),
            &[],
        );
    }

    #[test]
    fn counts_and_gas_accumulate() {
        let mut tracer = SummaryTracer::new();
        opcode(&mut tracer, Opcode::ADD, 3, 1);
        opcode(&mut tracer, Opcode::ADD, 3, 1);
        opcode(&mut tracer, Opcode::SLOAD, 2100, 1);

        let breakdown = tracer.raw_breakdown();
        assert_eq!(breakdown["ADD"], TracerBreakdown { count: 2, gas: 6 });
        assert_eq!(
            breakdown["SLOAD"],
            TracerBreakdown {
                count: 1,
                gas: 2100,
            }
        );
        assert_eq!(tracer.total_gas_used(), 2106);
        assert_eq!(tracer.total_opcode_count(), 3);
    }

    #[test]
    fn call_overhead_attributed_via_enter() {
        let mut tracer = SummaryTracer::new();
        // CALL reports overhead + child allocation as one cost
        opcode(&mut tracer, Opcode::CALL, 2600 + 63_000, 1);
        // the child frame then starts with the allocation
        enter(&mut tracer, Opcode::CALL, 1, 63_000);

        let breakdown = tracer.raw_breakdown();
        assert_eq!(
            breakdown["CALL"],
            TracerBreakdown {
                count: 1,
                gas: 2600,
            }
        );
    }

    #[test]
    fn failed_call_keeps_full_cost() {
        let mut tracer = SummaryTracer::new();
        opcode(&mut tracer, Opcode::CALL, 9700, 1);
        // no on_enter: next opcode at the same depth resolves the pending
        opcode(&mut tracer, Opcode::ISZERO, 3, 1);

        let breakdown = tracer.raw_breakdown();
        assert_eq!(
            breakdown["CALL"],
            TracerBreakdown {
                count: 1,
                gas: 9700,
            }
        );
    }

    #[test]
    fn tx_end_flushes_pending_call() {
        let mut tracer = SummaryTracer::new();
        opcode(&mut tracer, Opcode::STATICCALL, 500, 1);
        tracer.on_tx_end(&Receipt::default(), None);

        let breakdown = tracer.raw_breakdown();
        assert_eq!(
            breakdown["STATICCALL"],
            TracerBreakdown {
                count: 1,
                gas: 500,
            }
        );
    }

    #[test]
    fn revert_counting() {
        let mut tracer = SummaryTracer::new();
        opcode(&mut tracer, Opcode::REVERT, 0, 2);
        opcode(&mut tracer, Opcode::REVERT, 0, 1);
        assert_eq!(tracer.revert_count(), 2);
    }

    #[test]
    fn call_errors_record_frame_info() {
        let mut tracer = SummaryTracer::new();
        enter(&mut tracer, Opcode::DELEGATECALL, 1, 50_000);
        tracer.on_exit(1, &Bytes::new(), 50_000, Some("out of gas"), false);
        enter(&mut tracer, Opcode::CALL, 1, 10_000);
        tracer.on_exit(1, &Bytes::new(), 100, None, true);

        let errors = tracer.call_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].call_type, "DELEGATECALL");
        assert_eq!(errors[0].error, "out of gas");
        // 0x + first 18 hex chars
        assert_eq!(errors[0].address.len(), 20);
        assert_eq!(errors[0].address, "0xbbbbbbbbbbbbbbbbbb");
        assert_eq!(errors[1].error, "execution reverted");
    }

    #[test]
    fn breakdowns_combine_side_by_side() {
        let mut original = SummaryTracer::new();
        opcode(&mut original, Opcode::SLOAD, 2100, 1);
        let mut simulated = SummaryTracer::new();
        opcode(&mut simulated, Opcode::SLOAD, 1500, 1);
        opcode(&mut simulated, Opcode::ADD, 3, 1);

        let combined = combine_breakdowns(&original, &simulated);
        let sload = combined.get("SLOAD").unwrap();
        assert_eq!(sload.original_count, 1);
        assert_eq!(sload.original_gas, 2100);
        assert_eq!(sload.simulated_count, 1);
        assert_eq!(sload.simulated_gas, 1500);

        let add = combined.get("ADD").unwrap();
        assert_eq!(add.original_count, 0);
        assert_eq!(add.simulated_count, 1);
    }
}
