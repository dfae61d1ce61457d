//! Tracer hooks consumed by the interpreter.
//!
//! Both tracers observe execution through [`TraceHooks`]. The interpreter
//! owns the tracer for the duration of one execution and passes immutable
//! view structs into each callback, so no tracer ever holds a reference
//! back into the VM.

mod struct_log;
mod summary;

pub use struct_log::{StructLog, StructLogConfig, StructLogTracer};
pub use summary::{CallError, OpcodeSummary, SummaryTracer, TracerBreakdown, combine_breakdowns};

use bytes::Bytes;
use ethereum_types::{Address, U256};
use gascope_common::types::{Receipt, Transaction};

/// Snapshot of block-level context delivered at transaction start.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmContextView {
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub base_fee: Option<u64>,
}

/// Per-opcode view of the executing frame: operand stack plus the live
/// refund counter.
#[derive(Debug, Clone, Copy)]
pub struct OpScope<'a> {
    /// Operand stack, bottom first.
    pub stack: &'a [U256],
    /// Transaction refund counter at this point.
    pub refund: u64,
}

impl OpScope<'_> {
    /// Stack item `n` positions below the top, if the stack is deep enough.
    pub fn back(&self, n: usize) -> Option<U256> {
        self.stack
            .len()
            .checked_sub(n + 1)
            .and_then(|idx| self.stack.get(idx))
            .copied()
    }
}

/// Interpreter callbacks. Default implementations are no-ops so tracers
/// implement only what they observe.
#[allow(unused_variables, clippy::too_many_arguments)]
pub trait TraceHooks {
    /// Fires once before the message runs.
    fn on_tx_start(&mut self, ctx: &VmContextView, tx: &Transaction, from: Address) {}

    /// Fires once after the message completed (or failed pre-execution,
    /// with `err` set).
    fn on_tx_end(&mut self, receipt: &Receipt, err: Option<&str>) {}

    /// Fires when a call frame is entered. `depth` is the parent frame's
    /// depth; the child has not started executing yet.
    fn on_enter(
        &mut self,
        depth: usize,
        op_byte: u8,
        from: Address,
        to: Address,
        is_precompile: bool,
        input: &Bytes,
        gas: u64,
        value: U256,
        code: &[u8],
    ) {
    }

    /// Fires when a call frame exits, successfully or not.
    fn on_exit(
        &mut self,
        depth: usize,
        output: &Bytes,
        gas_used: u64,
        err: Option<&str>,
        reverted: bool,
    ) {
    }

    /// Fires before every opcode executes.
    fn on_opcode(
        &mut self,
        pc: u64,
        op_byte: u8,
        gas: u64,
        cost: u64,
        scope: &OpScope<'_>,
        return_data: &[u8],
        depth: usize,
        err: Option<&str>,
    ) {
    }
}

/// Hook sink that observes nothing.
pub struct NoOpHooks;

impl TraceHooks for NoOpHooks {}
