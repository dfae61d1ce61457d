//! Structured per-opcode trace capture.
//!
//! Optimised for in-process use: no full stack copies (only the CALL
//! family's target address is extracted), O(1) mnemonic lookup, and
//! GasUsed computed inline from the gas difference between consecutive
//! opcodes at the same depth instead of a post-processing pass.

use bytes::Bytes;
use ethereum_types::Address;
use gascope_common::types::{Receipt, Transaction};
use gascope_common::{Opcode, opcode_name};
use serde::Serialize;

use crate::gas::address_from_u256;
use crate::tracer::{OpScope, TraceHooks, VmContextView};

/// One executed opcode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLog {
    pub pc: u32,
    pub op: &'static str,
    /// Gas remaining before this opcode executed.
    pub gas: u64,
    /// Gas charged by the dispatch table for this opcode.
    pub gas_cost: u64,
    /// Actual consumption, known once the next opcode at this depth
    /// arrives. Until then it mirrors `gas_cost`.
    pub gas_used: u64,
    pub depth: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StructLogConfig {
    pub enable_return_data: bool,
}

/// A CREATE/CREATE2 waiting for its result address.
#[derive(Debug, Clone, Copy)]
struct PendingCreate {
    log_index: usize,
    depth: usize,
}

/// Structured-log tracer.
#[derive(Debug, Default)]
pub struct StructLogTracer {
    cfg: StructLogConfig,
    logs: Vec<StructLog>,
    output: Bytes,
    err: Option<String>,
    gas_used: u64,
    /// Set once `on_tx_start` fired; refunds are only attached then.
    started: bool,

    /// Index of the last log seen at each call depth. GasUsed for that log
    /// is `log.gas − current_gas` when the next opcode at the depth
    /// arrives.
    pending_idx: Vec<Option<usize>>,

    /// CREATE/CREATE2 logs waiting for control to return to their depth,
    /// where the created address (or zero on failure) is on the stack.
    pending_creates: Vec<PendingCreate>,
}

impl StructLogTracer {
    pub fn new(cfg: StructLogConfig) -> Self {
        Self {
            cfg,
            logs: Vec::with_capacity(256),
            pending_idx: Vec::with_capacity(16),
            ..Default::default()
        }
    }

    pub fn logs(&self) -> &[StructLog] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<StructLog> {
        self.logs
    }

    pub fn error(&self) -> Option<&str> {
        self.err.as_deref()
    }

    pub fn output(&self) -> &Bytes {
        &self.output
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    fn update_pending_gas_used(&mut self, depth: usize, current_gas: u64) {
        if self.pending_idx.len() <= depth {
            self.pending_idx.resize(depth + 1, None);
        }

        // Control returned from deeper frames; their last logs keep
        // gas_used == gas_cost since the difference cannot be computed
        // across a call boundary.
        for slot in self.pending_idx.iter_mut().skip(depth + 1) {
            *slot = None;
        }

        if let Some(Some(prev_idx)) = self.pending_idx.get(depth).copied() {
            if let Some(log) = self.logs.get_mut(prev_idx) {
                log.gas_used = log.gas.saturating_sub(current_gas);
            }
        }
    }

    fn set_pending_idx(&mut self, depth: usize, log_idx: usize) {
        if self.pending_idx.len() <= depth {
            self.pending_idx.resize(depth + 1, None);
        }
        if let Some(slot) = self.pending_idx.get_mut(depth) {
            *slot = Some(log_idx);
        }
    }

    fn resolve_pending_creates(&mut self, current_depth: usize, scope: &OpScope<'_>) {
        while let Some(pending) = self.pending_creates.last().copied() {
            if current_depth > pending.depth {
                break;
            }
            // The constructor returned: the created address sits on top of
            // the stack, zero when the creation failed.
            if let Some(top) = scope.back(0) {
                let address = address_from_u256(top);
                if let Some(log) = self.logs.get_mut(pending.log_index) {
                    log.call_to_address = Some(format_address(address));
                }
            }
            self.pending_creates.pop();
        }
    }
}

impl TraceHooks for StructLogTracer {
    fn on_tx_start(&mut self, _ctx: &VmContextView, _tx: &Transaction, _from: Address) {
        self.started = true;
    }

    fn on_tx_end(&mut self, receipt: &Receipt, err: Option<&str>) {
        if let Some(err) = err {
            if self.err.is_none() {
                self.err = Some(err.to_string());
            }
            return;
        }
        self.gas_used = receipt.gas_used;
    }

    fn on_exit(
        &mut self,
        depth: usize,
        output: &Bytes,
        _gas_used: u64,
        err: Option<&str>,
        _reverted: bool,
    ) {
        if depth != 0 {
            return;
        }
        self.output = output.clone();
        self.err = err.map(str::to_string);
    }

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
        let op = Opcode::from(op_byte);

        self.update_pending_gas_used(depth, gas);
        self.resolve_pending_creates(depth, scope);

        let mut log = StructLog {
            pc: u32::try_from(pc).unwrap_or(u32::MAX),
            op: opcode_name(op_byte),
            gas,
            gas_cost: cost,
            gas_used: cost,
            depth: u64::try_from(depth).unwrap_or(u64::MAX),
            call_to_address: None,
            return_data: None,
            refund: None,
            error: None,
        };

        // A charge can never legitimately exceed the remaining gas; some
        // interpreters report the theoretical cost on failure paths.
        if log.gas_cost > log.gas {
            log.gas_cost = log.gas;
        }
        // On out-of-gas the theoretical cost can be astronomically larger
        // than anything actually consumed.
        if err.is_some_and(|err| err.contains("out of gas")) && log.gas_used > log.gas {
            log.gas_used = log.gas;
        }

        // The target address is only meaningful for the CALL family and
        // sits at stack position len−2. Every other opcode skips stack
        // touching entirely.
        if op.is_call() {
            if let Some(target) = scope.back(1) {
                log.call_to_address = Some(format_address(address_from_u256(target)));
            }
        }

        if self.cfg.enable_return_data && !return_data.is_empty() {
            log.return_data = Some(hex::encode(return_data));
        }

        if self.started {
            log.refund = Some(scope.refund);
        }

        if let Some(err) = err {
            log.error = Some(err.to_string());
        }

        let log_idx = self.logs.len();
        self.logs.push(log);
        self.set_pending_idx(depth, log_idx);

        if op.is_create() {
            self.pending_creates.push(PendingCreate {
                log_index: log_idx,
                depth,
            });
        }
    }
}

fn format_address(address: Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}
