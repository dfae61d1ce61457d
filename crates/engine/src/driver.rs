//! Dual-execution simulation driver.
//!
//! For every transaction two interpreter runs start from the identical
//! pre-transaction state: the baseline with an empty schedule and the
//! fork's own dispatch table, and the simulated run with the user's
//! schedule compiled into a custom table. Each run gets its own state view
//! and its own tracer; afterwards the two sides are merged into one
//! per-opcode comparison.

use std::collections::BTreeMap;

use ethereum_types::H256;
use gascope_common::types::{Block, BlockHeader, BlockNumber};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::defaults::{GasScheduleResponse, schedule_response_for};
use crate::errors::EngineError;
use crate::intrinsic::intrinsic_gas_for_tx;
use crate::jump_table::JumpTable;
use crate::provider::{BlockReader, ExecutionProvider, Interpreter, InterpreterConfig};
use crate::schedule::GasSchedule;
use crate::tracer::{CallError, OpcodeSummary, SummaryTracer, TraceHooks, combine_breakdowns};

/// Synthetic breakdown row carrying each side's intrinsic gas.
pub const TX_INTRINSIC: &str = "TX_INTRINSIC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        }
    }
}

/// Everything one execution produced.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Post-refund gas charged to the sender.
    pub gas_used: u64,
    pub intrinsic_gas: u64,
    /// Pre-execution failure (e.g. intrinsic gas too low).
    pub apply_err: Option<String>,
    /// In-EVM failure (revert, out of gas, ...).
    pub vm_err: Option<String>,
    pub status: TxStatus,
    /// REVERT opcodes executed, nested calls included.
    pub revert_count: u64,
    pub opcode_count: u64,
    pub call_errors: Vec<CallError>,
}

/// Both executions of one transaction plus the merged breakdown.
#[derive(Debug, Clone)]
pub struct DualExecutionResult {
    pub original: ExecutionOutcome,
    pub simulated: ExecutionOutcome,
    pub opcode_breakdown: BTreeMap<String, OpcodeSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGasSummary {
    pub gas_used: u64,
    pub gas_limit: u64,
    pub would_exceed_limit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummary {
    pub hash: H256,
    pub index: u64,
    pub original_status: TxStatus,
    pub simulated_status: TxStatus,
    pub original_gas: u64,
    pub simulated_gas: u64,
    pub delta_percent: f64,
    pub diverged: bool,
    pub original_reverts: u64,
    pub simulated_reverts: u64,
    pub original_errors: Vec<CallError>,
    pub simulated_errors: Vec<CallError>,
    /// Pre-execution failure from either side, empty otherwise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateBlockGasResult {
    pub block_number: BlockNumber,
    pub original: BlockGasSummary,
    pub simulated: BlockGasSummary,
    pub transactions: Vec<TxSummary>,
    pub opcode_breakdown: BTreeMap<String, OpcodeSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxGasDetail {
    pub gas_used: u64,
    pub intrinsic_gas: u64,
    pub execution_gas: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionGasResult {
    pub transaction_hash: H256,
    pub block_number: BlockNumber,
    pub status: TxStatus,
    pub original: TxGasDetail,
    pub simulated: TxGasDetail,
    pub opcode_breakdown: BTreeMap<String, OpcodeSummary>,
}

/// Relative gas change of the simulated execution, in percent. Lossy,
/// display only.
#[expect(clippy::as_conversions)]
fn delta_percent(original_gas: u64, simulated_gas: u64) -> f64 {
    if original_gas == 0 {
        return 0.0;
    }
    (simulated_gas as f64 - original_gas as f64) / original_gas as f64 * 100.0
}

/// The simulation engine: a block reader for history and an execution
/// provider for state views and interpreters.
pub struct GasSimulator<P, R> {
    provider: P,
    reader: R,
}

impl<P: ExecutionProvider, R: BlockReader> GasSimulator<P, R> {
    pub fn new(provider: P, reader: R) -> Self {
        Self { provider, reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Default gas parameters (with descriptions) for the fork active at
    /// the given block.
    pub async fn get_gas_schedule(
        &self,
        block_number: BlockNumber,
    ) -> Result<GasScheduleResponse, EngineError> {
        let block = self
            .reader
            .block_by_number(block_number)
            .await?
            .ok_or(EngineError::BlockNotFound(block_number))?;

        let (_view, block_ctx) = self.provider.build_block_context(&block.header, 0)?;
        Ok(schedule_response_for(&block_ctx.rules))
    }

    /// Re-executes a whole block under the schedule, transaction by
    /// transaction in block order.
    pub async fn simulate_block_gas(
        &self,
        block_number: BlockNumber,
        schedule: &GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateBlockGasResult, EngineError> {
        let block = self
            .reader
            .block_by_number(block_number)
            .await?
            .ok_or(EngineError::BlockNotFound(block_number))?;
        let header = block.header.clone();

        debug!(
            block_number,
            tx_count = block.transactions.len(),
            overrides = schedule.len(),
            max_gas_limit,
            "simulating block gas"
        );

        let mut result = SimulateBlockGasResult {
            block_number,
            original: BlockGasSummary {
                gas_limit: header.gas_limit,
                ..Default::default()
            },
            simulated: BlockGasSummary {
                gas_limit: header.gas_limit,
                ..Default::default()
            },
            transactions: Vec::with_capacity(block.transactions.len()),
            opcode_breakdown: BTreeMap::new(),
        };

        for tx_index in 0..block.transactions.len() {
            // Cancellation is only observed between transactions; a run
            // that already entered the interpreter completes first.
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let dual =
                self.execute_transaction_dual(&header, &block, tx_index, schedule, max_gas_limit)?;

            let original_gas = dual.original.gas_used;
            let simulated_gas = dual.simulated.gas_used;

            let delta_percent = delta_percent(original_gas, simulated_gas);

            // Divergence: the two executions took different paths, or one
            // of them changed its verdict.
            let diverged = dual.original.opcode_count != dual.simulated.opcode_count
                || dual.original.status != dual.simulated.status;

            let error = if let Some(err) = &dual.original.apply_err {
                format!("original: {err}")
            } else if let Some(err) = &dual.simulated.apply_err {
                err.clone()
            } else {
                String::new()
            };

            #[expect(clippy::indexing_slicing)] // tx_index < transactions.len()
            let tx_hash = block.transactions[tx_index].hash;
            result.transactions.push(TxSummary {
                hash: tx_hash,
                index: u64::try_from(tx_index).unwrap_or(u64::MAX),
                original_status: dual.original.status,
                simulated_status: dual.simulated.status,
                original_gas,
                simulated_gas,
                delta_percent,
                diverged,
                original_reverts: dual.original.revert_count,
                simulated_reverts: dual.simulated.revert_count,
                original_errors: dual.original.call_errors.clone(),
                simulated_errors: dual.simulated.call_errors.clone(),
                error,
            });

            result.original.gas_used += original_gas;
            result.simulated.gas_used += simulated_gas;

            for (op, summary) in &dual.opcode_breakdown {
                let entry = result.opcode_breakdown.entry(op.clone()).or_default();
                entry.original_count += summary.original_count;
                entry.original_gas += summary.original_gas;
                entry.simulated_count += summary.simulated_count;
                entry.simulated_gas += summary.simulated_gas;
            }

            // Intrinsic gas is not an opcode, but it belongs in the gas
            // breakdown all the same.
            let intrinsic = result
                .opcode_breakdown
                .entry(TX_INTRINSIC.to_string())
                .or_default();
            intrinsic.original_count += 1;
            intrinsic.original_gas += dual.original.intrinsic_gas;
            intrinsic.simulated_count += 1;
            intrinsic.simulated_gas += dual.simulated.intrinsic_gas;
        }

        result.original.would_exceed_limit = result.original.gas_used > header.gas_limit;
        result.simulated.would_exceed_limit = result.simulated.gas_used > header.gas_limit;

        Ok(result)
    }

    /// Re-executes a single transaction under the schedule.
    pub async fn simulate_transaction_gas(
        &self,
        tx_hash: H256,
        block_number: BlockNumber,
        schedule: &GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateTransactionGasResult, EngineError> {
        let (found_block, tx_num) = self
            .reader
            .transaction_lookup(tx_hash)
            .await?
            .ok_or(EngineError::TransactionNotFound(tx_hash))?;

        if block_number != 0 && block_number != found_block {
            return Err(EngineError::BlockMismatch {
                hash: tx_hash,
                actual: found_block,
                requested: block_number,
            });
        }

        let tx_num_min = self.reader.tx_num_min(found_block).await?;
        if tx_num_min + 1 > tx_num {
            return Err(EngineError::TxNumUnderflow { tx_num, tx_num_min });
        }
        let tx_index = usize::try_from(tx_num - tx_num_min - 1)
            .map_err(|_| EngineError::TxNumUnderflow { tx_num, tx_num_min })?;

        let block = self
            .reader
            .block_by_number(found_block)
            .await?
            .ok_or(EngineError::BlockNotFound(found_block))?;

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let dual = self.execute_transaction_dual(
            &block.header,
            &block,
            tx_index,
            schedule,
            max_gas_limit,
        )?;

        // gas_used already includes intrinsic gas; a tx that failed before
        // execution can report less than intrinsic, so subtract safely.
        let original_exec_gas = dual
            .original
            .gas_used
            .saturating_sub(dual.original.intrinsic_gas);
        let simulated_exec_gas = dual
            .simulated
            .gas_used
            .saturating_sub(dual.simulated.intrinsic_gas);

        Ok(SimulateTransactionGasResult {
            transaction_hash: tx_hash,
            block_number: found_block,
            status: dual.original.status,
            original: TxGasDetail {
                gas_used: dual.original.gas_used,
                intrinsic_gas: dual.original.intrinsic_gas,
                execution_gas: original_exec_gas,
            },
            simulated: TxGasDetail {
                gas_used: dual.simulated.gas_used,
                intrinsic_gas: dual.simulated.intrinsic_gas,
                execution_gas: simulated_exec_gas,
            },
            opcode_breakdown: dual.opcode_breakdown,
        })
    }

    /// Runs the baseline and the simulated execution for one transaction.
    /// Each run opens its own state view; sharing one would let refund
    /// counters and access lists leak between the two.
    pub fn execute_transaction_dual(
        &self,
        header: &BlockHeader,
        block: &Block,
        tx_index: usize,
        schedule: &GasSchedule,
        max_gas_limit: bool,
    ) -> Result<DualExecutionResult, EngineError> {
        let mut original_tracer = SummaryTracer::new();
        let mut original =
            self.execute_single(header, block, tx_index, None, &mut original_tracer, false)?;
        original.revert_count = original_tracer.revert_count();
        original.opcode_count = original_tracer.total_opcode_count();
        original.call_errors = original_tracer.call_errors().to_vec();

        let mut simulated_tracer = SummaryTracer::new();
        let mut simulated = self.execute_single(
            header,
            block,
            tx_index,
            Some(schedule),
            &mut simulated_tracer,
            max_gas_limit,
        )?;
        simulated.revert_count = simulated_tracer.revert_count();
        simulated.opcode_count = simulated_tracer.total_opcode_count();
        simulated.call_errors = simulated_tracer.call_errors().to_vec();

        let opcode_breakdown = combine_breakdowns(&original_tracer, &simulated_tracer);

        Ok(DualExecutionResult {
            original,
            simulated,
            opcode_breakdown,
        })
    }

    /// One execution: fresh state view, optional custom dispatch table,
    /// tracer attached.
    fn execute_single(
        &self,
        header: &BlockHeader,
        block: &Block,
        tx_index: usize,
        schedule: Option<&GasSchedule>,
        tracer: &mut SummaryTracer,
        max_gas_limit: bool,
    ) -> Result<ExecutionOutcome, EngineError> {
        let tx = block
            .transactions
            .get(tx_index)
            .ok_or(EngineError::TxIndexOutOfRange(tx_index))?;

        let (mut view, block_ctx) = self.provider.build_block_context(header, tx_index)?;
        let (mut message, tx_ctx) = self.provider.build_tx_context(&mut view, block, tx_index)?;
        let rules = block_ctx.rules;

        let active_schedule = schedule.filter(|schedule| !schedule.is_empty());
        let jump_table = active_schedule.map(|schedule| JumpTable::build(&rules, schedule));

        // Lifting the gas limit isolates the pricing change from
        // artificial out-of-gas failures: the transaction may spend up to
        // the block limit, the per-transaction cap check is off, and the
        // balance check is bypassed (the sender funded the original limit,
        // not this one).
        if max_gas_limit {
            message.change_gas(header.gas_limit);
            message.check_gas_cap = false;
        }
        let bailout = max_gas_limit;

        let gas_pool = message.gas_limit;
        let outcome = {
            let config = InterpreterConfig {
                hooks: Some(tracer as &mut dyn TraceHooks),
                jump_table: jump_table.as_ref(),
                schedule: active_schedule,
                no_base_fee: true,
            };
            let mut interpreter = self
                .provider
                .new_interpreter(view, block_ctx, tx_ctx, config);
            interpreter.apply_message(&message, gas_pool, true, bailout)?
        };

        let vm_err = outcome
            .exec
            .as_ref()
            .and_then(|exec| exec.vm_err.clone());
        let status = if outcome.apply_err.is_some() || vm_err.is_some() {
            TxStatus::Failed
        } else {
            TxStatus::Success
        };

        // Reported intrinsic gas: the patched computation runs only when
        // the schedule actually touches a TX_* key; otherwise the fork
        // defaults flow through an empty schedule.
        let empty = GasSchedule::default();
        let effective = match active_schedule {
            Some(schedule) if schedule.has_intrinsic_overrides() => schedule,
            _ => &empty,
        };
        let (intrinsic_gas, _floor) = intrinsic_gas_for_tx(effective, tx, &rules);

        Ok(ExecutionOutcome {
            gas_used: outcome
                .exec
                .as_ref()
                .map(|exec| exec.receipt_gas_used)
                .unwrap_or_default(),
            intrinsic_gas,
            apply_err: outcome.apply_err,
            vm_err,
            status,
            revert_count: 0,
            opcode_count: 0,
            call_errors: Vec::new(),
        })
    }
}
