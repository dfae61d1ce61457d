//! In-memory chain and scripted interpreter for driving the simulator.
//!
//! Scripts describe the opcode stream a transaction executes; the
//! interpreter charges gas through the engine's dispatch table exactly
//! like a production integration would, fires the tracer hooks, applies
//! refunds and reports receipts. State views are fresh per execution.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use gascope_common::types::{
    AccessListItem, Block, BlockHeader, BlockNumber, Receipt, Transaction, TxKind,
};
use gascope_common::{ChainRules, Fork, Opcode};
use gascope_engine::errors::{EngineError, GasError};
use gascope_engine::gas::{GasFrame, MemoryGauge, memory_gas_cost};
use gascope_engine::intrinsic::intrinsic_gas_for_tx;
use gascope_engine::jump_table::JumpTable;
use gascope_engine::provider::test_support::MockState;
use gascope_engine::provider::{
    ApplyOutcome, BlockContext, ExecOutput, ExecutionProvider, Interpreter, InterpreterConfig,
    Message, StateAccess, TxContext,
};
use gascope_engine::schedule::GasSchedule;
use gascope_engine::tracer::{OpScope, VmContextView};

/// One step of a scripted execution, all at frame depth 1.
#[derive(Debug, Clone)]
pub enum Step {
    /// Plain opcode with its operand stack (bottom first).
    Op { op: Opcode, stack: Vec<U256> },
    /// CALL-family opcode. The child frame consumes `child_spend` of its
    /// allocation and returns; unuseds flow back to the caller.
    Call {
        op: Opcode,
        to: Address,
        value: u64,
        gas_request: u64,
        child_spend: u64,
    },
}

impl Step {
    pub fn op(op: Opcode, stack: &[u64]) -> Self {
        Step::Op {
            op,
            stack: stack.iter().copied().map(U256::from).collect(),
        }
    }
}

/// A transaction plus everything needed to re-execute it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTx {
    pub tx: Transaction,
    pub script: Vec<Step>,
    /// Committed storage of the callee before the transaction.
    pub committed_storage: Vec<(H256, U256)>,
    /// Accounts that exist in pre-tx state.
    pub existing_accounts: Vec<Address>,
}

/// In-memory chain: blocks plus per-transaction scripts.
#[derive(Debug, Default)]
pub struct MockChain {
    pub fork: Fork,
    blocks: HashMap<BlockNumber, Block>,
    scripts: HashMap<H256, ScriptedTx>,
    tx_lookup: HashMap<H256, (BlockNumber, u64)>,
    tx_num_min: HashMap<BlockNumber, u64>,
}

impl MockChain {
    pub fn new(fork: Fork) -> Self {
        Self {
            fork,
            ..Default::default()
        }
    }

    /// Adds a block; transaction numbering follows the convention
    /// `tx_num = tx_num_min + index + 1`.
    pub fn add_block(&mut self, number: BlockNumber, gas_limit: u64, txs: Vec<ScriptedTx>) {
        let tx_num_min = number * 1000;
        self.tx_num_min.insert(number, tx_num_min);

        let mut transactions = Vec::with_capacity(txs.len());
        for (index, scripted) in txs.into_iter().enumerate() {
            let hash = scripted.tx.hash;
            self.tx_lookup
                .insert(hash, (number, tx_num_min + index as u64 + 1));
            transactions.push(scripted.tx.clone());
            self.scripts.insert(hash, scripted);
        }

        self.blocks.insert(
            number,
            Block {
                header: BlockHeader {
                    number,
                    gas_limit,
                    timestamp: 1_700_000_000 + number,
                    ..Default::default()
                },
                transactions,
            },
        );
    }

}

#[async_trait]
impl gascope_engine::provider::BlockReader for MockChain {
    async fn current_block_number(&self) -> Result<BlockNumber, EngineError> {
        Ok(self.blocks.keys().copied().max().unwrap_or_default())
    }

    async fn block_by_number(&self, number: BlockNumber) -> Result<Option<Block>, EngineError> {
        Ok(self.blocks.get(&number).cloned())
    }

    async fn transaction_lookup(
        &self,
        hash: H256,
    ) -> Result<Option<(BlockNumber, u64)>, EngineError> {
        Ok(self.tx_lookup.get(&hash).copied())
    }

    async fn receipts(&self, _number: BlockNumber) -> Result<Vec<Receipt>, EngineError> {
        Ok(Vec::new())
    }

    async fn tx_num_min(&self, number: BlockNumber) -> Result<u64, EngineError> {
        self.tx_num_min
            .get(&number)
            .copied()
            .ok_or(EngineError::BlockNotFound(number))
    }
}

/// Execution provider over the same chain data. Kept separate from the
/// reader instance so the simulator can own both sides.
#[derive(Debug, Default)]
pub struct MockProvider {
    pub fork: Fork,
    scripts: HashMap<H256, ScriptedTx>,
    blocks: HashMap<BlockNumber, Block>,
}

impl MockProvider {
    pub fn from_chain(chain: &MockChain) -> Self {
        Self {
            fork: chain.fork,
            scripts: chain.scripts.clone(),
            blocks: chain.blocks.clone(),
        }
    }

    fn rules(&self) -> ChainRules {
        ChainRules::for_fork(self.fork)
    }
}

impl ExecutionProvider for MockProvider {
    type View = MockState;
    type Interpreter<'run>
        = MockInterpreter<'run>
    where
        Self: 'run;

    fn build_block_context(
        &self,
        header: &BlockHeader,
        tx_index: usize,
    ) -> Result<(Self::View, BlockContext), EngineError> {
        let block = self
            .blocks
            .get(&header.number)
            .ok_or(EngineError::BlockNotFound(header.number))?;
        let tx = block
            .transactions
            .get(tx_index)
            .ok_or(EngineError::TxIndexOutOfRange(tx_index))?;
        let scripted = self
            .scripts
            .get(&tx.hash)
            .ok_or(EngineError::Provider("missing script".to_string()))?;

        let mut view = MockState::default();
        let callee = match &tx.to {
            TxKind::Call(addr) => *addr,
            TxKind::Create => Address::repeat_byte(0xC0),
        };
        for (slot, value) in &scripted.committed_storage {
            view.set_committed(callee, *slot, *value);
        }
        for account in &scripted.existing_accounts {
            view.exists.insert(*account);
        }

        Ok((
            view,
            BlockContext {
                rules: self.rules(),
                gas_limit: header.gas_limit,
                base_fee: header.base_fee_per_gas,
            },
        ))
    }

    fn build_tx_context(
        &self,
        _view: &mut Self::View,
        block: &Block,
        tx_index: usize,
    ) -> Result<(Message, TxContext), EngineError> {
        let tx = block
            .transactions
            .get(tx_index)
            .ok_or(EngineError::TxIndexOutOfRange(tx_index))?;
        let message = Message {
            from: Address::repeat_byte(0x11),
            to: tx.to.clone(),
            value: tx.value,
            data: tx.data.clone(),
            gas_limit: tx.gas_limit,
            check_gas_cap: true,
        };
        let tx_ctx = TxContext {
            tx_hash: tx.hash,
            origin: message.from,
            gas_price: U256::one(),
        };
        Ok((message, tx_ctx))
    }

    fn new_interpreter<'run>(
        &'run self,
        view: Self::View,
        block_ctx: BlockContext,
        tx_ctx: TxContext,
        config: InterpreterConfig<'run>,
    ) -> Self::Interpreter<'run> {
        MockInterpreter {
            provider: self,
            view,
            block_ctx,
            tx_ctx,
            config,
        }
    }
}

pub struct MockInterpreter<'run> {
    provider: &'run MockProvider,
    view: MockState,
    block_ctx: BlockContext,
    tx_ctx: TxContext,
    config: InterpreterConfig<'run>,
}

impl Interpreter for MockInterpreter<'_> {
    fn apply_message(
        &mut self,
        message: &Message,
        gas_pool: u64,
        refunds: bool,
        bailout: bool,
    ) -> Result<ApplyOutcome, EngineError> {
        let _ = bailout; // balances are not modelled
        let rules = self.block_ctx.rules;

        let scripted = self
            .provider
            .scripts
            .get(&self.tx_ctx.tx_hash)
            .ok_or(EngineError::Provider("missing script".to_string()))?
            .clone();
        let tx = &scripted.tx;

        // Intrinsic gas: the schedule only participates when it touches a
        // TX_* key, mirroring the engine's reporting path.
        let empty = GasSchedule::default();
        let intrinsic_schedule = match self.config.schedule {
            Some(schedule) if schedule.has_intrinsic_overrides() => schedule,
            _ => &empty,
        };
        let (intrinsic, _floor) = intrinsic_gas_for_tx(intrinsic_schedule, tx, &rules);

        let gas_limit = message.gas_limit.min(gas_pool);
        if intrinsic == 0 || gas_limit < intrinsic {
            if let Some(hooks) = self.config.hooks.as_deref_mut() {
                hooks.on_tx_end(&Receipt::default(), Some("intrinsic gas too low"));
            }
            return Ok(ApplyOutcome {
                apply_err: Some("intrinsic gas too low".to_string()),
                exec: None,
            });
        }

        let base_table;
        let table = match self.config.jump_table {
            Some(table) => table,
            None => {
                base_table = JumpTable::base_for(&rules);
                &base_table
            }
        };

        let callee = match &message.to {
            TxKind::Call(addr) => *addr,
            TxKind::Create => Address::repeat_byte(0xC0),
        };

        if let Some(hooks) = self.config.hooks.as_deref_mut() {
            let ctx = VmContextView {
                block_number: 0,
                timestamp: 0,
                gas_limit: self.block_ctx.gas_limit,
                base_fee: self.block_ctx.base_fee,
            };
            hooks.on_tx_start(&ctx, tx, message.from);
        }

        // Access-list entries are warm from the start (EIP-2930).
        for AccessListItem {
            address,
            storage_keys,
        } in &tx.access_list
        {
            self.view.add_address_to_access_list(*address);
            for key in storage_keys {
                self.view.add_slot_to_access_list(*address, *key);
            }
        }

        let mut gas_remaining = gas_limit - intrinsic;
        let mut memory = MemoryGauge::default();
        let mut vm_err: Option<String> = None;
        let mut pc: u64 = 0;

        for step in &scripted.script {
            let (op, stack) = match step {
                Step::Op { op, stack } => (*op, stack.clone()),
                Step::Call {
                    op,
                    to,
                    value,
                    gas_request,
                    ..
                } => (*op, call_stack(*op, *to, *value, *gas_request)),
            };

            let Some(entry) = table.get(op) else {
                vm_err = Some("invalid opcode".to_string());
                break;
            };

            let memory_size = match entry.memory_size {
                Some(size_fn) => match size_fn(&stack) {
                    Ok(size) => size,
                    Err(_) => {
                        vm_err = Some("gas uint64 overflow".to_string());
                        break;
                    }
                },
                None => 0,
            };

            // Constant gas first; the dynamic rule sees the residual.
            let gas_before = gas_remaining;
            if gas_remaining < entry.constant_gas {
                emit_opcode(
                    &mut self.config,
                    &self.view,
                    pc,
                    op,
                    gas_before,
                    entry.constant_gas,
                    &stack,
                    Some("out of gas"),
                );
                vm_err = Some("out of gas".to_string());
                gas_remaining = 0;
                break;
            }
            let scope_gas = gas_remaining - entry.constant_gas;

            let mut frame = GasFrame {
                stack: &stack,
                address: callee,
                memory: &mut memory,
            };
            let charge = if entry.dynamic_gas.is_native() {
                // The interpreter's own rule: plain memory expansion.
                match memory_gas_cost(frame.memory, memory_size) {
                    Ok(cost) => gascope_engine::jump_table::GasCharge {
                        cost,
                        child_gas: None,
                    },
                    Err(err) => {
                        vm_err = Some(gas_error_message(err).to_string());
                        break;
                    }
                }
            } else {
                match entry
                    .dynamic_gas
                    .eval(&mut self.view, &mut frame, scope_gas, memory_size, &rules)
                {
                    Ok(charge) => charge,
                    Err(err) => {
                        let message = gas_error_message(err);
                        emit_opcode(
                            &mut self.config,
                            &self.view,
                            pc,
                            op,
                            gas_before,
                            gas_before,
                            &stack,
                            Some(message),
                        );
                        vm_err = Some(message.to_string());
                        gas_remaining = 0;
                        break;
                    }
                }
            };

            let total_cost = entry.constant_gas + charge.cost;
            if total_cost > gas_remaining {
                emit_opcode(
                    &mut self.config,
                    &self.view,
                    pc,
                    op,
                    gas_before,
                    total_cost,
                    &stack,
                    Some("out of gas"),
                );
                vm_err = Some("out of gas".to_string());
                gas_remaining = 0;
                break;
            }

            emit_opcode(
                &mut self.config,
                &self.view,
                pc,
                op,
                gas_before,
                total_cost,
                &stack,
                None,
            );
            gas_remaining -= total_cost;
            memory.len = memory.len.max(gascope_engine::gas::to_word_size(memory_size) * 32);

            // Run the child frame and return its unspent allocation.
            if let Step::Call {
                to,
                value,
                child_spend,
                ..
            } = step
            {
                let child_gas = charge.child_gas.unwrap_or_default();
                let child_spend = (*child_spend).min(child_gas);
                if let Some(hooks) = self.config.hooks.as_deref_mut() {
                    hooks.on_enter(
                        1,
                        op.into(),
                        callee,
                        *to,
                        false,
                        &Bytes::new(),
                        child_gas,
                        U256::from(*value),
                        &[],
                    );
                    hooks.on_exit(1, &Bytes::new(), child_spend, None, false);
                }
                gas_remaining += child_gas - child_spend;
            }

            pc += 1;
        }

        let mut gas_used = gas_limit - gas_remaining;
        if refunds && vm_err.is_none() {
            let refund = self.view.refund().min(gas_used / 5);
            gas_used -= refund;
        }

        if let Some(hooks) = self.config.hooks.as_deref_mut() {
            hooks.on_exit(0, &Bytes::new(), gas_used, vm_err.as_deref(), false);
            hooks.on_tx_end(
                &Receipt {
                    gas_used,
                    succeeded: vm_err.is_none(),
                },
                None,
            );
        }

        Ok(ApplyOutcome {
            apply_err: None,
            exec: Some(ExecOutput {
                receipt_gas_used: gas_used,
                block_gas_used: gas_used,
                vm_err,
                return_data: Bytes::new(),
            }),
        })
    }
}

fn gas_error_message(err: GasError) -> &'static str {
    match err {
        GasError::OutOfGas => "out of gas",
        GasError::Overflow => "gas uint64 overflow",
        GasError::ReentrancySentry => "not enough gas for reentrancy sentry",
    }
}

/// Builds the operand stack for a CALL-family opcode, bottom first.
fn call_stack(op: Opcode, to: Address, value: u64, gas_request: u64) -> Vec<U256> {
    let addr = U256::from_big_endian(to.as_bytes());
    let with_value = matches!(op, Opcode::CALL | Opcode::CALLCODE);
    let mut stack = vec![U256::zero(); 4]; // ret_len, ret_off, args_len, args_off
    if with_value {
        stack.push(U256::from(value));
    }
    stack.push(addr);
    stack.push(U256::from(gas_request));
    stack
}

#[expect(clippy::too_many_arguments)]
fn emit_opcode(
    config: &mut InterpreterConfig<'_>,
    view: &MockState,
    pc: u64,
    op: Opcode,
    gas: u64,
    cost: u64,
    stack: &[U256],
    err: Option<&str>,
) {
    if let Some(hooks) = config.hooks.as_deref_mut() {
        let scope = OpScope {
            stack,
            refund: view.refund(),
        };
        hooks.on_opcode(pc, op.into(), gas, cost, &scope, &[], 1, err);
    }
}

/// A transaction calling `to` with a script, funded with `gas_limit`.
pub fn scripted_call(
    hash_seed: u64,
    to: Address,
    gas_limit: u64,
    script: Vec<Step>,
) -> ScriptedTx {
    ScriptedTx {
        tx: Transaction {
            hash: H256::from_low_u64_be(hash_seed),
            to: TxKind::Call(to),
            gas_limit,
            ..Default::default()
        },
        script,
        ..Default::default()
    }
}
