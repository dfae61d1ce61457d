//! Interfaces to the node that hosts the simulator.
//!
//! The engine never touches a database or an interpreter loop directly: a
//! [`BlockReader`] serves historical blocks, and an [`ExecutionProvider`]
//! opens pre-transaction state views and runs messages through its own
//! interpreter with our schedule, dispatch table and tracer hooks
//! injected.

use async_trait::async_trait;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use gascope_common::ChainRules;
use gascope_common::types::{Block, BlockHeader, BlockNumber, Receipt, TxKind};

use crate::errors::EngineError;
use crate::jump_table::JumpTable;
use crate::schedule::GasSchedule;
use crate::tracer::TraceHooks;

/// State mutations and queries the patched gas rules need. Implemented by
/// the provider's per-execution state view.
pub trait StateAccess {
    /// Adds the slot to the transaction's access list. Returns true when
    /// the slot was not yet present (a cold access).
    fn add_slot_to_access_list(&mut self, address: Address, key: H256) -> bool;

    /// Adds the address to the transaction's access list. Returns true
    /// when the address was not yet present.
    fn add_address_to_access_list(&mut self, address: Address) -> bool;

    /// Current value of a storage slot.
    fn storage_value(&mut self, address: Address, key: H256) -> U256;

    /// Value of the slot as committed before this transaction.
    fn committed_storage_value(&mut self, address: Address, key: H256) -> U256;

    fn add_refund(&mut self, gas: u64);
    fn sub_refund(&mut self, gas: u64);
    fn refund(&self) -> u64;

    fn account_exists(&mut self, address: Address) -> bool;
    /// EIP-161 emptiness: no code, zero nonce, zero balance.
    fn account_is_empty(&mut self, address: Address) -> bool;
}

/// Block-level execution context produced together with a state view.
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub rules: ChainRules,
    pub gas_limit: u64,
    pub base_fee: Option<u64>,
}

/// Transaction-level context derived from the recovered sender.
#[derive(Debug, Clone, Default)]
pub struct TxContext {
    pub tx_hash: H256,
    pub origin: Address,
    pub gas_price: U256,
}

/// The message a transaction resolves to once its sender is recovered.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub from: Address,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    /// Enforce the per-transaction gas cap (EIP-7825). Cleared in
    /// max-gas-limit simulations.
    pub check_gas_cap: bool,
}

impl Message {
    /// Replaces the gas limit, as the max-gas-limit simulation mode does
    /// when lifting a transaction to the block's gas limit.
    pub fn change_gas(&mut self, gas_limit: u64) {
        self.gas_limit = gas_limit;
    }
}

/// What the engine injects into each interpreter run.
pub struct InterpreterConfig<'run> {
    pub hooks: Option<&'run mut dyn TraceHooks>,
    /// Dispatch table with schedule overrides applied. `None` runs the
    /// interpreter's own fork baseline.
    pub jump_table: Option<&'run JumpTable>,
    /// Schedule for rules outside the table (intrinsic gas, precompiles).
    pub schedule: Option<&'run GasSchedule>,
    /// Skip base-fee validation; simulations replay historical gas prices.
    pub no_base_fee: bool,
}

/// Result of applying a message, when the interpreter actually ran.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Post-refund gas charged to the sender.
    pub receipt_gas_used: u64,
    /// Gas counted against the block (EIP-7778 split).
    pub block_gas_used: u64,
    pub vm_err: Option<String>,
    pub return_data: Bytes,
}

/// Outcome of [`Interpreter::apply_message`]. A pre-execution failure
/// (e.g. intrinsic gas too low) leaves `exec` empty; it is a simulation
/// result, not an infrastructure error.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub apply_err: Option<String>,
    pub exec: Option<ExecOutput>,
}

/// One configured interpreter instance, valid for a single execution.
pub trait Interpreter {
    fn apply_message(
        &mut self,
        message: &Message,
        gas_pool: u64,
        refunds: bool,
        bailout: bool,
    ) -> Result<ApplyOutcome, EngineError>;
}

/// Factory for state views and interpreters, one pair per execution.
pub trait ExecutionProvider: Send + Sync {
    type View: StateAccess;
    type Interpreter<'run>: Interpreter
    where
        Self: 'run;

    /// Opens a fresh read-only state view positioned immediately before
    /// `tx_index` of the header's block and derives the block context.
    fn build_block_context(
        &self,
        header: &BlockHeader,
        tx_index: usize,
    ) -> Result<(Self::View, BlockContext), EngineError>;

    /// Recovers the sender and builds the message for one transaction.
    fn build_tx_context(
        &self,
        view: &mut Self::View,
        block: &Block,
        tx_index: usize,
    ) -> Result<(Message, TxContext), EngineError>;

    fn new_interpreter<'run>(
        &'run self,
        view: Self::View,
        block_ctx: BlockContext,
        tx_ctx: TxContext,
        config: InterpreterConfig<'run>,
    ) -> Self::Interpreter<'run>;
}

/// Read access to historical chain data. All methods are suspension
/// points; the driver observes cancellation between them.
#[async_trait]
pub trait BlockReader: Send + Sync {
    async fn current_block_number(&self) -> Result<BlockNumber, EngineError>;

    async fn block_by_number(&self, number: BlockNumber) -> Result<Option<Block>, EngineError>;

    /// Maps a transaction hash to its block number and absolute tx number.
    async fn transaction_lookup(
        &self,
        hash: H256,
    ) -> Result<Option<(BlockNumber, u64)>, EngineError>;

    async fn receipts(&self, number: BlockNumber) -> Result<Vec<Receipt>, EngineError>;

    /// First absolute tx number of the block; `tx_index = tx_num −
    /// tx_num_min − 1`.
    async fn tx_num_min(&self, number: BlockNumber) -> Result<u64, EngineError>;
}

/// In-memory [`StateAccess`] used by the engine's own tests and by
/// providers that want a starting point.
pub mod test_support {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone, Default)]
    pub struct MockState {
        pub slots_accessed: HashSet<(Address, H256)>,
        pub addresses_accessed: HashSet<Address>,
        pub storage: HashMap<(Address, H256), U256>,
        pub committed: HashMap<(Address, H256), U256>,
        pub exists: HashSet<Address>,
        refund: u64,
    }

    impl MockState {
        pub fn set_storage(&mut self, address: Address, key: H256, value: U256) {
            self.storage.insert((address, key), value);
        }

        /// Seeds both the committed and the current value, as at tx start.
        pub fn set_committed(&mut self, address: Address, key: H256, value: U256) {
            self.committed.insert((address, key), value);
            self.storage.insert((address, key), value);
        }
    }

    impl StateAccess for MockState {
        fn add_slot_to_access_list(&mut self, address: Address, key: H256) -> bool {
            self.slots_accessed.insert((address, key))
        }

        fn add_address_to_access_list(&mut self, address: Address) -> bool {
            self.addresses_accessed.insert(address)
        }

        fn storage_value(&mut self, address: Address, key: H256) -> U256 {
            self.storage
                .get(&(address, key))
                .copied()
                .unwrap_or_default()
        }

        fn committed_storage_value(&mut self, address: Address, key: H256) -> U256 {
            self.committed
                .get(&(address, key))
                .copied()
                .unwrap_or_default()
        }

        fn add_refund(&mut self, gas: u64) {
            self.refund += gas;
        }

        fn sub_refund(&mut self, gas: u64) {
            self.refund = self.refund.saturating_sub(gas);
        }

        fn refund(&self) -> u64 {
            self.refund
        }

        fn account_exists(&mut self, address: Address) -> bool {
            self.exists.contains(&address)
        }

        fn account_is_empty(&mut self, address: Address) -> bool {
            !self.exists.contains(&address)
        }
    }
}
