use ethereum_types::H256;
use gascope_common::types::BlockNumber;
use thiserror::Error;

/// Failure of a single gas computation.
///
/// These surface as in-EVM errors on the execution they belong to; they
/// never abort a simulation. Subtractions in the repricing formulas
/// saturate instead of producing `Overflow` — only genuine add/mul
/// overflow and the SSTORE sentry report here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GasError {
    #[error("out of gas")]
    OutOfGas,
    #[error("gas uint64 overflow")]
    Overflow,
    #[error("not enough gas for reentrancy sentry")]
    ReentrancySentry,
}

/// Infrastructure-level failures, returned to the RPC boundary untouched.
///
/// A failed *execution* is a result, not an error: pre-execution and
/// in-EVM failures are reported on [`crate::driver::ExecutionOutcome`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("block {0} not found")]
    BlockNotFound(BlockNumber),
    #[error("transaction {0:#x} not found")]
    TransactionNotFound(H256),
    #[error("transaction {hash:#x} is in block {actual}, not {requested}")]
    BlockMismatch {
        hash: H256,
        actual: BlockNumber,
        requested: BlockNumber,
    },
    #[error("txNum underflow: txNum={tx_num}, txNumMin={tx_num_min}")]
    TxNumUnderflow { tx_num: u64, tx_num_min: u64 },
    #[error("transaction index {0} out of range")]
    TxIndexOutOfRange(usize),
    #[error("simulation cancelled")]
    Cancelled,
    #[error("provider error: {0}")]
    Provider(String),
}
