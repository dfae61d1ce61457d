//! Shared types for the gascope simulator.
//!
//! Everything the engine and the RPC layer agree on lives here: the fork
//! ladder and its derived activation rules, the opcode set with its
//! mnemonic table, and the minimal block/transaction model the simulation
//! driver consumes from a block reader.

pub mod forks;
pub mod opcodes;
pub mod types;

pub use ethereum_types::{Address, H160, H256, U256};

pub use forks::{ChainRules, Fork};
pub use opcodes::{Opcode, opcode_name};
