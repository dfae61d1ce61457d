//! # gascope-engine
//!
//! Gas-accounting and dual-execution core of the gascope simulator.
//!
//! The engine re-executes historical transactions under a user-supplied
//! [`schedule::GasSchedule`] and reports, side by side with a baseline
//! run, the gas each transaction would consume, the per-opcode breakdown,
//! execution divergence and failure modes.
//!
//! ## Architecture
//!
//! ```text
//! request ──► GasSimulator (driver)
//!                │  per transaction, twice from identical pre-tx state:
//!                │
//!                ├─ defaults_for(rules) ──► GasSchedule (overrides merged)
//!                ├─ JumpTable::build(rules, schedule)
//!                ├─ provider.new_interpreter(view, ..., hooks/table/schedule)
//!                │     gas charged via gas::* reading the schedule
//!                │     SummaryTracer observes every opcode & call boundary
//!                └─ merge baseline + simulated ──► response
//! ```
//!
//! The interpreter loop, state database and block storage stay outside;
//! [`provider`] defines the traits they plug in through.

pub mod constants;
pub mod defaults;
pub mod driver;
pub mod errors;
pub mod gas;
pub mod intrinsic;
pub mod jump_table;
pub mod precompile_gas;
pub mod provider;
pub mod schedule;
pub mod tracer;

pub use driver::GasSimulator;
pub use errors::{EngineError, GasError};
pub use jump_table::{DynamicGas, JumpTable, OpcodeEntry};
pub use schedule::GasSchedule;
