//! Per-fork opcode dispatch tables with schedule overrides applied.
//!
//! The table is the contract between the simulator and the interpreter: a
//! 256-slot array where each defined opcode carries its constant-gas
//! charge, a tagged dynamic-gas rule bound to schedule parameters at build
//! time, a stack-validation spec and a memory-size function. The
//! interpreter matches on the rule tag once per opcode; there are no
//! function pointers into the schedule and no global state.

use std::str::FromStr;

use ethereum_types::U256;
use gascope_common::{ChainRules, Opcode};

use crate::constants::*;
use crate::errors::GasError;
use crate::gas::{
    self, CallCharge, CallKind, CallParams, GasFrame, SloadParams, SstoreParams, clearing_refund,
};
use crate::provider::StateAccess;
use crate::schedule::{GasSchedule, keys};

/// Highest stack depth; `max_stack` encodes how close to it an opcode may
/// start.
pub const STACK_LIMIT: usize = 1024;

pub type MemorySizeFn = fn(&[U256]) -> Result<u64, GasError>;

/// Dynamic-gas rule for one opcode, with its parameters bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicGas {
    /// No dynamic component.
    None,
    /// Priced by the interpreter's built-in rule; not re-parameterisable
    /// (legacy SSTORE, account-access surcharges, CREATE, SELFDESTRUCT,
    /// plain memory expansion).
    Native,
    Sload(SloadParams),
    Sstore(SstoreParams),
    Exp { base_gas: u64, byte_gas: u64 },
    Keccak256 { word_gas: u64 },
    Log { topics: u64, base_gas: u64, topic_gas: u64, data_gas: u64 },
    Copy { stack_pos: usize, copy_gas: u64 },
    Call { kind: CallKind, params: CallParams },
}

/// Cost of one dynamic-gas evaluation. `child_gas` is set by the CALL
/// family: the allocation the interpreter must hand to the child frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasCharge {
    pub cost: u64,
    pub child_gas: Option<u64>,
}

impl DynamicGas {
    /// True when the interpreter should fall back to its own rule.
    pub fn is_native(&self) -> bool {
        matches!(self, DynamicGas::Native)
    }

    /// Evaluates the rule against the executing frame.
    pub fn eval(
        &self,
        state: &mut dyn StateAccess,
        frame: &mut GasFrame<'_>,
        scope_gas: u64,
        memory_size: u64,
        rules: &ChainRules,
    ) -> Result<GasCharge, GasError> {
        let charge = match self {
            DynamicGas::None | DynamicGas::Native => GasCharge::default(),
            DynamicGas::Sload(params) => GasCharge {
                cost: gas::sload(params, state, frame)?,
                child_gas: None,
            },
            DynamicGas::Sstore(params) => GasCharge {
                cost: gas::sstore(params, state, frame, scope_gas)?,
                child_gas: None,
            },
            DynamicGas::Exp { base_gas, byte_gas } => GasCharge {
                cost: gas::exp(*base_gas, *byte_gas, frame)?,
                child_gas: None,
            },
            DynamicGas::Keccak256 { word_gas } => GasCharge {
                cost: gas::keccak256(*word_gas, frame, memory_size)?,
                child_gas: None,
            },
            DynamicGas::Log {
                topics,
                base_gas,
                topic_gas,
                data_gas,
            } => GasCharge {
                cost: gas::log(*topics, *base_gas, *topic_gas, *data_gas, frame, memory_size)?,
                child_gas: None,
            },
            DynamicGas::Copy {
                stack_pos,
                copy_gas,
            } => GasCharge {
                cost: gas::copy(*stack_pos, *copy_gas, frame, memory_size)?,
                child_gas: None,
            },
            DynamicGas::Call { kind, params } => {
                let CallCharge { cost, child_gas } =
                    gas::call_variant(*kind, params, state, frame, scope_gas, memory_size, rules)?;
                GasCharge {
                    cost,
                    child_gas: Some(child_gas),
                }
            }
        };
        Ok(charge)
    }
}

/// One defined opcode slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub constant_gas: u64,
    pub dynamic_gas: DynamicGas,
    /// Fewest stack items the opcode needs.
    pub min_stack: usize,
    /// Largest stack the opcode may start from without overflowing.
    pub max_stack: usize,
    pub memory_size: Option<MemorySizeFn>,
}

impl OpcodeEntry {
    const fn new(constant_gas: u64, pops: usize, pushes: usize) -> Self {
        Self {
            constant_gas,
            dynamic_gas: DynamicGas::None,
            min_stack: pops,
            max_stack: STACK_LIMIT + pops - pushes,
            memory_size: None,
        }
    }

    const fn with_dynamic(mut self, dynamic_gas: DynamicGas) -> Self {
        self.dynamic_gas = dynamic_gas;
        self
    }

    const fn with_memory(mut self, memory_size: MemorySizeFn) -> Self {
        self.memory_size = Some(memory_size);
        self
    }
}

/// 256-slot dispatch table for one fork.
#[derive(Debug, Clone)]
pub struct JumpTable {
    entries: [Option<OpcodeEntry>; 256],
}

impl JumpTable {
    pub fn get(&self, opcode: Opcode) -> Option<&OpcodeEntry> {
        #[expect(clippy::indexing_slicing)] // opcode byte indexes a 256 table
        self.entries[usize::from(opcode)].as_ref()
    }

    pub fn get_byte(&self, byte: u8) -> Option<&OpcodeEntry> {
        #[expect(clippy::as_conversions)]
        #[expect(clippy::indexing_slicing)]
        self.entries[byte as usize].as_ref()
    }

    fn entry_mut(&mut self, opcode: Opcode) -> Option<&mut OpcodeEntry> {
        #[expect(clippy::indexing_slicing)]
        self.entries[usize::from(opcode)].as_mut()
    }

    fn set(&mut self, opcode: Opcode, entry: OpcodeEntry) {
        #[expect(clippy::indexing_slicing)]
        {
            self.entries[usize::from(opcode)] = Some(entry);
        }
    }

    pub fn set_constant_gas(&mut self, opcode: Opcode, gas: u64) {
        if let Some(entry) = self.entry_mut(opcode) {
            entry.constant_gas = gas;
        }
    }

    pub fn set_dynamic_gas(&mut self, opcode: Opcode, dynamic_gas: DynamicGas) {
        if let Some(entry) = self.entry_mut(opcode) {
            entry.dynamic_gas = dynamic_gas;
        }
    }

    /// Defined opcodes with their constant-gas slots, in byte order.
    pub fn constant_gas_entries(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        self.entries.iter().enumerate().filter_map(|(byte, entry)| {
            let entry = entry.as_ref()?;
            #[expect(clippy::as_conversions)] // enumerate over 256 slots
            Some((Opcode::from(byte as u8), entry.constant_gas))
        })
    }

    /// The canonical table for a fork, before any user override.
    pub fn base_for(rules: &ChainRules) -> JumpTable {
        let mut jt = JumpTable::frontier();
        if rules.is_homestead {
            jt.apply_homestead();
        }
        if rules.is_tangerine {
            jt.apply_tangerine();
        }
        if rules.is_spurious_dragon {
            jt.apply_spurious_dragon();
        }
        if rules.is_byzantium {
            jt.apply_byzantium();
        }
        if rules.is_constantinople {
            jt.apply_constantinople();
        }
        if rules.is_istanbul {
            jt.apply_istanbul();
        }
        if rules.is_berlin {
            jt.apply_berlin();
        }
        if rules.is_london {
            jt.apply_london();
        }
        if rules.is_shanghai {
            jt.apply_shanghai();
        }
        if rules.is_cancun {
            jt.apply_cancun();
        }
        if rules.is_osaka {
            jt.apply_osaka();
        }
        jt
    }

    /// Fork baseline with every schedule override applied. An empty
    /// schedule yields the baseline unchanged.
    pub fn build(rules: &ChainRules, schedule: &GasSchedule) -> JumpTable {
        let mut jt = JumpTable::base_for(rules);
        if schedule.is_empty() {
            return jt;
        }
        jt.apply_overrides(rules, schedule);
        jt
    }

    fn apply_overrides(&mut self, rules: &ChainRules, schedule: &GasSchedule) {
        // Plain constant-gas overrides first: any key that parses as a
        // mnemonic rewrites that opcode's constant slot. Semantic keys and
        // unknown names fall through. EXP is excluded here because its
        // base cost lives in the dynamic formula below.
        for (key, gas) in schedule.iter() {
            let Ok(opcode) = Opcode::from_str(key) else {
                continue;
            };
            if opcode == Opcode::EXP {
                continue;
            }
            self.set_constant_gas(opcode, gas);
        }

        // SLOAD: cold/warm access pricing (EIP-2929).
        if schedule.has(keys::SLOAD_COLD) || schedule.has(keys::SLOAD_WARM) {
            self.set_dynamic_gas(
                Opcode::SLOAD,
                DynamicGas::Sload(SloadParams {
                    cold_cost: schedule.get_or(keys::SLOAD_COLD, COLD_SLOAD_COST),
                    warm_cost: schedule.get_or(keys::SLOAD_WARM, WARM_STORAGE_READ_COST),
                }),
            );
        }

        // SSTORE: set/reset/clear metering (EIP-2929 + EIP-2200). The
        // clearing refund is derived from the overridden values.
        if schedule.has(keys::SSTORE_SET)
            || schedule.has(keys::SSTORE_RESET)
            || schedule.has(keys::SLOAD_COLD)
            || schedule.has(keys::SLOAD_WARM)
        {
            let cold_sload_cost = schedule.get_or(keys::SLOAD_COLD, COLD_SLOAD_COST);
            let warm_read_cost = schedule.get_or(keys::SLOAD_WARM, WARM_STORAGE_READ_COST);
            let set_gas = schedule.get_or(keys::SSTORE_SET, SSTORE_SET_GAS);
            let reset_gas = schedule.get_or(keys::SSTORE_RESET, SSTORE_RESET_GAS);
            self.set_dynamic_gas(
                Opcode::SSTORE,
                DynamicGas::Sstore(SstoreParams {
                    cold_sload_cost,
                    warm_read_cost,
                    set_gas,
                    reset_gas,
                    clearing_refund: clearing_refund(reset_gas, cold_sload_cost),
                    sentry_gas: SSTORE_SENTRY_GAS,
                }),
            );
        }

        // EXP: base + per-byte. The mnemonic key feeds the base term.
        if schedule.has("EXP") || schedule.has(keys::EXP_BYTE) {
            let default_byte_gas = if rules.is_spurious_dragon {
                EXP_BYTE_GAS_EIP160
            } else {
                EXP_BYTE_GAS_FRONTIER
            };
            self.set_dynamic_gas(
                Opcode::EXP,
                DynamicGas::Exp {
                    base_gas: schedule.get_or("EXP", EXP_GAS),
                    byte_gas: schedule.get_or(keys::EXP_BYTE, default_byte_gas),
                },
            );
        }

        // KECCAK256: base handled by the mnemonic pass, per-word here.
        if schedule.has(keys::KECCAK256_WORD) {
            self.set_dynamic_gas(
                Opcode::KECCAK256,
                DynamicGas::Keccak256 {
                    word_gas: schedule.get_or(keys::KECCAK256_WORD, KECCAK256_WORD_GAS),
                },
            );
        }

        // LOG0..LOG4 share the three log parameters.
        if schedule.has(keys::LOG) || schedule.has(keys::LOG_TOPIC) || schedule.has(keys::LOG_DATA)
        {
            let base_gas = schedule.get_or(keys::LOG, LOG_GAS);
            let topic_gas = schedule.get_or(keys::LOG_TOPIC, LOG_TOPIC_GAS);
            let data_gas = schedule.get_or(keys::LOG_DATA, LOG_DATA_GAS);
            for (topics, opcode) in [
                (0, Opcode::LOG0),
                (1, Opcode::LOG1),
                (2, Opcode::LOG2),
                (3, Opcode::LOG3),
                (4, Opcode::LOG4),
            ] {
                self.set_dynamic_gas(
                    opcode,
                    DynamicGas::Log {
                        topics,
                        base_gas,
                        topic_gas,
                        data_gas,
                    },
                );
            }
        }

        // COPY covers every memory-copier opcode. EXTCODECOPY's length
        // operand sits one position deeper.
        if schedule.has(keys::COPY) {
            let copy_gas = schedule.get_or(keys::COPY, COPY_GAS);
            for (opcode, stack_pos) in [
                (Opcode::CALLDATACOPY, 2),
                (Opcode::CODECOPY, 2),
                (Opcode::RETURNDATACOPY, 2),
                (Opcode::MCOPY, 2),
                (Opcode::EXTCODECOPY, 3),
            ] {
                self.set_dynamic_gas(
                    opcode,
                    DynamicGas::Copy {
                        stack_pos,
                        copy_gas,
                    },
                );
            }
        }

        // CALL family: the constant slot becomes the warm cost and the
        // dynamic rule charges the cold surcharge on first access.
        if schedule.has(keys::CALL_COLD)
            || schedule.has(keys::CALL_WARM)
            || schedule.has(keys::CALL_VALUE_XFER)
            || schedule.has(keys::CALL_NEW_ACCOUNT)
        {
            let params = CallParams {
                cold_access_cost: schedule.get_or(keys::CALL_COLD, COLD_ACCOUNT_ACCESS_COST),
                warm_access_cost: schedule.get_or(keys::CALL_WARM, WARM_STORAGE_READ_COST),
                value_xfer_cost: schedule.get_or(keys::CALL_VALUE_XFER, CALL_VALUE_TRANSFER_GAS),
                new_account_cost: schedule.get_or(keys::CALL_NEW_ACCOUNT, CALL_NEW_ACCOUNT_GAS),
            };
            for (opcode, kind) in [
                (Opcode::CALL, CallKind::Call),
                (Opcode::CALLCODE, CallKind::CallCode),
                (Opcode::DELEGATECALL, CallKind::DelegateCall),
                (Opcode::STATICCALL, CallKind::StaticCall),
            ] {
                if self.get(opcode).is_some() {
                    self.set_constant_gas(opcode, params.warm_access_cost);
                    self.set_dynamic_gas(opcode, DynamicGas::Call { kind, params });
                }
            }
        }
    }

    fn frontier() -> JumpTable {
        let mut jt = JumpTable {
            entries: [None; 256],
        };

        jt.set(Opcode::STOP, OpcodeEntry::new(0, 0, 0));
        jt.set(Opcode::ADD, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::MUL, OpcodeEntry::new(5, 2, 1));
        jt.set(Opcode::SUB, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::DIV, OpcodeEntry::new(5, 2, 1));
        jt.set(Opcode::SDIV, OpcodeEntry::new(5, 2, 1));
        jt.set(Opcode::MOD, OpcodeEntry::new(5, 2, 1));
        jt.set(Opcode::SMOD, OpcodeEntry::new(5, 2, 1));
        jt.set(Opcode::ADDMOD, OpcodeEntry::new(8, 3, 1));
        jt.set(Opcode::MULMOD, OpcodeEntry::new(8, 3, 1));
        jt.set(
            Opcode::EXP,
            OpcodeEntry::new(0, 2, 1).with_dynamic(DynamicGas::Exp {
                base_gas: EXP_GAS,
                byte_gas: EXP_BYTE_GAS_FRONTIER,
            }),
        );
        jt.set(Opcode::SIGNEXTEND, OpcodeEntry::new(5, 2, 1));

        jt.set(Opcode::LT, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::GT, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::SLT, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::SGT, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::EQ, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::ISZERO, OpcodeEntry::new(3, 1, 1));
        jt.set(Opcode::AND, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::OR, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::XOR, OpcodeEntry::new(3, 2, 1));
        jt.set(Opcode::NOT, OpcodeEntry::new(3, 1, 1));
        jt.set(Opcode::BYTE, OpcodeEntry::new(3, 2, 1));

        jt.set(
            Opcode::KECCAK256,
            OpcodeEntry::new(30, 2, 1)
                .with_dynamic(DynamicGas::Keccak256 {
                    word_gas: KECCAK256_WORD_GAS,
                })
                .with_memory(mem_keccak256),
        );

        jt.set(Opcode::ADDRESS, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::BALANCE, OpcodeEntry::new(20, 1, 1));
        jt.set(Opcode::ORIGIN, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::CALLER, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::CALLVALUE, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::CALLDATALOAD, OpcodeEntry::new(3, 1, 1));
        jt.set(Opcode::CALLDATASIZE, OpcodeEntry::new(2, 0, 1));
        jt.set(
            Opcode::CALLDATACOPY,
            OpcodeEntry::new(3, 3, 0)
                .with_dynamic(DynamicGas::Copy {
                    stack_pos: 2,
                    copy_gas: COPY_GAS,
                })
                .with_memory(mem_copy),
        );
        jt.set(Opcode::CODESIZE, OpcodeEntry::new(2, 0, 1));
        jt.set(
            Opcode::CODECOPY,
            OpcodeEntry::new(3, 3, 0)
                .with_dynamic(DynamicGas::Copy {
                    stack_pos: 2,
                    copy_gas: COPY_GAS,
                })
                .with_memory(mem_copy),
        );
        jt.set(Opcode::GASPRICE, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::EXTCODESIZE, OpcodeEntry::new(20, 1, 1));
        jt.set(
            Opcode::EXTCODECOPY,
            OpcodeEntry::new(20, 4, 0)
                .with_dynamic(DynamicGas::Copy {
                    stack_pos: 3,
                    copy_gas: COPY_GAS,
                })
                .with_memory(mem_extcodecopy),
        );

        jt.set(Opcode::BLOCKHASH, OpcodeEntry::new(20, 1, 1));
        jt.set(Opcode::COINBASE, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::TIMESTAMP, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::NUMBER, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::PREVRANDAO, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::GASLIMIT, OpcodeEntry::new(2, 0, 1));

        jt.set(Opcode::POP, OpcodeEntry::new(2, 1, 0));
        jt.set(
            Opcode::MLOAD,
            OpcodeEntry::new(3, 1, 1)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_mload),
        );
        jt.set(
            Opcode::MSTORE,
            OpcodeEntry::new(3, 2, 0)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_mstore),
        );
        jt.set(
            Opcode::MSTORE8,
            OpcodeEntry::new(3, 2, 0)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_mstore8),
        );
        jt.set(Opcode::SLOAD, OpcodeEntry::new(50, 1, 1));
        jt.set(
            Opcode::SSTORE,
            OpcodeEntry::new(0, 2, 0).with_dynamic(DynamicGas::Native),
        );
        jt.set(Opcode::JUMP, OpcodeEntry::new(8, 1, 0));
        jt.set(Opcode::JUMPI, OpcodeEntry::new(10, 2, 0));
        jt.set(Opcode::PC, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::MSIZE, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::GAS, OpcodeEntry::new(2, 0, 1));
        jt.set(Opcode::JUMPDEST, OpcodeEntry::new(1, 0, 0));

        for n in 0..32u8 {
            jt.set(Opcode::from(0x60 + n), OpcodeEntry::new(3, 0, 1));
        }
        for n in 0..16usize {
            #[expect(clippy::as_conversions)]
            jt.set(
                Opcode::from(0x80 + n as u8),
                OpcodeEntry::new(3, n + 1, n + 2),
            );
            #[expect(clippy::as_conversions)]
            jt.set(
                Opcode::from(0x90 + n as u8),
                OpcodeEntry::new(3, n + 2, n + 2),
            );
        }

        for topics in 0..=4u64 {
            #[expect(clippy::as_conversions)]
            jt.set(
                Opcode::from(0xA0 + topics as u8),
                OpcodeEntry::new(0, topics as usize + 2, 0)
                    .with_dynamic(DynamicGas::Log {
                        topics,
                        base_gas: LOG_GAS,
                        topic_gas: LOG_TOPIC_GAS,
                        data_gas: LOG_DATA_GAS,
                    })
                    .with_memory(mem_log),
            );
        }

        jt.set(
            Opcode::CREATE,
            OpcodeEntry::new(32000, 3, 1)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_create),
        );
        jt.set(
            Opcode::CALL,
            OpcodeEntry::new(40, 7, 1)
                .with_dynamic(DynamicGas::Call {
                    kind: CallKind::Call,
                    params: PRE_BERLIN_CALL_PARAMS,
                })
                .with_memory(mem_call),
        );
        jt.set(
            Opcode::CALLCODE,
            OpcodeEntry::new(40, 7, 1)
                .with_dynamic(DynamicGas::Call {
                    kind: CallKind::CallCode,
                    params: PRE_BERLIN_CALL_PARAMS,
                })
                .with_memory(mem_call),
        );
        jt.set(
            Opcode::RETURN,
            OpcodeEntry::new(0, 2, 0)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_return),
        );
        jt.set(
            Opcode::SELFDESTRUCT,
            OpcodeEntry::new(0, 1, 0).with_dynamic(DynamicGas::Native),
        );

        jt
    }

    fn apply_homestead(&mut self) {
        self.set(
            Opcode::DELEGATECALL,
            OpcodeEntry::new(40, 6, 1)
                .with_dynamic(DynamicGas::Call {
                    kind: CallKind::DelegateCall,
                    params: PRE_BERLIN_CALL_PARAMS,
                })
                .with_memory(mem_delegatecall),
        );
    }

    /// EIP-150 IO repricing.
    fn apply_tangerine(&mut self) {
        self.set_constant_gas(Opcode::BALANCE, 400);
        self.set_constant_gas(Opcode::EXTCODESIZE, 700);
        self.set_constant_gas(Opcode::EXTCODECOPY, 700);
        self.set_constant_gas(Opcode::SLOAD, 200);
        self.set_constant_gas(Opcode::CALL, 700);
        self.set_constant_gas(Opcode::CALLCODE, 700);
        self.set_constant_gas(Opcode::DELEGATECALL, 700);
        self.set_constant_gas(Opcode::SELFDESTRUCT, 5000);
    }

    /// EIP-160 EXP repricing.
    fn apply_spurious_dragon(&mut self) {
        self.set_dynamic_gas(
            Opcode::EXP,
            DynamicGas::Exp {
                base_gas: EXP_GAS,
                byte_gas: EXP_BYTE_GAS_EIP160,
            },
        );
    }

    fn apply_byzantium(&mut self) {
        self.set(
            Opcode::STATICCALL,
            OpcodeEntry::new(700, 6, 1)
                .with_dynamic(DynamicGas::Call {
                    kind: CallKind::StaticCall,
                    params: PRE_BERLIN_CALL_PARAMS,
                })
                .with_memory(mem_delegatecall),
        );
        self.set(Opcode::RETURNDATASIZE, OpcodeEntry::new(2, 0, 1));
        self.set(
            Opcode::RETURNDATACOPY,
            OpcodeEntry::new(3, 3, 0)
                .with_dynamic(DynamicGas::Copy {
                    stack_pos: 2,
                    copy_gas: COPY_GAS,
                })
                .with_memory(mem_copy),
        );
        self.set(
            Opcode::REVERT,
            OpcodeEntry::new(0, 2, 0)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_return),
        );
    }

    fn apply_constantinople(&mut self) {
        self.set(Opcode::SHL, OpcodeEntry::new(3, 2, 1));
        self.set(Opcode::SHR, OpcodeEntry::new(3, 2, 1));
        self.set(Opcode::SAR, OpcodeEntry::new(3, 2, 1));
        self.set(Opcode::EXTCODEHASH, OpcodeEntry::new(400, 1, 1));
        self.set(
            Opcode::CREATE2,
            OpcodeEntry::new(32000, 4, 1)
                .with_dynamic(DynamicGas::Native)
                .with_memory(mem_create),
        );
    }

    /// EIP-1884 repricing plus CHAINID/SELFBALANCE.
    fn apply_istanbul(&mut self) {
        self.set_constant_gas(Opcode::BALANCE, 700);
        self.set_constant_gas(Opcode::EXTCODEHASH, 700);
        self.set_constant_gas(Opcode::SLOAD, 800);
        self.set(Opcode::CHAINID, OpcodeEntry::new(2, 0, 1));
        self.set(Opcode::SELFBALANCE, OpcodeEntry::new(5, 0, 1));
    }

    /// EIP-2929: cold/warm access pricing. Constant slots keep the warm
    /// cost; the cold difference moves into the dynamic rules.
    fn apply_berlin(&mut self) {
        self.set_constant_gas(Opcode::SLOAD, 0);
        self.set_dynamic_gas(
            Opcode::SLOAD,
            DynamicGas::Sload(SloadParams {
                cold_cost: COLD_SLOAD_COST,
                warm_cost: WARM_STORAGE_READ_COST,
            }),
        );
        self.set_dynamic_gas(
            Opcode::SSTORE,
            DynamicGas::Sstore(SstoreParams {
                cold_sload_cost: COLD_SLOAD_COST,
                warm_read_cost: WARM_STORAGE_READ_COST,
                set_gas: SSTORE_SET_GAS,
                reset_gas: SSTORE_RESET_GAS,
                clearing_refund: clearing_refund(SSTORE_RESET_GAS, COLD_SLOAD_COST),
                sentry_gas: SSTORE_SENTRY_GAS,
            }),
        );

        // Account-touching opcodes: warm constant, cold surcharge native.
        self.set_constant_gas(Opcode::BALANCE, WARM_STORAGE_READ_COST);
        self.set_constant_gas(Opcode::EXTCODESIZE, WARM_STORAGE_READ_COST);
        self.set_constant_gas(Opcode::EXTCODEHASH, WARM_STORAGE_READ_COST);
        self.set_constant_gas(Opcode::EXTCODECOPY, WARM_STORAGE_READ_COST);
        self.set_dynamic_gas(Opcode::BALANCE, DynamicGas::Native);
        self.set_dynamic_gas(Opcode::EXTCODESIZE, DynamicGas::Native);
        self.set_dynamic_gas(Opcode::EXTCODEHASH, DynamicGas::Native);

        let params = CallParams {
            cold_access_cost: COLD_ACCOUNT_ACCESS_COST,
            warm_access_cost: WARM_STORAGE_READ_COST,
            value_xfer_cost: CALL_VALUE_TRANSFER_GAS,
            new_account_cost: CALL_NEW_ACCOUNT_GAS,
        };
        for (opcode, kind) in [
            (Opcode::CALL, CallKind::Call),
            (Opcode::CALLCODE, CallKind::CallCode),
            (Opcode::DELEGATECALL, CallKind::DelegateCall),
            (Opcode::STATICCALL, CallKind::StaticCall),
        ] {
            self.set_constant_gas(opcode, WARM_STORAGE_READ_COST);
            self.set_dynamic_gas(opcode, DynamicGas::Call { kind, params });
        }
    }

    fn apply_london(&mut self) {
        self.set(Opcode::BASEFEE, OpcodeEntry::new(2, 0, 1));
    }

    fn apply_shanghai(&mut self) {
        self.set(Opcode::PUSH0, OpcodeEntry::new(2, 0, 1));
    }

    fn apply_cancun(&mut self) {
        self.set(Opcode::TLOAD, OpcodeEntry::new(100, 1, 1));
        self.set(Opcode::TSTORE, OpcodeEntry::new(100, 2, 0));
        self.set(
            Opcode::MCOPY,
            OpcodeEntry::new(3, 3, 0)
                .with_dynamic(DynamicGas::Copy {
                    stack_pos: 2,
                    copy_gas: COPY_GAS,
                })
                .with_memory(mem_mcopy),
        );
        self.set(Opcode::BLOBHASH, OpcodeEntry::new(3, 1, 1));
        self.set(Opcode::BLOBBASEFEE, OpcodeEntry::new(2, 0, 1));
    }

    fn apply_osaka(&mut self) {
        self.set(Opcode::CLZ, OpcodeEntry::new(5, 1, 1));
    }
}

/// Pre-Berlin CALL pricing: no access-list surcharge, so cold and warm
/// collapse to zero and only the value/new-account clauses remain.
const PRE_BERLIN_CALL_PARAMS: CallParams = CallParams {
    cold_access_cost: 0,
    warm_access_cost: 0,
    value_xfer_cost: CALL_VALUE_TRANSFER_GAS,
    new_account_cost: CALL_NEW_ACCOUNT_GAS,
};

fn back_val(stack: &[U256], n: usize) -> Result<U256, GasError> {
    stack
        .len()
        .checked_sub(n + 1)
        .and_then(|idx| stack.get(idx))
        .copied()
        .ok_or(GasError::Overflow)
}

fn mem_span(offset: U256, len: U256) -> Result<u64, GasError> {
    if len.is_zero() {
        return Ok(0);
    }
    let offset = gas::u256_to_u64(offset)?;
    let len = gas::u256_to_u64(len)?;
    offset.checked_add(len).ok_or(GasError::Overflow)
}

fn mem_keccak256(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, back_val(stack, 1)?)
}

fn mem_copy(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, back_val(stack, 2)?)
}

fn mem_extcodecopy(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 1)?, back_val(stack, 3)?)
}

fn mem_mcopy(stack: &[U256]) -> Result<u64, GasError> {
    let write = mem_span(back_val(stack, 0)?, back_val(stack, 2)?)?;
    let read = mem_span(back_val(stack, 1)?, back_val(stack, 2)?)?;
    Ok(write.max(read))
}

fn mem_mload(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, U256::from(32))
}

fn mem_mstore(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, U256::from(32))
}

fn mem_mstore8(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, U256::one())
}

fn mem_log(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, back_val(stack, 1)?)
}

fn mem_create(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 1)?, back_val(stack, 2)?)
}

fn mem_call(stack: &[U256]) -> Result<u64, GasError> {
    let args = mem_span(back_val(stack, 3)?, back_val(stack, 4)?)?;
    let ret = mem_span(back_val(stack, 5)?, back_val(stack, 6)?)?;
    Ok(args.max(ret))
}

fn mem_delegatecall(stack: &[U256]) -> Result<u64, GasError> {
    let args = mem_span(back_val(stack, 2)?, back_val(stack, 3)?)?;
    let ret = mem_span(back_val(stack, 4)?, back_val(stack, 5)?)?;
    Ok(args.max(ret))
}

fn mem_return(stack: &[U256]) -> Result<u64, GasError> {
    mem_span(back_val(stack, 0)?, back_val(stack, 1)?)
}
