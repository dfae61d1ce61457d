//! Reference gas schedules per fork.
//!
//! Constant-gas opcode defaults are read straight off the fork's baseline
//! dispatch table, so they track fork repricings without a hand-kept
//! table. Dynamic-formula defaults are fixed constants with fork gating.

use std::collections::BTreeMap;

use gascope_common::{ChainRules, Opcode};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::jump_table::JumpTable;
use crate::schedule::{GasSchedule, keys};

/// A fully populated reference schedule for the fork: every overridable
/// key mapped to its default value.
///
/// `CALL_WARM` is intentionally absent. The warm cost of the CALL family
/// is the opcode's own constant-gas slot; exposing a second knob for it
/// would leave users two sliders for one number. It still participates
/// internally in the cold-surcharge derivation.
pub fn defaults_for(rules: &ChainRules) -> GasSchedule {
    let mut schedule = GasSchedule::default();

    let jt = JumpTable::base_for(rules);
    for (opcode, gas) in jt.constant_gas_entries() {
        if gas > 0 || opcode == Opcode::STOP || opcode == Opcode::JUMPDEST {
            schedule.insert(opcode.mnemonic(), gas);
        }
    }

    schedule.insert(keys::MEMORY, MEMORY_GAS);
    schedule.insert(keys::COPY, COPY_GAS);
    schedule.insert(keys::KECCAK256_WORD, KECCAK256_WORD_GAS);
    schedule.insert(keys::LOG, LOG_GAS);
    schedule.insert(keys::LOG_TOPIC, LOG_TOPIC_GAS);
    schedule.insert(keys::LOG_DATA, LOG_DATA_GAS);
    schedule.insert(keys::CALL_VALUE_XFER, CALL_VALUE_TRANSFER_GAS);
    schedule.insert(keys::CALL_NEW_ACCOUNT, CALL_NEW_ACCOUNT_GAS);
    schedule.insert(keys::CREATE_BY_SELFDESTRUCT, CREATE_BY_SELFDESTRUCT_GAS);
    schedule.insert(keys::INIT_CODE_WORD, INIT_CODE_WORD_GAS);

    if rules.is_spurious_dragon {
        schedule.insert(keys::EXP_BYTE, EXP_BYTE_GAS_EIP160);
    } else {
        schedule.insert(keys::EXP_BYTE, EXP_BYTE_GAS_FRONTIER);
    }

    if rules.is_berlin {
        schedule.insert(keys::SLOAD_COLD, COLD_SLOAD_COST);
        schedule.insert(keys::SLOAD_WARM, WARM_STORAGE_READ_COST);
        schedule.insert(keys::CALL_COLD, COLD_ACCOUNT_ACCESS_COST);
        // The flat SLOAD cost is meaningless once cold/warm pricing is on.
        schedule.remove("SLOAD");
    }

    if rules.is_istanbul {
        schedule.insert(keys::SSTORE_SET, SSTORE_SET_GAS);
        schedule.insert(keys::SSTORE_RESET, SSTORE_RESET_GAS);
    }

    schedule
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasParameter {
    pub value: u64,
    pub description: String,
}

/// API response shape for the gas-schedule query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GasScheduleResponse {
    pub parameters: BTreeMap<String, GasParameter>,
}

/// Default values with display descriptions for every parameter valid in
/// the fork.
pub fn schedule_response_for(rules: &ChainRules) -> GasScheduleResponse {
    let schedule = defaults_for(rules);
    let mut parameters = BTreeMap::new();
    for (key, value) in schedule.iter() {
        parameters.insert(
            key.to_string(),
            GasParameter {
                value,
                description: description_for(key),
            },
        );
    }
    GasScheduleResponse { parameters }
}

/// Human-readable description of a gas parameter, for API display only.
pub fn description_for(key: &str) -> String {
    if let Some(n) = key.strip_prefix("PUSH").and_then(|n| n.parse::<u8>().ok()) {
        if n == 0 {
            return "Push zero onto stack. Fixed cost.".to_string();
        }
        return format!("Push {n}-byte value onto stack. Fixed cost.");
    }
    if let Some(n) = key.strip_prefix("DUP").and_then(|n| n.parse::<u8>().ok()) {
        return format!("Duplicate stack item {n}. Fixed cost.");
    }
    if let Some(n) = key.strip_prefix("SWAP").and_then(|n| n.parse::<u8>().ok()) {
        return format!("Swap top with stack item {}. Fixed cost.", n + 1);
    }
    if let Some(n) = key.strip_prefix("LOG").and_then(|n| n.parse::<u8>().ok()) {
        if n == 0 {
            return "Append log with 0 topics. Uses LOG base + LOG_DATA per byte.".to_string();
        }
        return format!("Append log with {n} topics. Uses LOG base + {n}×LOG_TOPIC + LOG_DATA per byte.");
    }

    let fixed = match key {
        // Arithmetic
        "ADD" => "Addition. Fixed cost per operation.",
        "SUB" => "Subtraction. Fixed cost per operation.",
        "MUL" => "Multiplication. Fixed cost per operation.",
        "DIV" => "Unsigned division. Fixed cost per operation.",
        "SDIV" => "Signed division. Fixed cost per operation.",
        "MOD" => "Unsigned modulo. Fixed cost per operation.",
        "SMOD" => "Signed modulo. Fixed cost per operation.",
        "ADDMOD" => "Modular addition: (a + b) % N. Fixed cost.",
        "MULMOD" => "Modular multiplication: (a × b) % N. Fixed cost.",
        "EXP_BYTE" => {
            "Cost per byte of the exponent in EXP. Total cost = 10 + (EXP_BYTE × exponent_bytes)."
        }
        "SIGNEXTEND" => "Sign-extend a smaller signed integer. Fixed cost.",

        // Comparison & bitwise
        "LT" => "Less-than comparison. Fixed cost.",
        "GT" => "Greater-than comparison. Fixed cost.",
        "SLT" => "Signed less-than comparison. Fixed cost.",
        "SGT" => "Signed greater-than comparison. Fixed cost.",
        "EQ" => "Equality comparison. Fixed cost.",
        "ISZERO" => "Check if value is zero. Fixed cost.",
        "AND" => "Bitwise AND. Fixed cost.",
        "OR" => "Bitwise OR. Fixed cost.",
        "XOR" => "Bitwise XOR. Fixed cost.",
        "NOT" => "Bitwise NOT. Fixed cost.",
        "BYTE" => "Extract single byte from word. Fixed cost.",
        "SHL" => "Shift left. Fixed cost.",
        "SHR" => "Logical shift right. Fixed cost.",
        "SAR" => "Arithmetic shift right (preserves sign). Fixed cost.",
        "CLZ" => "Count leading zeros. Fixed cost.",

        // Stack & memory
        "POP" => "Remove top stack item. Fixed cost.",
        "MLOAD" => {
            "Load 32 bytes from memory. Base cost only; memory expansion charged separately via MEMORY."
        }
        "MSTORE" => {
            "Store 32 bytes to memory. Base cost only; memory expansion charged separately via MEMORY."
        }
        "MSTORE8" => {
            "Store 1 byte to memory. Base cost only; memory expansion charged separately via MEMORY."
        }
        "MSIZE" => "Get current memory size in bytes. Fixed cost.",
        "MCOPY" => {
            "Copy memory regions. Base cost; also uses COPY for per-word cost and MEMORY for expansion."
        }
        "MEMORY" => {
            "Linear coefficient for memory expansion. Total cost = MEMORY × words + words²÷512. Only the linear part is configurable; the quadratic part is fixed."
        }
        "COPY" => {
            "Per-word cost for memory copy operations (CALLDATACOPY, CODECOPY, EXTCODECOPY, RETURNDATACOPY, MCOPY)."
        }

        // Storage
        "SLOAD" => "Load word from storage. Fixed cost pre-Berlin.",
        "SLOAD_COLD" => {
            "Reading storage slot for first time in transaction. Post-Berlin (EIP-2929)."
        }
        "SLOAD_WARM" => {
            "Reading storage slot already accessed in transaction. Post-Berlin (EIP-2929)."
        }
        "SSTORE_SET" => "Writing to a storage slot that was zero (creating new storage).",
        "SSTORE_RESET" => "Writing to a storage slot that was non-zero (modifying existing storage).",

        // Transient storage
        "TLOAD" => "Load from transient storage. Cleared after transaction. (EIP-1153)",
        "TSTORE" => "Store to transient storage. Cleared after transaction. (EIP-1153)",

        // Calls
        "CALL" => {
            "Base cost for CALL. This is the warm access cost; first access to an address adds CALL_COLD."
        }
        "CALLCODE" => {
            "Base cost for CALLCODE. This is the warm access cost; first access to an address adds CALL_COLD."
        }
        "DELEGATECALL" => {
            "Base cost for DELEGATECALL. This is the warm access cost; first access to an address adds CALL_COLD."
        }
        "STATICCALL" => {
            "Base cost for STATICCALL. This is the warm access cost; first access to an address adds CALL_COLD."
        }
        "CALL_COLD" => {
            "Additional cost when calling an address not yet accessed in transaction. Post-Berlin (EIP-2929)."
        }
        "CALL_VALUE_XFER" => "Additional cost when CALL transfers ETH value.",
        "CALL_NEW_ACCOUNT" => {
            "Additional cost when CALL sends value to a non-existent account, creating it."
        }

        // Creation
        "CREATE" => {
            "Base cost for CREATE. Additional costs: INIT_CODE_WORD per word of init code, memory expansion, and code deposit (200 gas per byte stored)."
        }
        "CREATE2" => {
            "Base cost for CREATE2. Additional costs: INIT_CODE_WORD, KECCAK256_WORD for address derivation, memory expansion, and code deposit."
        }
        "INIT_CODE_WORD" => "Per-word cost for contract init code in CREATE/CREATE2. (EIP-3860)",
        "CREATE_BY_SELFDESTRUCT" => {
            "Cost when SELFDESTRUCT sends funds to non-existent account, creating it."
        }

        // External code & accounts
        "EXTCODESIZE" => "Get code size of external account. Base cost; first access to address adds CALL_COLD.",
        "EXTCODECOPY" => {
            "Copy external account code to memory. Base cost; uses COPY for per-word cost, MEMORY for expansion. First access adds CALL_COLD."
        }
        "EXTCODEHASH" => "Get code hash of external account. Base cost; first access to address adds CALL_COLD.",
        "CODESIZE" => "Get size of current contract's code. Fixed cost.",
        "CODECOPY" => {
            "Copy current contract's code to memory. Base cost; uses COPY for per-word cost and MEMORY for expansion."
        }
        "BALANCE" => "Get account balance. Base cost; first access to address adds CALL_COLD.",
        "SELFBALANCE" => "Get current contract's balance. Fixed cost (always warm).",

        // Call data
        "CALLDATALOAD" => "Load 32 bytes from call input data. Fixed cost.",
        "CALLDATASIZE" => "Get size of call input data. Fixed cost.",
        "CALLDATACOPY" => {
            "Copy call input data to memory. Base cost; uses COPY for per-word cost and MEMORY for expansion."
        }
        "RETURNDATASIZE" => "Get size of return data from last external call. Fixed cost.",
        "RETURNDATACOPY" => {
            "Copy return data to memory. Base cost; uses COPY for per-word cost and MEMORY for expansion."
        }

        // Environment
        "ADDRESS" => "Get current contract's address. Fixed cost.",
        "ORIGIN" => "Get transaction origin address (tx.origin). Fixed cost.",
        "CALLER" => "Get direct caller address (msg.sender). Fixed cost.",
        "CALLVALUE" => "Get ETH value sent with call (msg.value). Fixed cost.",
        "GASPRICE" => "Get gas price of current transaction. Fixed cost.",
        "GAS" => "Get remaining gas. Fixed cost.",

        // Block information
        "BLOCKHASH" => "Get hash of one of the 256 most recent blocks. Fixed cost.",
        "COINBASE" => "Get current block's beneficiary address. Fixed cost.",
        "TIMESTAMP" => "Get current block's timestamp. Fixed cost.",
        "NUMBER" => "Get current block number. Fixed cost.",
        "PREVRANDAO" => "Get previous beacon randomness (difficulty pre-merge). Fixed cost.",
        "GASLIMIT" => "Get current block's gas limit. Fixed cost.",
        "CHAINID" => "Get chain ID. Fixed cost.",
        "BASEFEE" => "Get current block's base fee. Fixed cost. (EIP-1559)",
        "BLOBBASEFEE" => "Get current block's blob base fee. Fixed cost. (EIP-4844)",
        "BLOBHASH" => "Get versioned hash of blob at given index. Fixed cost. (EIP-4844)",

        // Control flow
        "JUMP" => "Unconditional jump to destination. Fixed cost.",
        "JUMPI" => "Conditional jump if condition is non-zero. Fixed cost.",
        "JUMPDEST" => "Valid destination for jumps. Fixed cost.",
        "PC" => "Get program counter before this instruction. Fixed cost.",
        "STOP" => "Halt execution, returning no data. Fixed cost.",
        "RETURN" => "Halt execution, returning memory data. Base cost; memory expansion charged via MEMORY.",
        "REVERT" => {
            "Halt execution, revert state changes, return data. Base cost; memory expansion charged via MEMORY."
        }
        "INVALID" => "Designated invalid instruction. Consumes all remaining gas.",

        // Logging & hashing parameters
        "LOG" => "Base cost for all LOG operations.",
        "LOG_TOPIC" => "Additional cost per topic in LOG1-LOG4.",
        "LOG_DATA" => "Per-byte cost for log data.",
        "KECCAK256" => "Base cost for KECCAK256 hash operation.",
        "KECCAK256_WORD" => "Per-word (32 bytes) cost for data being hashed.",

        "SELFDESTRUCT" => {
            "Mark contract for destruction. Base cost; adds CALL_COLD if recipient is cold, CREATE_BY_SELFDESTRUCT if recipient doesn't exist."
        }

        _ => "",
    };
    if fixed.is_empty() {
        format!("Gas cost for {key} operation.")
    } else {
        fixed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gascope_common::Fork;

    #[test]
    fn berlin_defaults_expose_cold_warm() {
        let defaults = defaults_for(&ChainRules::for_fork(Fork::Berlin));
        assert_eq!(defaults.get_or(keys::SLOAD_COLD, 0), 2100);
        assert_eq!(defaults.get_or(keys::SLOAD_WARM, 0), 100);
        assert_eq!(defaults.get_or(keys::CALL_COLD, 0), 2600);
        assert!(!defaults.has("SLOAD"));
        // warm CALL cost shows up through the opcode slot, not CALL_WARM
        assert!(!defaults.has(keys::CALL_WARM));
        assert_eq!(defaults.get_or("CALL", 0), 100);
    }

    #[test]
    fn istanbul_defaults_have_flat_sload() {
        let defaults = defaults_for(&ChainRules::for_fork(Fork::Istanbul));
        assert_eq!(defaults.get_or("SLOAD", 0), 800);
        assert!(!defaults.has(keys::SLOAD_COLD));
        assert_eq!(defaults.get_or(keys::SSTORE_SET, 0), 20000);
        assert_eq!(defaults.get_or(keys::SSTORE_RESET, 0), 5000);
    }

    #[test]
    fn exp_byte_gated_on_spurious_dragon() {
        let pre = defaults_for(&ChainRules::for_fork(Fork::Homestead));
        assert_eq!(pre.get_or(keys::EXP_BYTE, 0), 10);
        let post = defaults_for(&ChainRules::for_fork(Fork::SpuriousDragon));
        assert_eq!(post.get_or(keys::EXP_BYTE, 0), 50);
        // EIP-2200 keys don't exist before Istanbul
        assert!(!post.has(keys::SSTORE_SET));
    }

    #[test]
    fn zero_cost_markers_are_listed() {
        let defaults = defaults_for(&ChainRules::for_fork(Fork::Cancun));
        assert!(defaults.has("STOP"));
        assert_eq!(defaults.get_or("STOP", 99), 0);
        assert_eq!(defaults.get_or("JUMPDEST", 0), 1);
    }

    #[test]
    fn response_carries_descriptions() {
        let response = schedule_response_for(&ChainRules::for_fork(Fork::Cancun));
        let param = response.parameters.get("SLOAD_COLD").unwrap();
        assert_eq!(param.value, 2100);
        assert!(param.description.contains("EIP-2929"));
        // every parameter gets at least the generated fallback text
        for (key, param) in &response.parameters {
            assert!(!param.description.is_empty(), "{key}");
        }
    }

    #[test]
    fn generated_descriptions_for_families() {
        assert_eq!(
            description_for("PUSH7"),
            "Push 7-byte value onto stack. Fixed cost."
        );
        assert!(description_for("DUP3").contains("Duplicate"));
        assert!(description_for("LOG2").contains("2 topics"));
        assert_eq!(
            description_for("SOMETHING_ELSE"),
            "Gas cost for SOMETHING_ELSE operation."
        );
    }
}
