use rustc_hash::FxHashMap;

/// Semantic gas parameter keys.
///
/// These are not opcode mnemonics. Constant-gas opcodes (ADD, MUL, PUSH1,
/// ...) are overridden through their mnemonic directly; the keys below
/// re-parameterise gas formulas that run against state at execution time.
pub mod keys {
    // Storage (EIP-2929 / EIP-2200)
    pub const SLOAD_COLD: &str = "SLOAD_COLD";
    pub const SLOAD_WARM: &str = "SLOAD_WARM";
    pub const SSTORE_SET: &str = "SSTORE_SET";
    pub const SSTORE_RESET: &str = "SSTORE_RESET";

    // Calls
    pub const CALL_COLD: &str = "CALL_COLD";
    pub const CALL_WARM: &str = "CALL_WARM";
    pub const CALL_VALUE_XFER: &str = "CALL_VALUE_XFER";
    pub const CALL_NEW_ACCOUNT: &str = "CALL_NEW_ACCOUNT";

    // Hashing, copies, logs
    pub const KECCAK256_WORD: &str = "KECCAK256_WORD";
    pub const COPY: &str = "COPY";
    pub const LOG: &str = "LOG";
    pub const LOG_TOPIC: &str = "LOG_TOPIC";
    pub const LOG_DATA: &str = "LOG_DATA";

    // Arithmetic, memory, creation
    pub const EXP_BYTE: &str = "EXP_BYTE";
    pub const MEMORY: &str = "MEMORY";
    pub const CREATE_BY_SELFDESTRUCT: &str = "CREATE_BY_SELFDESTRUCT";
    pub const INIT_CODE_WORD: &str = "INIT_CODE_WORD";

    // Transaction intrinsic gas
    pub const TX_BASE: &str = "TX_BASE";
    pub const TX_CREATE_BASE: &str = "TX_CREATE_BASE";
    pub const TX_DATA_ZERO: &str = "TX_DATA_ZERO";
    pub const TX_DATA_NONZERO: &str = "TX_DATA_NONZERO";
    pub const TX_ACCESS_LIST_ADDR: &str = "TX_ACCESS_LIST_ADDR";
    pub const TX_ACCESS_LIST_KEY: &str = "TX_ACCESS_LIST_KEY";
    pub const TX_INIT_CODE_WORD: &str = "TX_INIT_CODE_WORD";
    pub const TX_FLOOR_PER_TOKEN: &str = "TX_FLOOR_PER_TOKEN";
    pub const TX_AUTH_COST: &str = "TX_AUTH_COST";

    /// Intrinsic keys, in the order the override check probes them.
    pub const INTRINSIC_KEYS: [&str; 9] = [
        TX_BASE,
        TX_CREATE_BASE,
        TX_DATA_ZERO,
        TX_DATA_NONZERO,
        TX_ACCESS_LIST_ADDR,
        TX_ACCESS_LIST_KEY,
        TX_INIT_CODE_WORD,
        TX_FLOOR_PER_TOKEN,
        TX_AUTH_COST,
    ];

    // Precompiles, fixed total
    pub const PC_ECREC: &str = "PC_ECREC";
    pub const PC_BN254_ADD: &str = "PC_BN254_ADD";
    pub const PC_BN254_MUL: &str = "PC_BN254_MUL";
    pub const PC_BLS12_G1ADD: &str = "PC_BLS12_G1ADD";
    pub const PC_BLS12_G2ADD: &str = "PC_BLS12_G2ADD";
    pub const PC_BLS12_MAP_FP_TO_G1: &str = "PC_BLS12_MAP_FP_TO_G1";
    pub const PC_BLS12_MAP_FP2_TO_G2: &str = "PC_BLS12_MAP_FP2_TO_G2";
    pub const PC_KZG_POINT_EVALUATION: &str = "PC_KZG_POINT_EVALUATION";
    pub const PC_P256VERIFY: &str = "PC_P256VERIFY";

    // Precompiles, formula parameters
    pub const PC_SHA256_BASE: &str = "PC_SHA256_BASE";
    pub const PC_SHA256_PER_WORD: &str = "PC_SHA256_PER_WORD";
    pub const PC_RIPEMD160_BASE: &str = "PC_RIPEMD160_BASE";
    pub const PC_RIPEMD160_PER_WORD: &str = "PC_RIPEMD160_PER_WORD";
    pub const PC_ID_BASE: &str = "PC_ID_BASE";
    pub const PC_ID_PER_WORD: &str = "PC_ID_PER_WORD";
    pub const PC_MODEXP_MIN_GAS: &str = "PC_MODEXP_MIN_GAS";
    pub const PC_BN254_PAIRING_BASE: &str = "PC_BN254_PAIRING_BASE";
    pub const PC_BN254_PAIRING_PER_PAIR: &str = "PC_BN254_PAIRING_PER_PAIR";
    pub const PC_BLAKE2F_BASE: &str = "PC_BLAKE2F_BASE";
    pub const PC_BLAKE2F_PER_ROUND: &str = "PC_BLAKE2F_PER_ROUND";
    pub const PC_BLS12_PAIRING_CHECK_BASE: &str = "PC_BLS12_PAIRING_CHECK_BASE";
    pub const PC_BLS12_PAIRING_CHECK_PER_PAIR: &str = "PC_BLS12_PAIRING_CHECK_PER_PAIR";
    pub const PC_BLS12_G1MSM_MUL_GAS: &str = "PC_BLS12_G1MSM_MUL_GAS";
    pub const PC_BLS12_G2MSM_MUL_GAS: &str = "PC_BLS12_G2MSM_MUL_GAS";
}

/// Gas parameter overrides for one simulated execution.
///
/// Immutable once the execution starts; gas rules read it through
/// [`GasSchedule::get_or`] and fall back to the fork default for any key
/// the user did not touch. Keys that don't exist in the target fork are
/// accepted and ignored.
#[derive(Debug, Clone, Default)]
pub struct GasSchedule {
    overrides: FxHashMap<String, u64>,
}

impl GasSchedule {
    pub fn new(overrides: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            overrides: overrides.into_iter().collect(),
        }
    }

    /// The override value if set, otherwise the caller's default.
    pub fn get_or(&self, key: &str, default: u64) -> u64 {
        self.overrides.get(key).copied().unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// True when any `TX_*` intrinsic key is present. Callers switch to the
    /// patched intrinsic-gas computation only in that case.
    pub fn has_intrinsic_overrides(&self) -> bool {
        keys::INTRINSIC_KEYS.iter().any(|key| self.has(key))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.overrides.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn remove(&mut self, key: &str) {
        self.overrides.remove(key);
    }
}

impl FromIterator<(String, u64)> for GasSchedule {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::new(iter)
    }
}
