use serde::{Deserialize, Serialize};

/// Ethereum protocol upgrades, in activation order.
///
/// The ordering is meaningful: `fork >= Fork::Berlin` is how the engine
/// asks "are access lists active here".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Fork {
    Frontier = 0,
    Homestead = 1,
    Tangerine = 2,
    SpuriousDragon = 3,
    Byzantium = 4,
    Constantinople = 5,
    Petersburg = 6,
    Istanbul = 7,
    Berlin = 8,
    London = 9,
    Paris = 10,
    Shanghai = 11,
    #[default]
    Cancun = 12,
    Prague = 13,
    Osaka = 14,
}

impl From<Fork> for &str {
    fn from(fork: Fork) -> Self {
        match fork {
            Fork::Frontier => "Frontier",
            Fork::Homestead => "Homestead",
            Fork::Tangerine => "Tangerine Whistle",
            Fork::SpuriousDragon => "Spurious Dragon",
            Fork::Byzantium => "Byzantium",
            Fork::Constantinople => "Constantinople",
            Fork::Petersburg => "Petersburg",
            Fork::Istanbul => "Istanbul",
            Fork::Berlin => "Berlin",
            Fork::London => "London",
            Fork::Paris => "Paris",
            Fork::Shanghai => "Shanghai",
            Fork::Cancun => "Cancun",
            Fork::Prague => "Prague",
            Fork::Osaka => "Osaka",
        }
    }
}

/// Activation set for a block: which upgrades are live.
///
/// Gas rules read these booleans instead of comparing forks so that a
/// rules value can be handed across crate boundaries without dragging the
/// whole fork ladder along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainRules {
    pub is_homestead: bool,
    pub is_tangerine: bool,
    pub is_spurious_dragon: bool,
    pub is_byzantium: bool,
    pub is_constantinople: bool,
    pub is_petersburg: bool,
    pub is_istanbul: bool,
    pub is_berlin: bool,
    pub is_london: bool,
    pub is_shanghai: bool,
    pub is_cancun: bool,
    pub is_prague: bool,
    pub is_osaka: bool,
}

impl ChainRules {
    pub fn for_fork(fork: Fork) -> Self {
        Self {
            is_homestead: fork >= Fork::Homestead,
            is_tangerine: fork >= Fork::Tangerine,
            is_spurious_dragon: fork >= Fork::SpuriousDragon,
            is_byzantium: fork >= Fork::Byzantium,
            is_constantinople: fork >= Fork::Constantinople,
            is_petersburg: fork >= Fork::Petersburg,
            is_istanbul: fork >= Fork::Istanbul,
            is_berlin: fork >= Fork::Berlin,
            is_london: fork >= Fork::London,
            is_shanghai: fork >= Fork::Shanghai,
            is_cancun: fork >= Fork::Cancun,
            is_prague: fork >= Fork::Prague,
            is_osaka: fork >= Fork::Osaka,
        }
    }
}

impl From<Fork> for ChainRules {
    fn from(fork: Fork) -> Self {
        Self::for_fork(fork)
    }
}
