use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

pub type BlockNumber = u64;

/// Destination of a transaction: a call to an existing account or a
/// contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

/// Per-address storage keys declared up front by the transaction (EIP-2930).
pub type AccessList = Vec<AccessListItem>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<H256>,
}

/// The slice of a transaction the simulation engine needs: enough to
/// compute intrinsic gas, frame the execution, and report results. Wire
/// decoding, signatures and fee-market fields stay with the node that
/// feeds us blocks.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub hash: H256,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub access_list: AccessList,
    /// Number of EIP-7702 authorization tuples carried by the transaction.
    pub authorization_count: u64,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    pub fn access_list_len(&self) -> u64 {
        self.access_list.len().try_into().unwrap_or(u64::MAX)
    }

    pub fn storage_keys_len(&self) -> u64 {
        self.access_list
            .iter()
            .map(|item| item.storage_keys.len() as u64)
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub base_fee_per_gas: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// Minimal receipt view, as delivered to tracers at transaction end.
#[derive(Debug, Clone, Default)]
pub struct Receipt {
    /// Post-refund gas charged to the sender.
    pub gas_used: u64,
    pub succeeded: bool,
}
