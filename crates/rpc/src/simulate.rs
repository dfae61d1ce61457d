use ethereum_types::H256;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::gas_schedule::CustomGasSchedule;
use crate::{RpcApiContext, RpcErr, RpcHandler};

/// `gascope_simulateBlockGas`: re-execute a block under a custom gas
/// schedule and compare against the baseline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulateBlockGasRequest {
    pub block_number: u64,
    #[serde(default)]
    pub gas_schedule: Option<CustomGasSchedule>,
    #[serde(default)]
    pub max_gas_limit: bool,
}

impl RpcHandler for SimulateBlockGasRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::BadParams("No params provided".to_owned()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("Expected 1 param".to_owned()));
        }
        let request = serde_json::from_value(
            params
                .first()
                .cloned()
                .ok_or(RpcErr::MissingParam("request".to_owned()))?,
        )?;
        Ok(request)
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        info!(block_number = self.block_number, "simulate block gas");
        let schedule = self
            .gas_schedule
            .clone()
            .unwrap_or_default()
            .into_schedule();
        let result = context
            .simulator
            .simulate_block_gas(
                self.block_number,
                schedule,
                self.max_gas_limit,
                &context.cancel,
            )
            .await?;
        serde_json::to_value(result).map_err(|error| RpcErr::Internal(error.to_string()))
    }
}

/// `gascope_simulateTransactionGas`: re-execute one transaction under a
/// custom gas schedule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulateTransactionGasRequest {
    pub transaction_hash: H256,
    /// Optional cross-check: when non-zero it must match the block the
    /// transaction actually landed in.
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub gas_schedule: Option<CustomGasSchedule>,
    #[serde(default)]
    pub max_gas_limit: bool,
}

impl RpcHandler for SimulateTransactionGasRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::BadParams("No params provided".to_owned()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("Expected 1 param".to_owned()));
        }
        let request = serde_json::from_value(
            params
                .first()
                .cloned()
                .ok_or(RpcErr::MissingParam("request".to_owned()))?,
        )?;
        Ok(request)
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        info!(
            transaction_hash = %self.transaction_hash,
            "simulate transaction gas"
        );
        let schedule = self
            .gas_schedule
            .clone()
            .unwrap_or_default()
            .into_schedule();
        let result = context
            .simulator
            .simulate_transaction_gas(
                self.transaction_hash,
                self.block_number,
                schedule,
                self.max_gas_limit,
                &context.cancel,
            )
            .await?;
        serde_json::to_value(result).map_err(|error| RpcErr::Internal(error.to_string()))
    }
}
