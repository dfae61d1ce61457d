use std::collections::HashMap;

use gascope_engine::GasSchedule;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RpcApiContext, RpcErr, RpcHandler};

/// Wire shape for user gas overrides. Keys are opcode mnemonics or
/// semantic parameter names; unknown keys are accepted and ignored by the
/// engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomGasSchedule {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub overrides: HashMap<String, u64>,
}

impl CustomGasSchedule {
    pub fn into_schedule(self) -> GasSchedule {
        GasSchedule::new(self.overrides)
    }
}

/// `gascope_getGasSchedule`: the fork's default parameters with
/// descriptions, for the block's fork.
pub struct GetGasScheduleRequest {
    block_number: u64,
}

impl RpcHandler for GetGasScheduleRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::BadParams("No params provided".to_owned()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("Expected 1 param".to_owned()));
        }
        let block_number = serde_json::from_value(
            params
                .first()
                .cloned()
                .ok_or(RpcErr::MissingParam("blockNumber".to_owned()))?,
        )?;
        Ok(Self { block_number })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let response = context
            .simulator
            .get_gas_schedule(self.block_number)
            .await?;
        serde_json::to_value(response).map_err(|error| RpcErr::Internal(error.to_string()))
    }
}
