//! JSON-RPC surface of the gascope simulator.
//!
//! Three methods under the `gascope` namespace:
//! `gascope_getGasSchedule`, `gascope_simulateBlockGas` and
//! `gascope_simulateTransactionGas`. Transport is the host node's
//! concern; this crate maps parsed [`RpcRequest`]s to engine calls.

mod gas_schedule;
mod rpc_types;
mod simulate;

pub use gas_schedule::{CustomGasSchedule, GetGasScheduleRequest};
pub use rpc_types::{
    RpcErr, RpcErrorMetadata, RpcErrorResponse, RpcRequest, RpcRequestId, RpcSuccessResponse,
};
pub use simulate::{SimulateBlockGasRequest, SimulateTransactionGasRequest};

use std::sync::Arc;

use async_trait::async_trait;
use ethereum_types::H256;
use gascope_engine::defaults::GasScheduleResponse;
use gascope_engine::driver::{SimulateBlockGasResult, SimulateTransactionGasResult};
use gascope_engine::provider::{BlockReader, ExecutionProvider};
use gascope_engine::{EngineError, GasSchedule, GasSimulator};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Object-safe view of the simulation engine, so the RPC layer does not
/// carry the provider/reader type parameters around.
#[async_trait]
pub trait SimulatorApi: Send + Sync {
    async fn get_gas_schedule(&self, block_number: u64)
    -> Result<GasScheduleResponse, EngineError>;

    async fn simulate_block_gas(
        &self,
        block_number: u64,
        schedule: GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateBlockGasResult, EngineError>;

    async fn simulate_transaction_gas(
        &self,
        tx_hash: H256,
        block_number: u64,
        schedule: GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateTransactionGasResult, EngineError>;
}

#[async_trait]
impl<P: ExecutionProvider, R: BlockReader> SimulatorApi for GasSimulator<P, R> {
    async fn get_gas_schedule(
        &self,
        block_number: u64,
    ) -> Result<GasScheduleResponse, EngineError> {
        GasSimulator::get_gas_schedule(self, block_number).await
    }

    async fn simulate_block_gas(
        &self,
        block_number: u64,
        schedule: GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateBlockGasResult, EngineError> {
        GasSimulator::simulate_block_gas(self, block_number, &schedule, max_gas_limit, cancel)
            .await
    }

    async fn simulate_transaction_gas(
        &self,
        tx_hash: H256,
        block_number: u64,
        schedule: GasSchedule,
        max_gas_limit: bool,
        cancel: &CancellationToken,
    ) -> Result<SimulateTransactionGasResult, EngineError> {
        GasSimulator::simulate_transaction_gas(
            self,
            tx_hash,
            block_number,
            &schedule,
            max_gas_limit,
            cancel,
        )
        .await
    }
}

#[derive(Clone)]
pub struct RpcApiContext {
    pub simulator: Arc<dyn SimulatorApi>,
    pub cancel: CancellationToken,
}

#[allow(async_fn_in_trait)]
pub trait RpcHandler: Sized {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr>;

    async fn call(req: &RpcRequest, context: RpcApiContext) -> Result<Value, RpcErr> {
        let request = Self::parse(&req.params)?;
        request.handle(context).await
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr>;
}

/// Routes a parsed request to its handler.
pub async fn map_http_requests(req: &RpcRequest, context: RpcApiContext) -> Result<Value, RpcErr> {
    match req.method.as_str() {
        "gascope_getGasSchedule" => GetGasScheduleRequest::call(req, context).await,
        "gascope_simulateBlockGas" => SimulateBlockGasRequest::call(req, context).await,
        "gascope_simulateTransactionGas" => SimulateTransactionGasRequest::call(req, context).await,
        _ => Err(RpcErr::MethodNotFound(req.method.clone())),
    }
}

/// Wraps a handler result into the JSON-RPC envelope.
pub fn rpc_response(id: RpcRequestId, result: Result<Value, RpcErr>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(RpcSuccessResponse {
            id,
            jsonrpc: "2.0".to_string(),
            result: value,
        }),
        Err(error) => serde_json::to_value(RpcErrorResponse {
            id,
            jsonrpc: "2.0".to_string(),
            error: error.into(),
        }),
    }
    .unwrap_or(Value::Null)
}
