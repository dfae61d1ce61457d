//! End-to-end simulation scenarios against the scripted interpreter.

mod support;

use ethereum_types::{Address, H256, U256};
use gascope_common::types::AccessListItem;
use gascope_common::{Fork, Opcode};
use gascope_engine::driver::TxStatus;
use gascope_engine::errors::EngineError;
use gascope_engine::provider::{BlockReader, ExecutionProvider, Interpreter, InterpreterConfig};
use gascope_engine::tracer::{StructLogConfig, StructLogTracer, TraceHooks};
use gascope_engine::{GasSchedule, GasSimulator};
use tokio_util::sync::CancellationToken;

use support::{MockChain, MockProvider, Step, scripted_call};

const BLOCK_GAS_LIMIT: u64 = 30_000_000;
const CONTRACT: Address = Address::repeat_byte(0xAA);

fn simulator(chain: MockChain) -> GasSimulator<MockProvider, MockChain> {
    let provider = MockProvider::from_chain(&chain);
    GasSimulator::new(provider, chain)
}

fn schedule(pairs: &[(&str, u64)]) -> GasSchedule {
    GasSchedule::new(pairs.iter().map(|(k, v)| (k.to_string(), *v)))
}

/// Cold SLOAD then SSTORE into the now-warm slot (fresh slot, so both
/// sides charge the same set cost). Repricing SLOAD_COLD from 2100 to
/// 1500 must shave exactly 600 gas.
#[tokio::test]
async fn e1_sload_cold_repricing() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(
        1,
        BLOCK_GAS_LIMIT,
        vec![scripted_call(
            1,
            CONTRACT,
            1_000_000,
            vec![
                Step::op(Opcode::SLOAD, &[1]),
                Step::op(Opcode::SSTORE, &[7, 1]),
            ],
        )],
    );
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(
            1,
            &schedule(&[("SLOAD_COLD", 1500)]),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let tx = &result.transactions[0];
    assert_eq!(tx.original_status, TxStatus::Success);
    assert_eq!(tx.simulated_status, TxStatus::Success);
    assert_eq!(tx.original_gas, 21000 + 2100 + 20000);
    assert_eq!(tx.simulated_gas, tx.original_gas - 600);
    assert!(!tx.diverged);

    let sload = &result.opcode_breakdown["SLOAD"];
    assert_eq!(sload.original_gas, 2100);
    assert_eq!(sload.simulated_gas, 1500);
    assert_eq!(sload.original_count, sload.simulated_count);
}

/// A warm CALL (target pre-warmed through the access list) with zero
/// value: overriding only the CALL constant slot from 100 to 50 shaves
/// exactly 50 gas.
#[tokio::test]
async fn e2_call_constant_slot_override() {
    let target = Address::repeat_byte(0xBB);
    let mut tx = scripted_call(
        2,
        CONTRACT,
        1_000_000,
        vec![Step::Call {
            op: Opcode::CALL,
            to: target,
            value: 0,
            gas_request: 10_000,
            child_spend: 0,
        }],
    );
    tx.tx.access_list = vec![AccessListItem {
        address: target,
        storage_keys: vec![],
    }];
    tx.existing_accounts = vec![target];

    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(1, BLOCK_GAS_LIMIT, vec![tx]);
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(
            1,
            &schedule(&[("CALL", 50)]),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let tx = &result.transactions[0];
    // intrinsic: 21000 + one access-list address
    assert_eq!(tx.original_gas, 21000 + 2400 + 100);
    assert_eq!(tx.simulated_gas, tx.original_gas - 50);
    assert!(!tx.diverged);

    // the CALL row carries only the overhead, not the child allocation
    let call = &result.opcode_breakdown["CALL"];
    assert_eq!(call.original_gas, 100);
    assert_eq!(call.simulated_gas, 50);
}

/// Empty schedule: both sides execute identically, opcode for opcode.
#[tokio::test]
async fn e3_empty_schedule_identity() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(
        1,
        BLOCK_GAS_LIMIT,
        vec![
            scripted_call(
                1,
                CONTRACT,
                1_000_000,
                vec![
                    Step::op(Opcode::PUSH1, &[]),
                    Step::op(Opcode::PUSH1, &[1]),
                    Step::op(Opcode::ADD, &[1, 1]),
                    Step::op(Opcode::SLOAD, &[3]),
                ],
            ),
            scripted_call(
                2,
                CONTRACT,
                1_000_000,
                vec![
                    Step::op(Opcode::KECCAK256, &[32, 0]),
                    Step::op(Opcode::POP, &[0]),
                ],
            ),
        ],
    );
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(1, &GasSchedule::default(), false, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.transactions[0].index, 0);
    assert_eq!(result.transactions[1].index, 1);
    assert_eq!(result.original.gas_used, result.simulated.gas_used);

    for (op, summary) in &result.opcode_breakdown {
        assert_eq!(
            summary.original_count, summary.simulated_count,
            "count mismatch for {op}"
        );
        assert_eq!(
            summary.original_gas, summary.simulated_gas,
            "gas mismatch for {op}"
        );
    }
    for tx in &result.transactions {
        assert_eq!(tx.original_gas, tx.simulated_gas);
        assert!(!tx.diverged);
    }
}

/// SSTORE_RESET below SLOAD_COLD: the derived clearing refund collapses
/// to zero and a slot clear still prices without underflow.
#[tokio::test]
async fn e4_reset_below_cold_saturates() {
    let mut tx = scripted_call(
        4,
        CONTRACT,
        1_000_000,
        vec![Step::op(Opcode::SSTORE, &[0, 1])],
    );
    tx.committed_storage = vec![(H256::from_low_u64_be(1), U256::from(9))];

    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(1, BLOCK_GAS_LIMIT, vec![tx]);
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(
            1,
            &schedule(&[("SSTORE_RESET", 1000), ("SLOAD_COLD", 2000)]),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let tx = &result.transactions[0];
    assert_eq!(tx.simulated_status, TxStatus::Success);
    // baseline: cold 2100 + (5000 - 2100), then the 4800 clearing refund
    assert_eq!(tx.original_gas, 21000 + 2100 + 2900 - 4800);
    // simulated: cold 2000 + saturated reset 0, refund saturated to zero
    assert_eq!(tx.simulated_gas, 21000 + 2000);
}

/// Intrinsic data repricing: 100 non-zero bytes at 1 gas instead of 16.
#[tokio::test]
async fn e5_intrinsic_data_override() {
    let mut tx = scripted_call(5, CONTRACT, 1_000_000, vec![]);
    tx.tx.data = bytes::Bytes::from(vec![0x5Au8; 100]);

    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(1, BLOCK_GAS_LIMIT, vec![tx]);
    let simulator = simulator(chain);

    let result = simulator
        .simulate_transaction_gas(
            H256::from_low_u64_be(5),
            0,
            &schedule(&[("TX_DATA_NONZERO", 1)]),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.original.intrinsic_gas, 21000 + 100 * 16);
    assert_eq!(result.simulated.intrinsic_gas, 21000 + 100);
    assert_eq!(
        result.original.intrinsic_gas - result.simulated.intrinsic_gas,
        100 * (16 - 1)
    );
    assert_eq!(result.original.gas_used, result.original.intrinsic_gas);
    assert_eq!(result.original.execution_gas, 0);

    // the synthetic intrinsic row shows up in the block breakdown too
    let block_result = simulator
        .simulate_block_gas(
            1,
            &schedule(&[("TX_DATA_NONZERO", 1)]),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let intrinsic = &block_result.opcode_breakdown["TX_INTRINSIC"];
    assert_eq!(intrinsic.original_gas, 21000 + 1600);
    assert_eq!(intrinsic.simulated_gas, 21000 + 100);
    assert_eq!(intrinsic.original_count, 1);
}

/// A transaction that runs out of gas at its own limit succeeds under the
/// cheaper schedule once the limit is lifted to the block's; the status
/// change marks the pair as diverged.
#[tokio::test]
async fn e6_max_gas_limit_rescues_oog() {
    let tx = scripted_call(
        6,
        CONTRACT,
        23_000,
        vec![
            Step::op(Opcode::SLOAD, &[1]),
            Step::op(Opcode::SLOAD, &[2]),
        ],
    );

    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(1, BLOCK_GAS_LIMIT, vec![tx]);
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(
            1,
            &schedule(&[("SLOAD_COLD", 100)]),
            true,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let tx = &result.transactions[0];
    assert_eq!(tx.original_status, TxStatus::Failed);
    assert_eq!(tx.simulated_status, TxStatus::Success);
    assert!(tx.diverged);
    // the failed side consumed its whole limit
    assert_eq!(tx.original_gas, 23_000);
    assert_eq!(tx.simulated_gas, 21000 + 2 * 100);
}

#[tokio::test]
async fn cancellation_between_transactions() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(
        1,
        BLOCK_GAS_LIMIT,
        vec![scripted_call(1, CONTRACT, 100_000, vec![])],
    );
    let simulator = simulator(chain);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = simulator
        .simulate_block_gas(1, &GasSchedule::default(), false, &cancel)
        .await;
    assert!(matches!(result, Err(EngineError::Cancelled)));
}

#[tokio::test]
async fn unknown_block_and_transaction_errors() {
    let chain = MockChain::new(Fork::Prague);
    let simulator = simulator(chain);

    let result = simulator
        .simulate_block_gas(99, &GasSchedule::default(), false, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(EngineError::BlockNotFound(99))));

    let result = simulator
        .simulate_transaction_gas(
            H256::from_low_u64_be(0xdead),
            0,
            &GasSchedule::default(),
            false,
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(EngineError::TransactionNotFound(_))
    ));
}

#[tokio::test]
async fn transaction_block_mismatch_is_rejected() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(
        7,
        BLOCK_GAS_LIMIT,
        vec![scripted_call(70, CONTRACT, 100_000, vec![])],
    );
    let simulator = simulator(chain);

    let result = simulator
        .simulate_transaction_gas(
            H256::from_low_u64_be(70),
            8,
            &GasSchedule::default(),
            false,
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(EngineError::BlockMismatch {
            actual: 7,
            requested: 8,
            ..
        })
    ));

    // the right block number passes the cross-check
    let result = simulator
        .simulate_transaction_gas(
            H256::from_low_u64_be(70),
            7,
            &GasSchedule::default(),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.block_number, 7);
    assert_eq!(result.status, TxStatus::Success);
}

#[tokio::test]
async fn gas_schedule_endpoint_reflects_fork() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(1, BLOCK_GAS_LIMIT, vec![scripted_call(1, CONTRACT, 1, vec![])]);
    let simulator = simulator(chain);

    let response = simulator.get_gas_schedule(1).await.unwrap();
    assert_eq!(response.parameters["SLOAD_COLD"].value, 2100);
    assert_eq!(response.parameters["CALL"].value, 100);
    // warm CALL cost is deliberately not a separate knob
    assert!(!response.parameters.contains_key("CALL_WARM"));
    assert!(!response.parameters.contains_key("SLOAD"));
}

/// Drives the structured-log tracer through a full scripted execution and
/// checks the gas bookkeeping invariants hold end to end.
#[tokio::test]
async fn struct_log_invariants_end_to_end() {
    let mut chain = MockChain::new(Fork::Prague);
    chain.add_block(
        1,
        BLOCK_GAS_LIMIT,
        vec![scripted_call(
            1,
            CONTRACT,
            1_000_000,
            vec![
                Step::op(Opcode::PUSH1, &[]),
                Step::op(Opcode::SLOAD, &[1]),
                Step::op(Opcode::SSTORE, &[0, 1]),
                Step::op(Opcode::KECCAK256, &[32, 0]),
                Step::op(Opcode::STOP, &[]),
            ],
        )],
    );
    let provider = MockProvider::from_chain(&chain);

    let block = chain.block_by_number(1).await.unwrap().unwrap();
    let (mut view, block_ctx) = provider.build_block_context(&block.header, 0).unwrap();
    let (message, tx_ctx) = provider.build_tx_context(&mut view, &block, 0).unwrap();

    let mut tracer = StructLogTracer::new(StructLogConfig::default());
    let gas_pool = message.gas_limit;
    {
        let config = InterpreterConfig {
            hooks: Some(&mut tracer as &mut dyn TraceHooks),
            jump_table: None,
            schedule: None,
            no_base_fee: true,
        };
        let mut interpreter = provider.new_interpreter(view, block_ctx, tx_ctx, config);
        interpreter.apply_message(&message, gas_pool, true, false).unwrap();
    }

    let logs = tracer.logs();
    assert_eq!(logs.len(), 5);
    for log in logs {
        assert!(log.gas_cost <= log.gas, "{}: cost exceeds remaining", log.op);
        // on_tx_start fired, so every log carries the refund counter
        assert!(log.refund.is_some());
    }
    for pair in logs.windows(2) {
        assert_eq!(
            pair[0].gas_used,
            pair[0].gas - pair[1].gas,
            "gas chain broken at {}",
            pair[1].op
        );
    }
    // PUSH1 3, cold SLOAD 2100, no-op SSTORE 100,
    // KECCAK256 30 + 3 memory + 6 word, STOP 0
    assert_eq!(tracer.gas_used(), 21000 + 3 + 2100 + 100 + 39);
}
