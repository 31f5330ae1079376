//! End-to-end strategy execution through the risk gate, bundle builder,
//! and retry loop

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{MockChainClient, MockSimulator, GWEI};
use mev_bundler::chain::DryRunSigner;
use mev_bundler::engine::bundle_builder::BundleBuilder;
use mev_bundler::engine::executor::{ExecutionError, StrategyExecutor};
use mev_bundler::engine::gas::GasPriceAdvisor;
use mev_bundler::notify::TracingSink;
use mev_bundler::storage::{InMemoryBundleRepository, InMemoryExecutionRepository};
use mev_bundler::strategies::{FlashLoanParams, Strategy};
use mev_bundler::utils::config::{BundleConfig, ExecutionConfig, GasConfig, RiskConfig};
use mev_bundler::utils::risk::RiskGate;
use mev_bundler::utils::types::{Address, BundleStatus, ExecutionStatus};

struct Harness {
    chain: Arc<MockChainClient>,
    simulator: Arc<MockSimulator>,
    bundles: Arc<BundleBuilder>,
    executor: StrategyExecutor,
}

fn harness(profit: Decimal, simulation_succeeds: bool, risk: RiskConfig) -> Harness {
    let chain = Arc::new(MockChainClient::new(50 * GWEI, 40 * GWEI));
    let simulator = Arc::new(MockSimulator::new(profit, simulation_succeeds));

    let gas = Arc::new(GasPriceAdvisor::new(GasConfig::default(), chain.clone()));
    let gate = Arc::new(RiskGate::new(risk, chain.clone()));
    let bundles = Arc::new(BundleBuilder::new(
        BundleConfig::default(),
        simulator.clone(),
        Arc::new(InMemoryBundleRepository::new()),
    ));

    let execution = ExecutionConfig {
        max_retries: 3,
        retry_delay_secs: 0,
        ..ExecutionConfig::default()
    };

    let executor = StrategyExecutor::new(
        execution,
        Address::from("0xbot"),
        chain.clone(),
        Arc::new(DryRunSigner),
        simulator.clone(),
        gas,
        gate,
        bundles.clone(),
        Arc::new(InMemoryExecutionRepository::new()),
        Arc::new(TracingSink),
    );

    Harness {
        chain,
        simulator,
        bundles,
        executor,
    }
}

fn flash_loan(loan_amount: Decimal) -> Strategy {
    Strategy::FlashLoanArbitrage(FlashLoanParams {
        lending_pool: Address::from("0xpool"),
        token: Address::from("0xtoken"),
        loan_amount,
        routes: vec![Address::from("0xrouter_a"), Address::from("0xrouter_b")],
    })
}

#[tokio::test]
async fn oversized_position_fails_before_any_bundle_is_built() {
    let risk = RiskConfig {
        max_position_size: dec!(10),
        ..RiskConfig::default()
    };
    let h = harness(dec!(1), true, risk);

    let err = h
        .executor
        .execute_strategy(flash_loan(dec!(1000)))
        .await
        .expect_err("oversized position must be rejected");

    match err {
        ExecutionError::RiskRejected { reason } => {
            assert_eq!(reason.to_string(), "position size exceeds limit");
        }
        other => panic!("unexpected error: {other}"),
    }

    // The bundle builder was never consulted and nothing went on chain.
    assert_eq!(h.simulator.estimate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.chain.sent_count().await, 0);

    let history = h.executor.get_execution_history().await;
    assert_eq!(history.len(), 1);
    assert!(matches!(history[0].status, ExecutionStatus::Failed { .. }));
}

#[tokio::test]
async fn unprofitable_bundle_fails_without_submitting() {
    let h = harness(dec!(0), true, RiskConfig::default());

    let err = h
        .executor
        .execute_strategy(flash_loan(dec!(5)))
        .await
        .expect_err("zero profit must stay below the threshold");

    assert!(matches!(err, ExecutionError::BundleRejected));
    assert_eq!(h.chain.sent_count().await, 0);
    assert_eq!(h.simulator.simulate_calls.load(Ordering::SeqCst), 0);

    let history = h.executor.get_execution_history().await;
    assert_eq!(history.len(), 1);
    assert!(matches!(history[0].status, ExecutionStatus::Failed { .. }));
}

#[tokio::test]
async fn profitable_execution_confirms_the_bundle() {
    let h = harness(dec!(2), true, RiskConfig::default());

    let outcome = h
        .executor
        .execute_strategy(flash_loan(dec!(5)))
        .await
        .expect("execution must succeed");

    assert_eq!(outcome.profit, dec!(2));
    assert_eq!(outcome.transaction_hashes.len(), 1);
    assert_eq!(outcome.gas_used, 21_000);
    assert_eq!(h.chain.sent_count().await, 1);

    let bundles = h.bundles.get_all_bundles().await;
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].status, BundleStatus::Confirmed);

    let history = h.executor.get_execution_history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ExecutionStatus::Completed);
    assert!(history[0].result.is_some());
    assert!(history[0].end_time.is_some());
}

#[tokio::test]
async fn failing_simulation_exhausts_exactly_the_configured_retries() {
    let h = harness(dec!(2), false, RiskConfig::default());

    let err = h
        .executor
        .execute_strategy(flash_loan(dec!(5)))
        .await
        .expect_err("failing simulation must exhaust retries");

    match err {
        ExecutionError::RetriesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("simulation failed"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Each attempt simulates once; nothing is submitted on failure.
    assert_eq!(h.simulator.simulate_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.chain.sent_count().await, 0);

    let bundles = h.bundles.get_all_bundles().await;
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].status, BundleStatus::Failed);
}

#[tokio::test]
async fn reverted_transaction_fails_the_attempt() {
    let h = harness(dec!(2), true, RiskConfig::default());
    h.chain.receipt_success.store(false, Ordering::SeqCst);

    let err = h
        .executor
        .execute_strategy(flash_loan(dec!(5)))
        .await
        .expect_err("reverted receipt must fail the execution");

    match err {
        ExecutionError::RetriesExhausted { last_error, .. } => {
            assert!(last_error.contains("reverted"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Every attempt resubmitted the single-transaction bundle.
    assert_eq!(h.chain.sent_count().await, 3);
}

#[tokio::test]
async fn finished_records_leave_the_active_table_exactly_once() {
    let h = harness(dec!(2), true, RiskConfig::default());

    h.executor
        .execute_strategy(flash_loan(dec!(5)))
        .await
        .expect("execution must succeed");

    assert!(h.executor.get_active_executions().await.is_empty());

    let history = h.executor.get_execution_history().await;
    assert_eq!(history.len(), 1);
    assert!(history[0].status.is_terminal());
}
