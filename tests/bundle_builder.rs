//! Bundle construction behavior

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use rust_decimal_macros::dec;

use common::{tx, MockSimulator, ETH, GWEI};
use mev_bundler::engine::bundle_builder::BundleBuilder;
use mev_bundler::storage::{BundleRepository, InMemoryBundleRepository};
use mev_bundler::utils::config::BundleConfig;
use mev_bundler::utils::types::BundleStatus;

fn builder_with(profit: rust_decimal::Decimal) -> (BundleBuilder, Arc<MockSimulator>) {
    let simulator = Arc::new(MockSimulator::new(profit, true));
    let builder = BundleBuilder::new(
        BundleConfig::default(),
        simulator.clone(),
        Arc::new(InMemoryBundleRepository::new()),
    );
    (builder, simulator)
}

#[tokio::test]
async fn ordering_preserves_the_transaction_multiset() {
    let (builder, _) = builder_with(dec!(1));

    let input = vec![
        tx("0xa1", "0xaaa", Some("0x111"), ETH, 30 * GWEI, 7),
        tx("0xb1", "0xbbb", Some("0x222"), 2 * ETH, 10 * GWEI, 3),
        tx("0xc1", "0xccc", Some("0x333"), ETH, 20 * GWEI, 5),
    ];
    let input_hashes: HashSet<String> = input
        .iter()
        .map(|t| t.hash.as_str().to_string())
        .collect();

    let bundle = builder
        .create_bundle(input, false)
        .await
        .expect("well-formed set must produce a bundle");

    let output_hashes: HashSet<String> = bundle
        .transactions
        .iter()
        .map(|t| t.hash.as_str().to_string())
        .collect();

    assert_eq!(bundle.transactions.len(), 3);
    assert_eq!(input_hashes, output_hashes);
    assert_eq!(bundle.metrics.transaction_count, 3);
    assert_eq!(bundle.status, BundleStatus::Pending);
}

#[tokio::test]
async fn payer_is_ordered_before_the_account_it_pays() {
    let (builder, _) = builder_with(dec!(1));

    // b pays a's sender, so b depends on a and must be placed first.
    let a = tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1);
    let b = tx("0xb1", "0xbbb", Some("0xaaa"), ETH, 20 * GWEI, 1);

    let bundle = builder
        .create_bundle(vec![a, b], false)
        .await
        .expect("dependent pair must produce a bundle");

    let order: Vec<&str> = bundle
        .transactions
        .iter()
        .map(|t| t.hash.as_str())
        .collect();
    assert_eq!(order, vec!["0xb1", "0xa1"]);
}

#[tokio::test]
async fn rejects_same_sender_nonce_conflict() {
    let (builder, _) = builder_with(dec!(1));

    let result = builder
        .create_bundle(
            vec![
                tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 5),
                tx("0xa2", "0xaaa", Some("0x222"), ETH, 20 * GWEI, 5),
            ],
            false,
        )
        .await;

    assert!(result.is_none());
    assert_eq!(builder.counters().await, (0, 1));
}

#[tokio::test]
async fn rejects_oversized_and_empty_sets() {
    let (builder, _) = builder_with(dec!(1));

    assert!(builder.create_bundle(Vec::new(), false).await.is_none());

    let four = (0..4)
        .map(|i| {
            tx(
                &format!("0x{i}"),
                &format!("0xaaa{i}"),
                Some("0x111"),
                ETH,
                10 * GWEI,
                i,
            )
        })
        .collect();
    assert!(builder.create_bundle(four, false).await.is_none());
}

#[tokio::test]
async fn rejects_transaction_without_recipient() {
    let (builder, _) = builder_with(dec!(1));

    let result = builder
        .create_bundle(vec![tx("0xa1", "0xaaa", None, ETH, 10 * GWEI, 1)], false)
        .await;

    assert!(result.is_none());
}

#[tokio::test]
async fn below_threshold_profit_yields_no_bundle() {
    // Default threshold is 0.1; zero estimated profit must not clear it.
    let (builder, simulator) = builder_with(dec!(0));

    let result = builder
        .create_bundle(
            vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)],
            false,
        )
        .await;

    assert!(result.is_none());
    assert_eq!(simulator.estimate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(builder.counters().await, (0, 1));
}

#[tokio::test]
async fn bundle_lookup_is_idempotent() {
    let (builder, _) = builder_with(dec!(1));

    let created = builder
        .create_bundle(
            vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)],
            false,
        )
        .await
        .expect("bundle must be created");

    let first = builder.get_bundle(&created.id).await.expect("stored");
    let second = builder.get_bundle(&created.id).await.expect("stored");

    assert_eq!(first.id, second.id);
    assert_eq!(first.status, second.status);
    assert_eq!(first.transactions.len(), second.transactions.len());
    assert!(builder.get_bundle("bundle_missing").await.is_none());
}

#[tokio::test]
async fn opportunistic_flag_survives_tracking_and_storage() {
    let simulator = Arc::new(MockSimulator::new(dec!(1), true));
    let repository = Arc::new(InMemoryBundleRepository::new());
    let builder = BundleBuilder::new(
        BundleConfig::default(),
        simulator,
        repository.clone(),
    );

    let created = builder
        .create_bundle(
            vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)],
            true,
        )
        .await
        .expect("bundle must be created");
    assert!(created.opportunistic);

    let tracked = builder.get_bundle(&created.id).await.expect("tracked");
    assert!(tracked.opportunistic);

    let stored = repository
        .get(&created.id)
        .await
        .expect("repository read")
        .expect("persisted");
    assert!(stored.opportunistic);
}

#[tokio::test]
async fn status_updates_are_visible_in_memory_and_in_storage() {
    let simulator = Arc::new(MockSimulator::new(dec!(1), true));
    let repository = Arc::new(InMemoryBundleRepository::new());
    let builder = BundleBuilder::new(
        BundleConfig::default(),
        simulator,
        repository.clone(),
    );

    let created = builder
        .create_bundle(
            vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)],
            false,
        )
        .await
        .expect("bundle must be created");

    builder
        .mark_status(&created.id, BundleStatus::Submitted)
        .await;

    let in_memory = builder.get_bundle(&created.id).await.expect("tracked");
    assert_eq!(in_memory.status, BundleStatus::Submitted);

    let stored = repository
        .get(&created.id)
        .await
        .expect("repository read")
        .expect("persisted");
    assert_eq!(stored.status, BundleStatus::Submitted);
}
