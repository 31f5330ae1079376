//! Mempool filtering and opportunity tracking

mod common;

use std::sync::Arc;

use common::{tx, MockChainClient, ETH, GWEI};
use mev_bundler::engine::mempool_scanner::{
    FilterUpdate, MempoolScanner, ValueHeuristicAnalyzer,
};
use mev_bundler::storage::InMemoryMempoolRepository;
use mev_bundler::utils::config::MempoolConfig;
use mev_bundler::utils::types::{Address, TxHash};

fn scanner_with(
    config: MempoolConfig,
) -> (MempoolScanner, Arc<InMemoryMempoolRepository>) {
    let repository = Arc::new(InMemoryMempoolRepository::new());
    let scanner = MempoolScanner::new(
        config,
        Arc::new(MockChainClient::new(50 * GWEI, 40 * GWEI)),
        repository.clone(),
        Arc::new(ValueHeuristicAnalyzer {
            min_interesting_value: 1,
        }),
    );
    (scanner, repository)
}

#[tokio::test]
async fn filtering_applies_predicates_and_preserves_order() {
    let config = MempoolConfig {
        min_value: 10,
        min_gas_price: 5 * GWEI,
        ..MempoolConfig::default()
    };
    let (scanner, _) = scanner_with(config);

    let raw = vec![
        tx("0xa1", "0xaaa", Some("0x111"), 5, 10 * GWEI, 1),
        tx("0xb1", "0xbbb", Some("0x222"), 20, 10 * GWEI, 1),
        tx("0xc1", "0xccc", Some("0x333"), 30, 2 * GWEI, 1),
        tx("0xd1", "0xddd", Some("0x444"), 10, 5 * GWEI, 1),
    ];

    let filtered = scanner.scan(&raw).await;
    let hashes: Vec<&str> = filtered.iter().map(|t| t.hash.as_str()).collect();

    assert_eq!(hashes, vec!["0xb1", "0xd1"]);
}

#[tokio::test]
async fn contract_allowlist_restricts_recipients() {
    let config = MempoolConfig {
        target_contracts: vec![Address::from("0xrouter")],
        ..MempoolConfig::default()
    };
    let (scanner, _) = scanner_with(config);

    let raw = vec![
        tx("0xa1", "0xaaa", Some("0xrouter"), ETH, 10 * GWEI, 1),
        tx("0xb1", "0xbbb", Some("0xother"), ETH, 10 * GWEI, 1),
        tx("0xc1", "0xccc", None, ETH, 10 * GWEI, 1),
    ];

    let filtered = scanner.scan(&raw).await;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].hash.as_str(), "0xa1");
}

#[tokio::test]
async fn filter_updates_take_effect_immediately() {
    let (scanner, _) = scanner_with(MempoolConfig::default());

    let raw = vec![tx("0xa1", "0xaaa", Some("0x111"), 50, 10 * GWEI, 1)];
    assert_eq!(scanner.scan(&raw).await.len(), 1);

    scanner
        .update_filters(FilterUpdate {
            min_value: Some(100),
            ..FilterUpdate::default()
        })
        .await;

    assert!(scanner.scan(&raw).await.is_empty());
}

#[tokio::test]
async fn processing_persists_and_tracks_interesting_transactions() {
    let (scanner, repository) = scanner_with(MempoolConfig::default());

    let batch = vec![
        tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1),
        // Zero value is persisted but never tracked.
        tx("0xb1", "0xbbb", Some("0x222"), 0, 10 * GWEI, 1),
    ];
    scanner.process(&batch).await;

    assert_eq!(repository.len().await, 2);

    let tracked = scanner.tracked_opportunities().await;
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].transaction.hash.as_str(), "0xa1");
    assert!(tracked[0].analysis.is_interesting);
}

#[tokio::test]
async fn tracked_table_evicts_oldest_beyond_capacity() {
    let config = MempoolConfig {
        max_tracked: 2,
        ..MempoolConfig::default()
    };
    let (scanner, _) = scanner_with(config);

    let batch = vec![
        tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1),
        tx("0xb1", "0xbbb", Some("0x222"), ETH, 10 * GWEI, 1),
        tx("0xc1", "0xccc", Some("0x333"), ETH, 10 * GWEI, 1),
    ];
    scanner.process(&batch).await;

    let hashes: Vec<String> = scanner
        .tracked_opportunities()
        .await
        .iter()
        .map(|o| o.transaction.hash.as_str().to_string())
        .collect();

    assert_eq!(hashes, vec!["0xb1", "0xc1"]);
}

#[tokio::test]
async fn consuming_an_opportunity_removes_it() {
    let (scanner, _) = scanner_with(MempoolConfig::default());

    let batch = vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)];
    scanner.process(&batch).await;

    let hash = TxHash::from("0xa1");
    assert!(scanner.consume_opportunity(&hash).await.is_some());
    assert!(scanner.consume_opportunity(&hash).await.is_none());
    assert!(scanner.tracked_opportunities().await.is_empty());
}

#[tokio::test]
async fn health_is_inactive_before_the_first_scan() {
    let (scanner, _) = scanner_with(MempoolConfig::default());

    let health = scanner.health_check().await;
    assert!(!health.healthy);
    assert_eq!(health.error_count, 0);
}

#[tokio::test]
async fn reprocessing_the_same_transaction_does_not_duplicate_it() {
    let (scanner, _) = scanner_with(MempoolConfig::default());

    let batch = vec![tx("0xa1", "0xaaa", Some("0x111"), ETH, 10 * GWEI, 1)];
    scanner.process(&batch).await;
    scanner.process(&batch).await;

    assert_eq!(scanner.tracked_opportunities().await.len(), 1);
}
