mod common;

use alephium_portfolio::feed::{FeedEntry, FeedStatus, TransactionFeed};
use alephium_portfolio::pending::PendingTransaction;
use alloy_primitives::U256;
use common::{ADDR_A, MockExplorer, tx};

fn history(count: u64) -> Vec<alephium_portfolio::explorer::TransactionDto> {
    // newest first: t{count} .. t1
    (1..=count).rev().map(|i| tx(&format!("t{i}"), i * 1000)).collect()
}

fn feed(page_size: u32, anchor: u64) -> TransactionFeed {
    TransactionFeed::new(vec![ADDR_A.to_string()], page_size, anchor)
}

fn pending(hash: &str) -> PendingTransaction {
    PendingTransaction {
        hash: hash.to_string(),
        from_address: ADDR_A.to_string(),
        to_address: ADDR_A.to_string(),
        atto_alph_amount: U256::from(1),
        tokens: vec![],
        timestamp: 99_000,
    }
}

#[tokio::test]
async fn pages_load_until_exhausted() {
    let api = MockExplorer::new().with_wallet_txs(history(5));
    let mut feed = feed(2, 10_000);

    feed.load_first_page(&api).await.unwrap();
    assert_eq!(feed.status(), FeedStatus::Ready);
    assert!(feed.has_more());

    feed.load_next_page(&api).await.unwrap();
    feed.load_next_page(&api).await.unwrap();
    assert!(!feed.has_more());

    let hashes: Vec<_> = feed.confirmed().map(|t| t.hash.clone()).collect();
    assert_eq!(hashes, vec!["t5", "t4", "t3", "t2", "t1"]);

    let calls = MockExplorer::calls(&api.wallet_tx_calls);
    feed.load_next_page(&api).await.unwrap();
    assert_eq!(MockExplorer::calls(&api.wallet_tx_calls), calls);
}

#[tokio::test]
async fn anchor_hides_newer_transactions_until_refresh() {
    let api = MockExplorer::new().with_wallet_txs(history(3));
    let mut feed = feed(2, 3_000);
    feed.load_first_page(&api).await.unwrap();
    feed.load_next_page(&api).await.unwrap();
    assert_eq!(feed.pages().len(), 2);

    api.push_wallet_tx(tx("t4", 4_000));
    assert!(feed.probe_latest(&api).await.unwrap());
    assert!(feed.new_transactions_available());

    feed.load_first_page(&api).await.unwrap();
    assert_eq!(feed.confirmed().count(), 3);
    assert!(feed.confirmed().all(|t| t.hash != "t4"));

    feed.refresh_at(&api, 5_000).await.unwrap();
    assert!(!feed.new_transactions_available());
    assert_eq!(feed.anchor_ts(), 5_000);
    assert_eq!(feed.pages().len(), 1);
    let hashes: Vec<_> = feed.confirmed().map(|t| t.hash.clone()).collect();
    assert_eq!(hashes, vec!["t4", "t3"]);
    assert!(feed.has_more());
}

#[tokio::test]
async fn unchanged_head_is_not_new() {
    let api = MockExplorer::new().with_wallet_txs(history(3));
    let mut feed = feed(10, 3_000);

    assert!(!feed.observe_latest_hash(Some("t3")));
    feed.load_first_page(&api).await.unwrap();
    assert!(!feed.probe_latest(&api).await.unwrap());
    assert!(!feed.observe_latest_hash(None));
}

#[tokio::test]
async fn confirmed_pages_clear_pending_entries() {
    let api = MockExplorer::new().with_wallet_txs(history(3));
    let mut feed = feed(10, 3_000);
    feed.submit_pending(pending("t2"));
    feed.submit_pending(pending("local"));

    let entries = feed.entries();
    assert!(matches!(entries[0], FeedEntry::Pending(_)));
    assert_eq!(entries.len(), 2);

    feed.load_first_page(&api).await.unwrap();

    assert!(!feed.pending().contains("t2"));
    assert!(feed.pending().contains("local"));
    let hashes: Vec<_> = feed.entries().iter().map(|e| e.hash().to_string()).collect();
    assert_eq!(hashes, vec!["local", "t3", "t2", "t1"]);
}

#[tokio::test]
async fn failed_next_page_keeps_loaded_pages() {
    let api = MockExplorer::new().with_wallet_txs(history(5));
    let mut feed = feed(2, 10_000);
    feed.load_first_page(&api).await.unwrap();

    api.fail_page(2);
    assert!(feed.load_next_page(&api).await.is_err());
    assert_eq!(feed.status(), FeedStatus::Ready);
    assert_eq!(feed.pages().len(), 1);
    assert!(feed.error().is_some());
}

#[tokio::test]
async fn failed_first_page_returns_to_idle() {
    let api = MockExplorer::new().with_wallet_txs(history(5));
    api.fail_page(1);
    let mut feed = feed(2, 10_000);

    assert!(feed.load_first_page(&api).await.is_err());
    assert_eq!(feed.status(), FeedStatus::Idle);
    assert!(feed.pages().is_empty());
}
