mod common;

use alephium_portfolio::balances::{
    AddressQuery, BalanceCache, BalanceQueryKey, LatestTransactions, WalletAggregator,
    fetch_address_balances, fetch_address_balances_cached,
};
use alephium_portfolio::explorer::TokenListDto;
use alephium_portfolio::network::NetworkId;
use alephium_portfolio::portfolio::PortfolioTracker;
use alephium_portfolio::repository::{CacheRepository, Database};
use alephium_portfolio::tokens::{
    ALPH_TOKEN_ID, TokenClassifier, TokenKind, TokenRegistry, TokenRegistryCache,
};
use alloy_primitives::U256;
use common::{ADDR_A, ADDR_B, MockExplorer, alph, token_id};
use std::collections::HashSet;

const NOW: u64 = 1_700_000_000;

fn latest(hash: &str) -> Option<LatestTransactions> {
    Some(LatestTransactions {
        latest: Some(hash.to_string()),
        previous: None,
    })
}

fn registry(listed: &[&str]) -> TokenRegistry {
    let list = TokenListDto {
        network_id: 0,
        tokens: listed
            .iter()
            .map(|id| alephium_portfolio::explorer::TokenListEntryDto {
                id: id.to_string(),
                name: format!("Token {}", &id[..4]),
                symbol: id[..4].to_uppercase(),
                decimals: 18,
                logo_uri: None,
                description: None,
            })
            .collect(),
    };
    TokenRegistry::from_list(NetworkId::Mainnet, list, NOW)
}

fn two_address_wallet() -> MockExplorer {
    MockExplorer::new()
        .with_alph(ADDR_A, alph(500))
        .with_alph(ADDR_B, alph(300))
        .with_token(ADDR_B, &token_id(0xaa), U256::from(10))
        .with_latest(ADDR_A, &["a1"])
        .with_latest(ADDR_B, &["b1", "b0"])
        .with_price("ALPH", 1.0)
}

#[tokio::test]
async fn wallet_totals_and_worth_across_addresses() {
    let api = two_address_wallet();
    let mut tracker = PortfolioTracker::new(NetworkId::Mainnet, 100, HashSet::new(), "usd");

    let portfolio = tracker
        .load(&api, None, &[ADDR_A.to_string(), ADDR_B.to_string()], false, NOW)
        .await
        .unwrap();

    assert_eq!(portfolio.tokens.len(), 2);
    let first = &portfolio.tokens[0];
    assert_eq!(first.id, ALPH_TOKEN_ID);
    assert_eq!(first.balance.total, alph(800));
    assert_eq!(first.worth, Some(800.0));

    let second = &portfolio.tokens[1];
    assert_eq!(second.id, token_id(0xaa));
    assert_eq!(second.kind, TokenKind::NonStandard);
    assert_eq!(second.balance.total, U256::from(10));
    assert_eq!(second.worth, None);

    assert_eq!(portfolio.total_worth, 800.0);
    assert!(!portfolio.has_error);
    assert!(!portfolio.is_loading);
}

#[tokio::test]
async fn failed_address_contributes_zero_and_flags_error() {
    let api = two_address_wallet();
    api.fail_address(ADDR_B);
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);

    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_B, latest("b1")),
    ];
    let wallet = aggregator.aggregate(&api, &queries).await.unwrap();

    assert!(wallet.has_error);
    assert_eq!(wallet.failed_addresses, vec![ADDR_B.to_string()]);
    assert_eq!(wallet.balances[ALPH_TOKEN_ID].total, alph(500));
    assert!(!wallet.balances.contains_key(&token_id(0xaa)));
}

#[tokio::test]
async fn address_without_key_is_skipped() {
    let api = two_address_wallet();
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);

    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_B, None),
    ];
    let wallet = aggregator.aggregate(&api, &queries).await.unwrap();

    assert!(wallet.is_loading);
    assert!(!wallet.has_error);
    assert_eq!(MockExplorer::calls(&api.balance_calls), 1);
    assert_eq!(wallet.balances[ALPH_TOKEN_ID].total, alph(500));
}

#[tokio::test]
async fn balances_refetched_only_when_latest_hash_changes() {
    let api = two_address_wallet();
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);

    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_B, latest("b1")),
    ];
    aggregator.aggregate(&api, &queries).await.unwrap();
    aggregator.aggregate(&api, &queries).await.unwrap();
    assert_eq!(MockExplorer::calls(&api.balance_calls), 2);

    api.set_alph(ADDR_A, alph(450));
    let moved = vec![
        AddressQuery::new(ADDR_A, latest("a2")),
        AddressQuery::new(ADDR_B, latest("b1")),
    ];
    let wallet = aggregator.aggregate(&api, &moved).await.unwrap();

    assert_eq!(MockExplorer::calls(&api.balance_calls), 3);
    assert_eq!(wallet.balances[ALPH_TOKEN_ID].total, alph(750));
    assert_eq!(aggregator.balance_cache().len(), 2);
}

#[tokio::test]
async fn duplicate_addresses_count_once() {
    let api = two_address_wallet();
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);

    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_A, latest("a1")),
    ];
    let wallet = aggregator.aggregate(&api, &queries).await.unwrap();

    assert_eq!(wallet.balances[ALPH_TOKEN_ID].total, alph(500));
    assert_eq!(MockExplorer::calls(&api.balance_calls), 1);
}

#[tokio::test]
async fn token_balances_read_every_page() {
    let mut api = MockExplorer::new().with_alph(ADDR_A, alph(1));
    for i in 0..25u8 {
        api = api.with_token(ADDR_A, &token_id(i), U256::from(i as u64 + 1));
    }

    let balances = fetch_address_balances(&api, ADDR_A, 10).await.unwrap();

    assert_eq!(balances.len(), 26);
    assert_eq!(balances[0].token_id, ALPH_TOKEN_ID);
    assert_eq!(MockExplorer::calls(&api.token_page_calls), 3);
}

#[tokio::test]
async fn skipped_single_address_query_makes_no_request() {
    let api = two_address_wallet();
    let mut cache = BalanceCache::new();
    let key = BalanceQueryKey::new(
        ADDR_A,
        &LatestTransactions::default(),
        NetworkId::Mainnet,
    );

    let skipped = fetch_address_balances_cached(&mut cache, &api, &key, true, 100)
        .await
        .unwrap();
    assert!(skipped.is_none());
    assert_eq!(MockExplorer::calls(&api.balance_calls), 0);

    let first = fetch_address_balances_cached(&mut cache, &api, &key, false, 100)
        .await
        .unwrap();
    let second = fetch_address_balances_cached(&mut cache, &api, &key, false, 100)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(MockExplorer::calls(&api.balance_calls), 1);
}

#[tokio::test]
async fn classification_lookups_are_chunked_and_memoized() {
    let api = MockExplorer::new();
    let ids: Vec<String> = (0..170u32)
        .map(|i| format!("{i:064x}"))
        .collect();
    let registry = registry(&[]);
    let mut classifier = TokenClassifier::new();

    let first = classifier.classify_many(&api, &registry, &ids).await;
    assert_eq!(first.len(), 170);
    assert_eq!(first.nst_ids.len(), 170);
    assert_eq!(classifier.lookups(), 3);

    let second = classifier.classify_many(&api, &registry, &ids).await;
    assert_eq!(second, first);
    assert_eq!(MockExplorer::calls(&api.token_info_calls), 3);
}

#[tokio::test]
async fn empty_id_list_makes_no_lookup() {
    let api = MockExplorer::new();
    let mut classifier = TokenClassifier::new();

    let classified = classifier.classify_many(&api, &registry(&[]), &[]).await;

    assert!(classified.is_empty());
    assert_eq!(MockExplorer::calls(&api.token_info_calls), 0);
}

#[tokio::test]
async fn each_id_lands_in_exactly_one_bucket() {
    let listed = token_id(0x01);
    let fungible = token_id(0x02);
    let nft = token_id(0x03);
    let unknown = token_id(0x04);
    let api = MockExplorer::new()
        .with_interface(&fungible, "fungible")
        .with_interface(&nft, "non-fungible");
    let registry = registry(&[&listed]);
    let mut classifier = TokenClassifier::new();

    let ids = vec![
        listed.clone(),
        fungible.clone(),
        nft.clone(),
        unknown.clone(),
        fungible.clone(),
    ];
    let classified = classifier.classify_many(&api, &registry, &ids).await;

    assert_eq!(classified.listed_ft_ids, vec![listed.clone()]);
    assert_eq!(classified.unlisted_ft_ids, vec![fungible.clone()]);
    assert_eq!(classified.nft_ids, vec![nft.clone()]);
    assert_eq!(classified.nst_ids, vec![unknown.clone()]);
    assert_eq!(classified.len(), 4);
    assert!(!classified.incomplete);
}

#[tokio::test]
async fn failed_lookup_is_retried_on_next_pass() {
    let fungible = token_id(0x02);
    let api = MockExplorer::new().with_interface(&fungible, "fungible");
    api.set_fail_token_infos(true);
    let registry = registry(&[]);
    let mut classifier = TokenClassifier::new();

    let failed = classifier
        .classify_many(&api, &registry, &[fungible.clone()])
        .await;
    assert!(failed.incomplete);
    assert_eq!(failed.nst_ids, vec![fungible.clone()]);
    assert_eq!(classifier.cached(&fungible), None);

    api.set_fail_token_infos(false);
    let kind = classifier.classify(&api, &registry, &fungible).await;
    assert_eq!(kind, TokenKind::UnlistedFt);
}

#[tokio::test]
async fn hidden_tokens_are_filtered_from_every_bucket() {
    let hidden_id = token_id(0xaa);
    let api = two_address_wallet();
    let hidden: HashSet<String> = [hidden_id.clone()].into_iter().collect();
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);
    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_B, latest("b1")),
    ];

    let tokens = aggregator
        .aggregate_tokens(&api, &registry(&[]), &queries, Some(&hidden))
        .await
        .unwrap();

    assert!(tokens.balance_of(&hidden_id).is_none());
    assert!(tokens.nst_ids.is_empty());
    assert_eq!(tokens.listed_fts.len(), 1);
    assert_eq!(tokens.listed_fts[0].balance.total, alph(800));

    let all = aggregator
        .aggregate_tokens(&api, &registry(&[]), &queries, None)
        .await
        .unwrap();
    assert_eq!(all.balance_of(&hidden_id).map(|b| b.total), Some(U256::from(10)));
}

#[tokio::test]
async fn token_dropped_from_refreshed_registry_stays_in_a_bucket() {
    let delisted = token_id(0xaa);
    let api = two_address_wallet().with_interface(&delisted, "fungible");
    let mut aggregator = WalletAggregator::new(NetworkId::Mainnet, 100);
    let queries = vec![
        AddressQuery::new(ADDR_A, latest("a1")),
        AddressQuery::new(ADDR_B, latest("b1")),
    ];

    let listed = aggregator
        .aggregate_tokens(&api, &registry(&[&delisted]), &queries, None)
        .await
        .unwrap();
    assert_eq!(listed.listed_fts.len(), 2);
    assert!(listed.unlisted_ft_ids.is_empty());

    let refreshed = aggregator
        .aggregate_tokens(&api, &registry(&[]), &queries, None)
        .await
        .unwrap();
    assert_eq!(refreshed.listed_fts.len(), 1);
    assert_eq!(refreshed.unlisted_ft_ids, vec![delisted.clone()]);
    assert_eq!(
        refreshed.balance_of(&delisted).map(|b| b.total),
        Some(U256::from(10))
    );
}

#[tokio::test]
async fn listed_ids_are_not_cached_across_registry_refreshes() {
    let delisted = token_id(0xbb);
    let api = MockExplorer::new().with_interface(&delisted, "fungible");
    let mut classifier = TokenClassifier::new();

    let first = classifier
        .classify_many(&api, &registry(&[&delisted]), &[delisted.clone()])
        .await;
    assert_eq!(first.listed_ft_ids, vec![delisted.clone()]);
    assert_eq!(classifier.cached(&delisted), None);

    let second = classifier
        .classify_many(&api, &registry(&[]), &[delisted.clone()])
        .await;
    assert!(second.listed_ft_ids.is_empty());
    assert_eq!(second.unlisted_ft_ids, vec![delisted.clone()]);
    assert_eq!(MockExplorer::calls(&api.token_info_calls), 1);
}

#[tokio::test]
async fn unlisted_fungible_metadata_is_resolved() {
    let id = token_id(0x02);
    let api = MockExplorer::new()
        .with_alph(ADDR_A, alph(1))
        .with_token(ADDR_A, &id, U256::from(5_000))
        .with_latest(ADDR_A, &["a1"])
        .with_fungible(&id, "USDX", "Dollar X", 3);
    let mut tracker = PortfolioTracker::new(NetworkId::Mainnet, 100, HashSet::new(), "usd");

    let portfolio = tracker
        .load(&api, None, &[ADDR_A.to_string()], false, NOW)
        .await
        .unwrap();

    let token = portfolio.tokens.iter().find(|t| t.id == id).unwrap();
    assert_eq!(token.kind, TokenKind::UnlistedFt);
    assert_eq!(token.symbol.as_deref(), Some("USDX"));
    assert_eq!(token.name, "Dollar X");
    assert_eq!(token.decimals, 3);
    assert_eq!(token.worth, None);
}

#[tokio::test]
async fn price_failure_leaves_worth_unknown() {
    let api = two_address_wallet();
    api.set_fail_prices(true);
    let mut tracker = PortfolioTracker::new(NetworkId::Mainnet, 100, HashSet::new(), "usd");

    let portfolio = tracker
        .load(&api, None, &[ADDR_A.to_string()], false, NOW)
        .await
        .unwrap();

    assert_eq!(portfolio.tokens[0].worth, None);
    assert_eq!(portfolio.total_worth, 0.0);
}

#[tokio::test]
async fn token_list_is_persisted_and_reused() {
    let api = MockExplorer::new().with_listed(&token_id(0x01), "ONE", "One", 18);
    let db = Database::in_memory().unwrap();
    let store = CacheRepository::new(&db.conn);

    let mut first = TokenRegistryCache::new(NetworkId::Mainnet);
    let registry = first.get_or_fetch(&api, Some(&store), NOW).await.unwrap();
    assert!(registry.contains(&token_id(0x01)));
    assert!(registry.contains(ALPH_TOKEN_ID));

    let mut second = TokenRegistryCache::new(NetworkId::Mainnet);
    second
        .get_or_fetch(&api, Some(&store), NOW + 60)
        .await
        .unwrap();
    assert_eq!(MockExplorer::calls(&api.token_list_calls), 1);

    let mut expired = TokenRegistryCache::new(NetworkId::Mainnet);
    expired
        .get_or_fetch(&api, Some(&store), NOW + 2 * 86_400)
        .await
        .unwrap();
    assert_eq!(MockExplorer::calls(&api.token_list_calls), 2);
}
