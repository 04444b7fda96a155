pub mod address;
pub mod wallet;

pub use address::{
    AddressTokenBalance, BalanceCache, BalanceQueryKey, LatestTransactions,
    fetch_address_balances, fetch_address_balances_cached, fetch_latest_transactions,
};
pub use wallet::{
    AddressQuery, ListedFtBalance, TokenBalance, WalletAggregator, WalletBalances, WalletTokens,
    fold_address_balances, probe_latest_transactions,
};
