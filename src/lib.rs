pub mod addresses;
pub mod amount;
pub mod balances;
pub mod cache;
pub mod config;
pub mod explorer;
pub mod feed;
pub mod network;
pub mod pending;
pub mod portfolio;
pub mod query;
pub mod repository;
pub mod tokens;
pub mod transactions;
pub mod watcher;
pub mod worth;
