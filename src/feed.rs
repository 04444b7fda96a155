use crate::explorer::{ExplorerApi, TransactionDto};
use crate::pending::{PendingAction, PendingTransaction, PendingTransactionsState};
use anyhow::Result;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Ready,
    LoadingNextPage,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEntry<'a> {
    Pending(&'a PendingTransaction),
    Confirmed(&'a TransactionDto),
}

impl FeedEntry<'_> {
    pub fn hash(&self) -> &str {
        match self {
            FeedEntry::Pending(tx) => &tx.hash,
            FeedEntry::Confirmed(tx) => &tx.hash,
        }
    }
}

pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Paginated transaction history of a wallet.
///
/// Pages are fetched against a fixed timestamp anchor so that transactions
/// arriving later never shift the loaded window. New activity is detected by
/// [`TransactionFeed::probe_latest`] and only shown after a refresh, which
/// discards every loaded page and restarts from the first one.
#[derive(Debug, Clone)]
pub struct TransactionFeed {
    addresses: Vec<String>,
    page_size: u32,
    anchor_ts: u64,
    pages: Vec<Vec<TransactionDto>>,
    status: FeedStatus,
    error: Option<String>,
    has_more: bool,
    new_transactions_available: bool,
    pending: PendingTransactionsState,
}

impl TransactionFeed {
    pub fn new(addresses: Vec<String>, page_size: u32, anchor_ts: u64) -> Self {
        Self {
            addresses,
            page_size: page_size.max(1),
            anchor_ts,
            pages: Vec::new(),
            status: FeedStatus::Idle,
            error: None,
            has_more: true,
            new_transactions_available: false,
            pending: PendingTransactionsState::new(),
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn pages(&self) -> &[Vec<TransactionDto>] {
        &self.pages
    }

    pub fn anchor_ts(&self) -> u64 {
        self.anchor_ts
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn new_transactions_available(&self) -> bool {
        self.new_transactions_available
    }

    pub fn pending(&self) -> &PendingTransactionsState {
        &self.pending
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &TransactionDto> {
        self.pages.iter().flatten()
    }

    /// Pending transactions first, then the confirmed pages in order.
    pub fn entries(&self) -> Vec<FeedEntry<'_>> {
        self.pending
            .entries()
            .iter()
            .map(FeedEntry::Pending)
            .chain(self.confirmed().map(FeedEntry::Confirmed))
            .collect()
    }

    pub fn submit_pending(&mut self, tx: PendingTransaction) {
        self.pending.reduce(PendingAction::Submitted(tx));
    }

    pub async fn load_first_page<A>(&mut self, api: &A) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        if !self.pages.is_empty() {
            return Ok(());
        }
        self.status = FeedStatus::Loading;
        self.fetch_page(api, 0).await
    }

    /// Loads the page after the last loaded one. Failures keep loaded pages
    /// and are retried only by calling this again.
    pub async fn load_next_page<A>(&mut self, api: &A) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        if self.pages.is_empty() {
            return self.load_first_page(api).await;
        }
        if !self.has_more {
            debug!("Transaction feed exhausted after {} pages", self.pages.len());
            return Ok(());
        }
        self.status = FeedStatus::LoadingNextPage;
        self.fetch_page(api, self.pages.len()).await
    }

    pub async fn refresh<A>(&mut self, api: &A) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        self.refresh_at(api, now_millis()).await
    }

    /// Drops every loaded page and reloads the first one anchored at `anchor_ts`.
    pub async fn refresh_at<A>(&mut self, api: &A, anchor_ts: u64) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        info!("Refreshing transaction feed at {}", anchor_ts);
        self.anchor_ts = anchor_ts;
        self.pages.clear();
        self.has_more = true;
        self.new_transactions_available = false;
        self.error = None;
        self.status = FeedStatus::Refreshing;
        self.fetch_page(api, 0).await
    }

    /// Compares the most recent hash reported by the explorer with the head of
    /// the loaded feed and flags new transactions on mismatch.
    pub fn observe_latest_hash(&mut self, latest: Option<&str>) -> bool {
        let Some(latest) = latest else {
            return self.new_transactions_available;
        };
        if self.pages.is_empty() {
            return self.new_transactions_available;
        }

        let head = self.pages.first().and_then(|p| p.first()).map(|tx| tx.hash.as_str());
        if head != Some(latest) {
            if !self.new_transactions_available {
                info!("New transactions available (latest {})", latest);
            }
            self.new_transactions_available = true;
        }
        self.new_transactions_available
    }

    pub async fn probe_latest<A>(&mut self, api: &A) -> Result<bool>
    where
        A: ExplorerApi + ?Sized,
    {
        let latest = api.wallet_transactions(&self.addresses, 1, 1, None).await?;
        let hash = latest.first().map(|tx| tx.hash.clone());
        Ok(self.observe_latest_hash(hash.as_deref()))
    }

    async fn fetch_page<A>(&mut self, api: &A, index: usize) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        let page_number = index as u32 + 1;
        let result = api
            .wallet_transactions(
                &self.addresses,
                page_number,
                self.page_size,
                Some(self.anchor_ts),
            )
            .await;

        match result {
            Ok(page) => {
                self.has_more = page.len() as u32 >= self.page_size;
                let hashes: Vec<String> = page.iter().map(|tx| tx.hash.clone()).collect();
                self.pending.reduce(PendingAction::Confirmed(hashes));
                debug!("Loaded page {} with {} transactions", page_number, page.len());
                self.pages.push(page);
                self.error = None;
                self.status = FeedStatus::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load transaction page {}: {:#}", page_number, e);
                self.error = Some(format!("{e:#}"));
                self.status = if self.pages.is_empty() {
                    FeedStatus::Idle
                } else {
                    FeedStatus::Ready
                };
                Err(e)
            }
        }
    }
}
