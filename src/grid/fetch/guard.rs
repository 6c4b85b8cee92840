// src/grid/fetch/guard.rs
//! Per-grid fetch-in-flight guard.
//!
//! A ticket holds the guard for the lifetime of one page fetch. Scroll-triggered
//! loads only `try_claim`; explicit loads `claim` and wait their turn. The epoch
//! advances on abort and on replace requests, which turns any outstanding
//! ticket's result stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct FetchGuard {
    lock: Arc<Mutex<()>>,
    epoch: AtomicU64,
}

#[derive(Debug)]
pub struct FetchTicket {
    _permit: OwnedMutexGuard<()>,
    epoch: u64,
}

impl FetchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_claim(&self) -> Option<FetchTicket> {
        let permit = Arc::clone(&self.lock).try_lock_owned().ok()?;
        Some(FetchTicket {
            _permit: permit,
            epoch: self.current_epoch(),
        })
    }

    pub async fn claim(&self) -> FetchTicket {
        let permit = Arc::clone(&self.lock).lock_owned().await;
        FetchTicket {
            _permit: permit,
            epoch: self.current_epoch(),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Makes every ticket issued so far stale.
    pub fn advance(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.epoch == self.current_epoch()
    }
}
