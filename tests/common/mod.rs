// tests/common/mod.rs
// Scripted collection service shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gridwind::grid::definitions::{Criteria, Row, RowPatch};
use gridwind::grid::notify::{ConfirmationService, Notice, NoticeLevel, NotificationSink};
use gridwind::grid::{CollectionService, PageResult, ServiceError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// In-memory service with call counters, injectable failures and a gate that
/// holds `get_page` / `get_all` until the test releases it.
#[derive(Default)]
pub struct ScriptedCollection {
    rows: Mutex<Vec<Row>>,
    pub count_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub all_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub abort_calls: AtomicUsize,
    pub deleted: Mutex<Vec<Vec<String>>>,
    pub page_requests: Mutex<Vec<(usize, usize)>>,
    /// Row count answered by each `get_all`.
    pub all_returned: Mutex<Vec<usize>>,
    pub fail_updates: AtomicBool,
    pub fail_pages: AtomicBool,
    pub fail_deletes: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    aborted: AtomicBool,
}

impl ScriptedCollection {
    pub fn new(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Default::default()
        })
    }

    /// `count` rows `r0..`, each with a `name` and `score`.
    pub fn numbered(count: usize) -> Arc<Self> {
        Self::new(numbered_rows(count))
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.lock().clone()
    }

    /// Holds every following fetch until `Notify::notify_one` is called on the gate.
    pub fn close_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.notify_waiters();
            // A fetch that cloned the gate but has not started waiting yet.
            gate.notify_one();
        }
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn wait_at_gate(&self) -> Result<(), ServiceError> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.aborted.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Aborted);
        }
        Ok(())
    }
}

pub fn numbered_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new(format!("r{}", i))
                .with_field("name", format!("Contact {}", i))
                .with_field("score", i as i64)
        })
        .collect()
}

#[async_trait]
impl CollectionService for ScriptedCollection {
    async fn count(&self, criteria: &Criteria) -> Result<usize, ServiceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().iter().filter(|r| criteria.matches(r)).count())
    }

    async fn get_page(
        &self,
        criteria: &Criteria,
        start_row: usize,
        end_row: usize,
    ) -> Result<PageResult, ServiceError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_requests.lock().push((start_row, end_row));
        self.wait_at_gate().await?;
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("page unavailable".into()));
        }
        let matching = criteria.apply(self.rows.lock().iter());
        let total = matching.len();
        let start = start_row.min(total);
        let end = end_row.clamp(start, total);
        Ok(PageResult::new(matching[start..end].to_vec(), total))
    }

    async fn get_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError> {
        self.all_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_at_gate().await?;
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("collection unavailable".into()));
        }
        let matching = criteria.apply(self.rows.lock().iter());
        let total = matching.len();
        self.all_returned.lock().push(total);
        Ok(PageResult::new(matching, total))
    }

    async fn update(&self, id: &str, patch: &RowPatch) -> Result<(), ServiceError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("write rejected".into()));
        }
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        row.apply_patch(patch);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), ServiceError> {
        self.deleted.lock().push(ids.to_vec());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("delete rejected".into()));
        }
        self.rows.lock().retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    fn abort(&self) {
        self.abort_calls.fetch_add(1, Ordering::SeqCst);
        self.aborted.store(true, Ordering::SeqCst);
        self.open_gate();
    }
}

/// Collects notices for assertions.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices.lock().iter().filter(|n| n.level == level).count()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Answers every prompt with a fixed value and remembers the prompts.
pub struct FixedConfirm {
    answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedConfirm {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ConfirmationService for FixedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answer
    }
}
