// src/grid/runtime.rs
//! One grid instance: row model, row store, virtualizer, editing, history and
//! selection wired together behind an async API.
//!
//! Locks are short-lived `parking_lot` locks and are never held across an
//! `.await`; page fetches are serialized by the `FetchGuard` instead.

use bevy::log::{debug, error, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;

use crate::grid::definitions::{resolve_column, single_field_patch, ColumnDefinition, Criteria, Row};
use crate::grid::editing::{CommitOutcome, EditBlockPolicy, EditingController, RefreshHook};
use crate::grid::error::{GridError, GridResult, ServiceError};
use crate::grid::fetch::{
    select_row_model, FetchGuard, FetchTicket, PageRequest, RowModel, RowModelKind,
};
use crate::grid::history::{CellEdit, CellEditHistory, EditHistory, UndoRedoManager};
use crate::grid::notify::{AutoConfirm, ConfirmationService, LogSink, Notice, NotificationSink};
use crate::grid::selection::{BulkDeleter, DeleteOutcome, SelectionState};
use crate::grid::service::CollectionService;
use crate::grid::state::{GridSnapshot, GridState};
use crate::grid::store::RowStore;
use crate::grid::virtualizer::{RowWindow, Virtualizer};
use crate::settings::GridSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied; `rows` is the number of rows now held.
    Loaded { rows: usize, total: usize },
    /// The fetch was superseded or aborted and its result dropped.
    Discarded,
}

/// A claimed next-page fetch. Holding it keeps the grid's fetch guard busy.
#[derive(Debug)]
pub struct NextPage {
    ticket: FetchTicket,
    request: PageRequest,
}

impl NextPage {
    pub fn request(&self) -> &PageRequest {
        &self.request
    }
}

pub struct GridRuntimeBuilder {
    service: Arc<dyn CollectionService>,
    settings: GridSettings,
    criteria: Criteria,
    columns: Vec<ColumnDefinition>,
    policy: EditBlockPolicy,
    sink: Arc<dyn NotificationSink>,
    confirm: Arc<dyn ConfirmationService>,
    history: Option<Arc<dyn EditHistory>>,
    hooks: Vec<Arc<dyn RefreshHook>>,
}

impl GridRuntimeBuilder {
    pub fn settings(mut self, settings: GridSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn columns(mut self, columns: Vec<ColumnDefinition>) -> Self {
        self.columns = columns;
        self
    }

    pub fn policy(mut self, policy: EditBlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn confirmation(mut self, confirm: Arc<dyn ConfirmationService>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Binds the grid to an editing surface's history instead of its own.
    pub fn history(mut self, history: Arc<dyn EditHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn refresh_hook(mut self, hook: Arc<dyn RefreshHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Picks the row model from one count query, then loads the first page.
    ///
    /// Fails only when the count itself fails. A failed first page leaves the
    /// grid empty with `load_failed` set so the caller can `refresh`.
    pub async fn initialize(self) -> GridResult<GridRuntime> {
        let model = match select_row_model(
            Arc::clone(&self.service),
            &self.criteria,
            self.settings.full_set_threshold,
        )
        .await
        {
            Ok(model) => model,
            Err(e) => {
                error!("Grid initialization failed: {}", e);
                self.sink
                    .notify(Notice::error(format!("Failed to load rows: {}", e)));
                return Err(GridError::LoadFailed(e));
            }
        };

        let history = self
            .history
            .unwrap_or_else(|| Arc::new(CellEditHistory::new(self.settings.history_limit)));
        let mut editor = EditingController::new(
            Arc::clone(&self.service),
            self.policy.clone(),
            Arc::clone(&self.sink),
        );
        for hook in self.hooks {
            editor.add_refresh_hook(hook);
        }
        let deleter = BulkDeleter::new(
            Arc::clone(&self.service),
            self.policy,
            Arc::clone(&self.sink),
            Arc::clone(&self.confirm),
        );

        let runtime = GridRuntime {
            virtualizer: Mutex::new(Virtualizer::new(self.settings.virtualizer_config())),
            page_size: self.settings.effective_page_size(),
            service: self.service,
            model,
            columns: self.columns,
            criteria: RwLock::new(self.criteria),
            store: Mutex::new(RowStore::new()),
            guard: FetchGuard::new(),
            state: GridState::new(),
            editor,
            undo: UndoRedoManager::new(history),
            selection: Mutex::new(SelectionState::default()),
            deleter,
            sink: self.sink,
            confirm: self.confirm,
        };
        let kind = runtime.model.kind();
        info!("Grid initialized in {:?} mode", kind);
        runtime.publish(|s| s.model = Some(kind));
        // Errors are already published and notified.
        let _ = runtime.load_page(0, false).await;
        Ok(runtime)
    }
}

pub struct GridRuntime {
    service: Arc<dyn CollectionService>,
    model: Arc<dyn RowModel>,
    page_size: usize,
    columns: Vec<ColumnDefinition>,
    criteria: RwLock<Criteria>,
    store: Mutex<RowStore>,
    virtualizer: Mutex<Virtualizer>,
    guard: FetchGuard,
    state: GridState,
    editor: EditingController,
    undo: UndoRedoManager,
    selection: Mutex<SelectionState>,
    deleter: BulkDeleter,
    sink: Arc<dyn NotificationSink>,
    confirm: Arc<dyn ConfirmationService>,
}

impl GridRuntime {
    pub fn builder(service: Arc<dyn CollectionService>) -> GridRuntimeBuilder {
        GridRuntimeBuilder {
            service,
            settings: GridSettings::default(),
            criteria: Criteria::default(),
            columns: Vec::new(),
            policy: EditBlockPolicy::default(),
            sink: Arc::new(LogSink),
            confirm: Arc::new(AutoConfirm),
            history: None,
            hooks: Vec::new(),
        }
    }

    // --- Observation ---

    pub fn model_kind(&self) -> RowModelKind {
        self.model.kind()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn criteria(&self) -> Criteria {
        self.criteria.read().clone()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        self.state.subscribe()
    }

    pub fn row_count(&self) -> usize {
        self.store.lock().len()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.store.lock().rows().to_vec()
    }

    pub fn row(&self, id: &str) -> Option<Row> {
        self.store.lock().get(id).cloned()
    }

    pub fn window(&self) -> RowWindow {
        self.virtualizer.lock().window()
    }

    /// Rows the view should realize right now.
    pub fn rows_in_window(&self) -> Vec<Row> {
        let window = self.window();
        self.store.lock().slice(window).to_vec()
    }

    pub fn is_fetching(&self) -> bool {
        self.guard.in_flight()
    }

    fn publish(&self, f: impl FnOnce(&mut GridSnapshot)) {
        let (row_count, total_count, has_more) = {
            let store = self.store.lock();
            (store.len(), store.total_count(), store.has_more())
        };
        let (window, (padding_top, padding_bottom), total_height) = {
            let virtualizer = self.virtualizer.lock();
            let window = virtualizer.window();
            (window, virtualizer.padding(window), virtualizer.total_height())
        };
        let selected_count = self.selection.lock().explicit_len();
        let (can_undo, can_redo) = (self.undo.can_undo(), self.undo.can_redo());
        self.state.update(|s| {
            s.row_count = row_count;
            s.total_count = total_count;
            s.has_more = has_more;
            s.window = window;
            s.padding_top = padding_top;
            s.padding_bottom = padding_bottom;
            s.total_height = total_height;
            s.selected_count = selected_count;
            s.can_undo = can_undo;
            s.can_redo = can_redo;
            f(s);
        });
    }

    // --- Loading ---

    /// Explicit page load. Waits for an in-flight fetch; a replace request
    /// (`append == false`) first supersedes it.
    pub async fn load_page(&self, index: usize, append: bool) -> GridResult<LoadOutcome> {
        if !append {
            self.guard.advance();
        }
        let ticket = self.guard.claim().await;
        let request = PageRequest {
            index,
            page_size: self.page_size,
            append,
            criteria: self.criteria(),
        };
        self.run_fetch(ticket, request).await
    }

    async fn run_fetch(
        &self,
        ticket: FetchTicket,
        request: PageRequest,
    ) -> GridResult<LoadOutcome> {
        self.publish(|s| s.loading = true);
        let result = self.model.load_page(&request).await;

        if !self.guard.is_current(&ticket) {
            debug!(
                "Discarding result of page {} (epoch {} superseded)",
                request.index,
                ticket.epoch()
            );
            drop(ticket);
            let still_loading = self.guard.in_flight();
            self.publish(|s| s.loading = still_loading);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(page) => {
                let total = page.total_count;
                let rows = self.store.lock().apply_page(page, request.append);
                {
                    let mut virtualizer = self.virtualizer.lock();
                    if !request.append {
                        virtualizer.set_scroll_offset(0.0);
                    }
                    virtualizer.set_row_count(rows);
                }
                self.undo.refresh();
                drop(ticket);
                self.publish(|s| {
                    s.loading = false;
                    s.load_failed = None;
                });
                debug!("Page {} applied: {} of {} rows held", request.index, rows, total);
                Ok(LoadOutcome::Loaded { rows, total })
            }
            Err(ServiceError::Aborted) => {
                drop(ticket);
                self.publish(|s| s.loading = false);
                debug!("Page {} load aborted by the service", request.index);
                Err(GridError::Aborted)
            }
            Err(e) => {
                drop(ticket);
                let message = format!("Failed to load rows: {}", e);
                error!("{}", message);
                self.sink.notify(Notice::error(message.clone()));
                self.publish(|s| {
                    s.loading = false;
                    s.load_failed = Some(message);
                });
                Err(GridError::LoadFailed(e))
            }
        }
    }

    /// Reloads the first page, going back to the service even in full-set mode.
    pub async fn refresh(&self) -> GridResult<LoadOutcome> {
        info!("Refreshing grid ({:?})", self.model.kind());
        self.model.invalidate();
        self.load_page(0, false).await
    }

    /// Replaces the criteria and reloads from page 0.
    pub async fn set_criteria(&self, criteria: Criteria) -> GridResult<LoadOutcome> {
        *self.criteria.write() = criteria;
        self.load_page(0, false).await
    }

    /// Cancels the outstanding fetch. Its eventual result is dropped.
    pub fn abort(&self) {
        info!("Aborting outstanding grid load");
        self.guard.advance();
        self.service.abort();
        self.publish(|s| s.loading = false);
    }

    // --- Virtualization ---

    pub fn attach_viewport(&self, viewport_height: f32) {
        self.virtualizer.lock().attach(viewport_height);
        self.publish(|_| {});
    }

    pub fn set_row_height(&self, index: usize, height: f32) {
        self.virtualizer.lock().set_row_height(index, height);
        self.publish(|_| {});
    }

    /// Scroll handler. Recomputes the window and, when it nears the end of the
    /// held rows, claims the next page without waiting. Returns `None` while a
    /// fetch is already in flight.
    pub fn on_scroll(&self, offset: f32) -> Option<NextPage> {
        let window = {
            let mut virtualizer = self.virtualizer.lock();
            virtualizer.set_scroll_offset(offset);
            virtualizer.window()
        };
        self.publish(|_| {});

        let (held, has_more, next_index) = {
            let store = self.store.lock();
            (store.len(), store.has_more(), store.next_page_index(self.page_size))
        };
        if !self.virtualizer.lock().needs_more(window, held, has_more) {
            return None;
        }
        let ticket = self.guard.try_claim()?;
        trace!("Window {:?} near end of {} rows; claiming page {}", window, held, next_index);
        Some(NextPage {
            ticket,
            request: PageRequest {
                index: next_index,
                page_size: self.page_size,
                append: true,
                criteria: self.criteria(),
            },
        })
    }

    pub async fn fetch_next(&self, next: NextPage) -> GridResult<LoadOutcome> {
        self.run_fetch(next.ticket, next.request).await
    }

    /// `on_scroll` followed by the fetch it claimed, if any.
    pub async fn scroll_to(&self, offset: f32) -> GridResult<Option<LoadOutcome>> {
        match self.on_scroll(offset) {
            Some(next) => self.fetch_next(next).await.map(Some),
            None => Ok(None),
        }
    }

    // --- Editing ---

    pub async fn commit_single_cell(
        &self,
        row_id: &str,
        field: &str,
        proposed: Value,
    ) -> GridResult<CommitOutcome> {
        let result = self.apply_edit(row_id, field, proposed).await;
        if let Ok(CommitOutcome::Committed { previous, value }) = &result {
            self.undo.record(CellEdit {
                row_id: row_id.to_string(),
                field: field.to_string(),
                previous: previous.clone(),
                value: value.clone(),
            });
        }
        self.undo.refresh();
        self.publish(|_| {});
        result
    }

    async fn apply_edit(
        &self,
        row_id: &str,
        field: &str,
        proposed: Value,
    ) -> GridResult<CommitOutcome> {
        let column = resolve_column(&self.columns, field);
        let outcome = self
            .editor
            .commit_single_cell(&self.store, row_id, &column, proposed)
            .await?;
        if let CommitOutcome::Committed { value, .. } = &outcome {
            self.model
                .apply_patch(row_id, &single_field_patch(field, value.clone()));
        }
        Ok(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Replays the newest edit's previous value. Returns the edit that was undone.
    pub async fn undo(&self) -> GridResult<Option<CellEdit>> {
        let Some(edit) = self.undo.undo() else {
            return Ok(None);
        };
        let result = self
            .apply_edit(&edit.row_id, &edit.field, edit.previous.clone())
            .await;
        let replayed = self.finish_replay(&edit, result, || {
            self.undo.redo();
        });
        self.publish(|_| {});
        replayed
    }

    /// Replays the newest undone edit's value. Returns the edit that was redone.
    pub async fn redo(&self) -> GridResult<Option<CellEdit>> {
        let Some(edit) = self.undo.redo() else {
            return Ok(None);
        };
        let result = self
            .apply_edit(&edit.row_id, &edit.field, edit.value.clone())
            .await;
        let replayed = self.finish_replay(&edit, result, || {
            self.undo.undo();
        });
        self.publish(|_| {});
        replayed
    }

    fn finish_replay(
        &self,
        edit: &CellEdit,
        result: GridResult<CommitOutcome>,
        restore_position: impl FnOnce(),
    ) -> GridResult<Option<CellEdit>> {
        match result {
            Ok(CommitOutcome::NoRow) => {
                warn!("Row '{}' is no longer loaded; nothing to replay", edit.row_id);
                self.undo.refresh();
                Ok(None)
            }
            Ok(_) => {
                self.undo.refresh();
                Ok(Some(edit.clone()))
            }
            Err(e) => {
                restore_position();
                Err(e)
            }
        }
    }

    // --- Selection & bulk delete ---

    pub fn selection(&self) -> SelectionState {
        self.selection.lock().clone()
    }

    pub fn select(&self, id: &str) {
        self.selection.lock().select(id);
        self.publish(|_| {});
    }

    pub fn deselect(&self, id: &str) {
        self.selection.lock().deselect(id);
        self.publish(|_| {});
    }

    pub fn toggle_selection(&self, id: &str) {
        self.selection.lock().toggle(id);
        self.publish(|_| {});
    }

    pub fn select_all_matching(&self) {
        self.selection.lock().select_all_matching();
        self.publish(|_| {});
    }

    pub fn clear_selection(&self) {
        self.selection.lock().clear();
        self.publish(|_| {});
    }

    pub async fn delete_selected(&self) -> GridResult<DeleteOutcome> {
        let selection = self.selection();
        let criteria = self.criteria();
        let rows = match self
            .deleter
            .resolve(&selection, &self.store, self.model.as_ref(), &criteria)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!("Could not resolve selection: {}", e);
                self.sink.notify(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        let outcome = self.deleter.execute(&rows).await?;
        if let DeleteOutcome::Deleted { ids, .. } = &outcome {
            let removed = self.store.lock().remove_ids(ids);
            self.model.forget(ids);
            for hook in self.editor.hooks() {
                hook.rows_removed(ids);
            }
            self.selection.lock().clear();
            let held = self.store.lock().len();
            self.virtualizer.lock().set_row_count(held);
            self.undo.refresh();
            debug!("Removed {} materialized row(s) after delete", removed.len());
        }
        self.publish(|_| {});
        Ok(outcome)
    }

    // --- Export ---

    /// Writes every row matching the current criteria as pretty JSON after
    /// confirmation. Returns `None` when the user declines.
    pub async fn export_json<W: Write + Send>(&self, writer: W) -> GridResult<Option<usize>> {
        let criteria = self.criteria();
        let all = match self.model.load_all(&criteria).await {
            Ok(all) => all,
            Err(e) => {
                let err = GridError::LoadFailed(e);
                error!("Export failed: {}", err);
                self.sink.notify(Notice::error(err.to_string()));
                return Err(err);
            }
        };
        let prompt = format!("Export {} row(s) as JSON?", all.rows.len());
        if !self.confirm.confirm(&prompt).await {
            info!("Export cancelled");
            return Ok(None);
        }
        serde_json::to_writer_pretty(writer, &all.rows)?;
        info!("Exported {} row(s)", all.rows.len());
        self.sink
            .notify(Notice::success(format!("Exported {} row(s)", all.rows.len())));
        Ok(Some(all.rows.len()))
    }
}
