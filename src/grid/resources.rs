// src/grid/resources.rs
use bevy::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;

use crate::grid::cache::EntityCache;
use crate::grid::definitions::{ColumnDefinition, Criteria, Row};
use crate::grid::editing::EditBlockPolicy;
use crate::grid::notify::{ChannelSink, Notice};
use crate::grid::runtime::GridRuntime;
use crate::grid::service::CollectionService;
use crate::grid::state::GridSnapshot;

/// The initialized grid. Inserted once the first count/page load finished.
#[derive(Resource, Clone)]
pub struct GridHandle(pub Arc<GridRuntime>);

/// Everything the startup task needs to build the runtime.
#[derive(Resource, Clone)]
pub struct GridSource {
    pub service: Arc<dyn CollectionService>,
    pub columns: Vec<ColumnDefinition>,
    pub criteria: Criteria,
    pub policy: EditBlockPolicy,
    pub(crate) sink: ChannelSink,
}

/// Process-wide row detail cache, also registered as the grid's refresh hook.
#[derive(Resource, Clone)]
pub struct SharedEntityCache(pub Arc<EntityCache<Option<Row>>>);

/// What the view renders this frame.
#[derive(Resource, Default, Debug)]
pub struct GridView {
    pub snapshot: GridSnapshot,
    /// Rows of `snapshot.window`, in order.
    pub rows: Vec<Row>,
    /// Background grid tasks spawned but not yet finished.
    pub pending_tasks: usize,
}

impl GridView {
    pub fn is_busy(&self) -> bool {
        self.pending_tasks > 0 || self.snapshot.loading
    }
}

#[derive(Resource, Default, Debug)]
pub struct GridFeedbackState {
    pub last_message: String,
    pub is_error: bool,
}

/// Receiving end of the grid's notification channel.
#[derive(Resource)]
pub struct GridNoticeReceiver(pub(crate) Mutex<UnboundedReceiver<Notice>>);

#[derive(Resource)]
pub struct GridSnapshotReceiver(pub(crate) watch::Receiver<GridSnapshot>);
