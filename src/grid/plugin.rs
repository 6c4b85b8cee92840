// src/grid/plugin.rs
use bevy::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

use super::cache::{EntityCache, EntityLoader};
use super::definitions::{ColumnDefinition, Criteria, Row};
use super::editing::EditBlockPolicy;
use super::error::ServiceError;
use super::events::{
    AttachViewportEvent, GridDataModifiedEvent, GridOperationFeedback, GridTaskFinished,
    RequestAbortLoad, RequestDeleteSelected, RequestExportJson, RequestGridRefresh, RequestRedo,
    RequestRowDetail, RequestSelectionChange, RequestSetCriteria, RequestUndo, RowDetailLoaded,
    RowMeasuredEvent, ScrollGridEvent, UpdateCellEvent,
};
use super::notify::{ChannelSink, Notice, NotificationSink};
use super::resources::{
    GridFeedbackState, GridNoticeReceiver, GridSource, GridView, SharedEntityCache,
};
use super::service::CollectionService;
use super::systems::{forward_events, input, publish, startup};
use crate::settings::GridSettings;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridSystemSet {
    UserInput,    // Requests from the view
    ApplyChanges, // Results of background tasks
    Publish,      // Snapshot and feedback for the view
}

/// Windowed grid over one collection service.
///
/// Requires `TokioTasksPlugin`. The runtime is built on a background task at
/// startup; `GridHandle` appears once the first page is loaded.
pub struct GridPlugin {
    service: Arc<dyn CollectionService>,
    detail_loader: Arc<dyn EntityLoader<Option<Row>>>,
    settings: GridSettings,
    columns: Vec<ColumnDefinition>,
    criteria: Criteria,
    policy: EditBlockPolicy,
}

impl GridPlugin {
    pub fn new<S>(service: Arc<S>) -> Self
    where
        S: CollectionService + EntityLoader<Option<Row>> + 'static,
    {
        Self {
            service: service.clone(),
            detail_loader: service,
            settings: GridSettings::default(),
            columns: Vec::new(),
            criteria: Criteria::default(),
            policy: EditBlockPolicy::default(),
        }
    }

    pub fn with_settings(mut self, settings: GridSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDefinition>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_policy(mut self, policy: EditBlockPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                GridSystemSet::UserInput,
                GridSystemSet::ApplyChanges.after(GridSystemSet::UserInput),
                GridSystemSet::Publish.after(GridSystemSet::ApplyChanges),
            ),
        );

        // --- Resources ---
        let (sink, notices) = ChannelSink::new();
        let cache_sink = sink.clone();
        let cache = EntityCache::new("row_detail", Arc::clone(&self.detail_loader))
            .with_error_reporter(Arc::new(move |key: &str, e: &ServiceError| {
                cache_sink.notify(Notice::warning(format!("Could not load row '{}': {}", key, e)));
            }));
        app.insert_resource(self.settings.clone())
            .insert_resource(SharedEntityCache(Arc::new(cache)))
            .insert_resource(GridNoticeReceiver(Mutex::new(notices)))
            .insert_resource(GridSource {
                service: Arc::clone(&self.service),
                columns: self.columns.clone(),
                criteria: self.criteria.clone(),
                policy: self.policy.clone(),
                sink,
            })
            .init_resource::<GridView>()
            .init_resource::<GridFeedbackState>();

        // --- Events ---
        app.add_event::<ScrollGridEvent>()
            .add_event::<AttachViewportEvent>()
            .add_event::<RowMeasuredEvent>()
            .add_event::<UpdateCellEvent>()
            .add_event::<RequestSelectionChange>()
            .add_event::<RequestDeleteSelected>()
            .add_event::<RequestUndo>()
            .add_event::<RequestRedo>()
            .add_event::<RequestGridRefresh>()
            .add_event::<RequestSetCriteria>()
            .add_event::<RequestAbortLoad>()
            .add_event::<RequestExportJson>()
            .add_event::<RequestRowDetail>()
            .add_event::<GridOperationFeedback>()
            .add_event::<GridDataModifiedEvent>()
            .add_event::<GridTaskFinished>()
            .add_event::<RowDetailLoaded>();

        app.add_systems(Startup, startup::initialize_grid);

        app.add_systems(
            Update,
            (
                input::handle_viewport_changes,
                input::handle_scroll,
                input::handle_selection_change,
                input::handle_abort_request,
                input::handle_refresh_requests,
                input::handle_cell_update,
                input::handle_undo_redo,
                input::handle_delete_selected,
                input::handle_export_request,
                input::handle_row_detail_request,
            )
                .chain()
                .in_set(GridSystemSet::UserInput),
        );
        app.add_systems(
            Update,
            (
                forward_events::<GridTaskFinished>,
                forward_events::<RowDetailLoaded>,
                publish::track_grid_tasks,
            )
                .chain()
                .in_set(GridSystemSet::ApplyChanges),
        );
        app.add_systems(
            Update,
            (
                publish::drain_grid_notices,
                publish::handle_grid_feedback,
                publish::mirror_grid_snapshot,
            )
                .chain()
                .in_set(GridSystemSet::Publish),
        );

        info!("GridPlugin initialized.");
    }
}
