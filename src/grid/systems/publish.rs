// src/grid/systems/publish.rs
use bevy::prelude::*;

use crate::grid::events::{GridDataModifiedEvent, GridOperationFeedback, GridTaskFinished};
use crate::grid::notify::NoticeLevel;
use crate::grid::resources::{
    GridFeedbackState, GridHandle, GridNoticeReceiver, GridSnapshotReceiver, GridView,
};

/// Moves notices raised on background tasks into `GridOperationFeedback` events.
pub fn drain_grid_notices(
    receiver: Option<Res<GridNoticeReceiver>>,
    mut feedback_writer: EventWriter<GridOperationFeedback>,
) {
    let Some(receiver) = receiver else {
        return;
    };
    let mut rx = receiver.0.lock();
    while let Ok(notice) = rx.try_recv() {
        feedback_writer.write(GridOperationFeedback {
            is_error: notice.level == NoticeLevel::Error,
            message: notice.message,
        });
    }
}

/// Copies the latest published snapshot and the rows of its window into `GridView`.
pub fn mirror_grid_snapshot(
    grid: Option<Res<GridHandle>>,
    receiver: Option<ResMut<GridSnapshotReceiver>>,
    mut view: ResMut<GridView>,
    mut modified_writer: EventWriter<GridDataModifiedEvent>,
) {
    let (Some(grid), Some(mut receiver)) = (grid, receiver) else {
        return;
    };
    match receiver.0.has_changed() {
        Ok(true) => {}
        Ok(false) => return,
        Err(_) => {
            warn!("Grid snapshot channel closed");
            return;
        }
    }
    let snapshot = receiver.0.borrow_and_update().clone();
    let version = snapshot.version;
    view.rows = grid.0.rows_in_window();
    view.snapshot = snapshot;
    trace!(
        "Mirrored grid snapshot v{} ({} rows in window)",
        version,
        view.rows.len()
    );
    modified_writer.write(GridDataModifiedEvent { version });
}

pub fn track_grid_tasks(mut events: EventReader<GridTaskFinished>, mut view: ResMut<GridView>) {
    for event in events.read() {
        view.pending_tasks = view.pending_tasks.saturating_sub(1);
        match &event.result {
            Ok(detail) => debug!("Grid task {:?} finished: {}", event.operation, detail),
            Err(e) => warn!("Grid task {:?} failed: {}", event.operation, e),
        }
    }
}

pub fn handle_grid_feedback(
    mut feedback_events: EventReader<GridOperationFeedback>,
    mut feedback_state: ResMut<GridFeedbackState>,
) {
    let mut last_message = None;
    for event in feedback_events.read() {
        last_message = Some((event.message.clone(), event.is_error));
        // Show the first non-error, or the last error
        if !event.is_error {
            break;
        }
    }
    if let Some((msg, is_error)) = last_message {
        feedback_state.last_message = msg;
        feedback_state.is_error = is_error;
        if is_error {
            warn!("Grid feedback (error): {}", feedback_state.last_message);
        } else {
            info!("Grid feedback: {}", feedback_state.last_message);
        }
    }
}
