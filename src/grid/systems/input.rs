// src/grid/systems/input.rs
//! Systems turning view requests into grid runtime calls. Anything that awaits
//! the backing service runs on the tokio runtime via `spawn_grid_task`.

use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use super::{spawn_grid_task, SendEvent};
use crate::grid::editing::CommitOutcome;
use crate::grid::events::{
    AttachViewportEvent, GridOperation, GridTaskFinished, RequestAbortLoad, RequestDeleteSelected,
    RequestExportJson, RequestGridRefresh, RequestRedo, RequestRowDetail, RequestSelectionChange,
    RequestSetCriteria, RequestUndo, RowDetailLoaded, RowMeasuredEvent, ScrollGridEvent,
    SelectionChange, UpdateCellEvent,
};
use crate::grid::resources::{GridHandle, GridView, SharedEntityCache};
use crate::grid::runtime::LoadOutcome;
use crate::grid::selection::DeleteOutcome;

fn describe_load(outcome: LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { rows, total } => format!("{} of {} rows held", rows, total),
        LoadOutcome::Discarded => "superseded".to_string(),
    }
}

pub fn handle_viewport_changes(
    mut attach_events: EventReader<AttachViewportEvent>,
    mut measured_events: EventReader<RowMeasuredEvent>,
    grid: Option<Res<GridHandle>>,
) {
    let Some(grid) = grid else {
        attach_events.clear();
        measured_events.clear();
        return;
    };
    if let Some(event) = attach_events.read().last() {
        debug!("Viewport attached: {}px", event.viewport_height);
        grid.0.attach_viewport(event.viewport_height);
    }
    for event in measured_events.read() {
        grid.0.set_row_height(event.index, event.height);
    }
}

/// Only the newest offset of a frame matters.
pub fn handle_scroll(
    mut events: EventReader<ScrollGridEvent>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let Some(offset) = events.read().last().map(|e| e.offset) else {
        return;
    };
    let Some(grid) = grid else {
        return;
    };
    let Some(next) = grid.0.on_scroll(offset) else {
        return;
    };
    let Some(runtime) = runtime else {
        warn!("Cannot fetch page {}: no TokioTasksRuntime", next.request().index);
        return;
    };
    debug!("Scroll reached lookahead; fetching page {}", next.request().index);
    let grid = Arc::clone(&grid.0);
    spawn_grid_task(&runtime, &mut view, GridOperation::LoadNextPage, async move {
        grid.fetch_next(next)
            .await
            .map(describe_load)
            .map_err(|e| e.to_string())
    });
}

pub fn handle_cell_update(
    mut events: EventReader<UpdateCellEvent>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let (Some(grid), Some(runtime)) = (grid, runtime) else {
        if !events.is_empty() {
            warn!("Ignoring {} cell update(s): grid not ready", events.len());
            events.clear();
        }
        return;
    };
    for event in events.read() {
        let grid = Arc::clone(&grid.0);
        let event = event.clone();
        spawn_grid_task(&runtime, &mut view, GridOperation::UpdateCell, async move {
            match grid
                .commit_single_cell(&event.row_id, &event.field, event.value)
                .await
            {
                Ok(CommitOutcome::Committed { .. }) => {
                    Ok(format!("{}.{} committed", event.row_id, event.field))
                }
                Ok(CommitOutcome::Unchanged) => Ok("unchanged".to_string()),
                Ok(CommitOutcome::NoRow) => Ok(format!("row '{}' not loaded", event.row_id)),
                Err(e) => Err(e.to_string()),
            }
        });
    }
}

pub fn handle_selection_change(
    mut events: EventReader<RequestSelectionChange>,
    grid: Option<Res<GridHandle>>,
) {
    let Some(grid) = grid else {
        events.clear();
        return;
    };
    for event in events.read() {
        match &event.change {
            SelectionChange::Select(id) => grid.0.select(id),
            SelectionChange::Deselect(id) => grid.0.deselect(id),
            SelectionChange::Toggle(id) => grid.0.toggle_selection(id),
            SelectionChange::AllMatching => grid.0.select_all_matching(),
            SelectionChange::Clear => grid.0.clear_selection(),
        }
    }
}

pub fn handle_delete_selected(
    mut events: EventReader<RequestDeleteSelected>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    // Repeated clicks in one frame collapse into one delete.
    if events.read().count() == 0 {
        return;
    }
    let (Some(grid), Some(runtime)) = (grid, runtime) else {
        warn!("Delete requested before the grid was ready");
        return;
    };
    let grid = Arc::clone(&grid.0);
    spawn_grid_task(&runtime, &mut view, GridOperation::DeleteSelected, async move {
        match grid.delete_selected().await {
            Ok(DeleteOutcome::Deleted { ids, blocked }) => {
                Ok(format!("deleted {} row(s), {} blocked", ids.len(), blocked))
            }
            Ok(DeleteOutcome::Cancelled) => Ok("cancelled".to_string()),
            Err(e) => Err(e.to_string()),
        }
    });
}

pub fn handle_undo_redo(
    mut undo_events: EventReader<RequestUndo>,
    mut redo_events: EventReader<RequestRedo>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let undos = undo_events.read().count();
    let redos = redo_events.read().count();
    if undos + redos == 0 {
        return;
    }
    let (Some(grid), Some(runtime)) = (grid, runtime) else {
        return;
    };
    // One task per frame, undos before redos, so replays never interleave.
    let operation = if undos > 0 { GridOperation::Undo } else { GridOperation::Redo };
    let grid = Arc::clone(&grid.0);
    spawn_grid_task(&runtime, &mut view, operation, async move {
        let mut replayed = Vec::new();
        for _ in 0..undos {
            match grid.undo().await {
                Ok(Some(edit)) => replayed.push(format!("undid {}.{}", edit.row_id, edit.field)),
                Ok(None) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        for _ in 0..redos {
            match grid.redo().await {
                Ok(Some(edit)) => replayed.push(format!("redid {}.{}", edit.row_id, edit.field)),
                Ok(None) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        if replayed.is_empty() {
            Ok("nothing to replay".to_string())
        } else {
            Ok(replayed.join(", "))
        }
    });
}

pub fn handle_refresh_requests(
    mut refresh_events: EventReader<RequestGridRefresh>,
    mut criteria_events: EventReader<RequestSetCriteria>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let refresh = refresh_events.read().count() > 0;
    let criteria = criteria_events.read().last().map(|e| e.criteria.clone());
    if !refresh && criteria.is_none() {
        return;
    }
    let (Some(grid), Some(runtime)) = (grid, runtime) else {
        return;
    };
    let grid = Arc::clone(&grid.0);
    match criteria {
        // New criteria reload from page 0 anyway; a refresh in the same frame adds nothing.
        Some(criteria) => {
            spawn_grid_task(&runtime, &mut view, GridOperation::SetCriteria, async move {
                grid.set_criteria(criteria)
                    .await
                    .map(describe_load)
                    .map_err(|e| e.to_string())
            });
        }
        None => {
            spawn_grid_task(&runtime, &mut view, GridOperation::Refresh, async move {
                grid.refresh().await.map(describe_load).map_err(|e| e.to_string())
            });
        }
    }
}

pub fn handle_abort_request(
    mut events: EventReader<RequestAbortLoad>,
    grid: Option<Res<GridHandle>>,
) {
    if events.read().count() == 0 {
        return;
    }
    if let Some(grid) = grid {
        grid.0.abort();
    }
}

pub fn handle_export_request(
    mut events: EventReader<RequestExportJson>,
    grid: Option<Res<GridHandle>>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let (Some(grid), Some(runtime)) = (grid, runtime) else {
        events.clear();
        return;
    };
    for event in events.read() {
        let grid = Arc::clone(&grid.0);
        let path = event.path.clone();
        spawn_grid_task(&runtime, &mut view, GridOperation::Export, async move {
            let file = match File::create(&path) {
                Ok(file) => file,
                Err(e) => return Err(format!("Cannot create {}: {}", path.display(), e)),
            };
            match grid.export_json(BufWriter::new(file)).await {
                Ok(Some(count)) => Ok(format!("{} row(s) written to {}", count, path.display())),
                Ok(None) => Ok("cancelled".to_string()),
                Err(e) => Err(e.to_string()),
            }
        });
    }
}

pub fn handle_row_detail_request(
    mut events: EventReader<RequestRowDetail>,
    cache: Res<SharedEntityCache>,
    runtime: Option<Res<TokioTasksRuntime>>,
    mut view: ResMut<GridView>,
) {
    let Some(runtime) = runtime else {
        events.clear();
        return;
    };
    for event in events.read() {
        let cache = Arc::clone(&cache.0);
        let row_id = event.row_id.clone();
        view.pending_tasks += 1;
        runtime.spawn_background_task(move |mut ctx| async move {
            let loaded = cache.load(&row_id).await;
            ctx.run_on_main_thread(move |world_ctx| {
                let result = match &loaded {
                    Ok(Some(_)) => Ok(format!("row '{}' loaded", row_id)),
                    Ok(None) => Ok(format!("row '{}' not found", row_id)),
                    Err(e) => Err(e.to_string()),
                };
                world_ctx.world.spawn(SendEvent {
                    event: RowDetailLoaded {
                        row_id,
                        row: loaded.ok().flatten(),
                    },
                });
                world_ctx.world.spawn(SendEvent {
                    event: GridTaskFinished {
                        operation: GridOperation::RowDetail,
                        result,
                    },
                });
            })
            .await;
        });
    }
}
