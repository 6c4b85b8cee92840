// src/grid/systems/startup.rs
use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use std::sync::Arc;

use super::SendEvent;
use crate::grid::events::{GridOperation, GridTaskFinished};
use crate::grid::resources::{
    GridHandle, GridSnapshotReceiver, GridSource, GridView, SharedEntityCache,
};
use crate::grid::runtime::GridRuntime;
use crate::settings::GridSettings;

/// Builds the grid runtime in the background (one count query plus the first
/// page) and inserts `GridHandle` once it is ready.
pub fn initialize_grid(
    runtime: Option<Res<TokioTasksRuntime>>,
    source: Option<Res<GridSource>>,
    settings: Res<GridSettings>,
    cache: Res<SharedEntityCache>,
    mut view: ResMut<GridView>,
) {
    let Some(runtime) = runtime else {
        error!("TokioTasksRuntime missing; add TokioTasksPlugin before GridPlugin.");
        return;
    };
    let Some(source) = source else {
        warn!("No GridSource resource; grid stays uninitialized.");
        return;
    };

    let source = source.clone();
    let settings = settings.clone();
    let hook = Arc::clone(&cache.0);
    view.pending_tasks += 1;
    info!("Initializing grid ({} columns)", source.columns.len());

    runtime.spawn_background_task(move |mut ctx| async move {
        let built = GridRuntime::builder(source.service)
            .settings(settings)
            .criteria(source.criteria)
            .columns(source.columns)
            .policy(source.policy)
            .notifications(Arc::new(source.sink))
            .refresh_hook(hook)
            .initialize()
            .await;

        ctx.run_on_main_thread(move |world_ctx| {
            let world = world_ctx.world;
            let result = match built {
                Ok(grid) => {
                    let grid = Arc::new(grid);
                    let mut snapshots = grid.subscribe();
                    // The first page was published before anyone subscribed.
                    snapshots.mark_changed();
                    world.insert_resource(GridSnapshotReceiver(snapshots));
                    let message =
                        format!("{:?} mode, {} rows", grid.model_kind(), grid.row_count());
                    world.insert_resource(GridHandle(grid));
                    Ok(message)
                }
                Err(e) => Err(e.to_string()),
            };
            world.spawn(SendEvent {
                event: GridTaskFinished {
                    operation: GridOperation::Initialize,
                    result,
                },
            });
        })
        .await;
    });
}
