// src/grid/systems/mod.rs
pub mod forward;
pub mod input;
pub mod publish;
pub mod startup;

use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use std::future::Future;

use crate::grid::events::{GridOperation, GridTaskFinished};
use crate::grid::resources::GridView;

pub use forward::{forward_events, SendEvent};

/// Runs `task` on the tokio runtime and reports its completion as a
/// `GridTaskFinished` event on the main thread.
pub(crate) fn spawn_grid_task<Fut>(
    runtime: &TokioTasksRuntime,
    view: &mut GridView,
    operation: GridOperation,
    task: Fut,
) where
    Fut: Future<Output = Result<String, String>> + Send + 'static,
{
    view.pending_tasks += 1;
    runtime.spawn_background_task(move |mut ctx| async move {
        let result = task.await;
        ctx.run_on_main_thread(move |world_ctx| {
            world_ctx.world.spawn(SendEvent {
                event: GridTaskFinished { operation, result },
            });
        })
        .await;
    });
}
