// src/cli/browse.rs
// Headless Bevy app that scrolls a grid from top to bottom and logs each window.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksPlugin;
use std::sync::Arc;
use std::time::Duration;

use crate::collection::seed::contact_columns;
use crate::collection::SqliteCollection;
use crate::grid::definitions::{value_text, Criteria};
use crate::grid::events::{AttachViewportEvent, GridDataModifiedEvent, ScrollGridEvent};
use crate::grid::resources::{GridHandle, GridView};
use crate::grid::virtualizer::RowWindow;
use crate::grid::{GridPlugin, GridSystemSet};
use crate::settings::GridSettings;

#[derive(Debug, Clone, Copy)]
pub struct BrowseOptions {
    pub step: f32,
    pub max_frames: u32,
    pub viewport: f32,
}

#[derive(Resource, Debug)]
struct BrowseScript {
    options: BrowseOptions,
    frames: u32,
    offset: f32,
    attached: bool,
}

pub fn run(
    collection: Arc<SqliteCollection>,
    settings: GridSettings,
    criteria: Criteria,
    options: BrowseOptions,
) {
    let exit = App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        )
        .add_plugins(LogPlugin {
            level: bevy::log::Level::INFO,
            filter: "bevy_tokio_tasks=warn,gridwind=info".to_string(),
            ..default()
        })
        .add_plugins(TokioTasksPlugin::default())
        .add_plugins(
            GridPlugin::new(collection)
                .with_settings(settings)
                .with_columns(contact_columns())
                .with_criteria(criteria),
        )
        .insert_resource(BrowseScript {
            options,
            frames: 0,
            offset: 0.0,
            attached: false,
        })
        .add_systems(
            Update,
            (
                drive_scroll.before(GridSystemSet::UserInput),
                report_window.after(GridSystemSet::Publish),
            ),
        )
        .run();
    info!("Browse finished: {:?}", exit);
}

fn drive_scroll(
    mut script: ResMut<BrowseScript>,
    grid: Option<Res<GridHandle>>,
    view: Res<GridView>,
    mut attach_writer: EventWriter<AttachViewportEvent>,
    mut scroll_writer: EventWriter<ScrollGridEvent>,
    mut exit_writer: EventWriter<AppExit>,
) {
    script.frames += 1;
    if script.frames > script.options.max_frames {
        warn!("Stopping after {} frames", script.options.max_frames);
        exit_writer.write(AppExit::Success);
        return;
    }
    if grid.is_none() || view.is_busy() {
        return;
    }
    if let Some(message) = &view.snapshot.load_failed {
        error!("Grid failed to load: {}", message);
        exit_writer.write(AppExit::error());
        return;
    }
    if !script.attached {
        attach_writer.write(AttachViewportEvent {
            viewport_height: script.options.viewport,
        });
        script.attached = true;
        return;
    }

    let max_offset = (view.snapshot.total_height - script.options.viewport).max(0.0);
    if script.offset >= max_offset && !view.snapshot.has_more {
        info!(
            "Reached the end: {} of {} rows held",
            view.snapshot.row_count, view.snapshot.total_count
        );
        exit_writer.write(AppExit::Success);
        return;
    }
    script.offset = (script.offset + script.options.step).min(max_offset);
    scroll_writer.write(ScrollGridEvent {
        offset: script.offset,
    });
}

fn report_window(
    mut events: EventReader<GridDataModifiedEvent>,
    view: Res<GridView>,
    mut last_window: Local<Option<RowWindow>>,
) {
    if events.read().count() == 0 {
        return;
    }
    let snapshot = &view.snapshot;
    if *last_window == Some(snapshot.window) {
        return;
    }
    *last_window = Some(snapshot.window);
    let first = view
        .rows
        .first()
        .and_then(|row| row.field("name"))
        .map(value_text)
        .unwrap_or_default();
    info!(
        "Rows {}..{} ({} held of {}, {:?}) first: {}",
        snapshot.window.start,
        snapshot.window.end,
        snapshot.row_count,
        snapshot.total_count,
        snapshot.model,
        first
    );
}
