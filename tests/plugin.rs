// tests/plugin.rs
// Drives GridPlugin in a headless app: background init, cell edits and row detail loads.

use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksPlugin;
use gridwind::collection::MemoryCollection;
use gridwind::grid::definitions::Row;
use gridwind::grid::events::{RequestRowDetail, RowDetailLoaded, UpdateCellEvent};
use gridwind::grid::resources::{GridFeedbackState, GridHandle, GridView};
use gridwind::grid::{GridPlugin, GridSystemSet};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Resource, Default)]
struct LoadedDetails(Vec<RowDetailLoaded>);

fn collect_details(mut events: EventReader<RowDetailLoaded>, mut seen: ResMut<LoadedDetails>) {
    seen.0.extend(events.read().cloned());
}

fn app_over(collection: Arc<MemoryCollection>) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(TokioTasksPlugin::default())
        .add_plugins(GridPlugin::new(collection))
        .init_resource::<LoadedDetails>()
        .add_systems(Update, collect_details.after(GridSystemSet::ApplyChanges));
    app
}

/// Runs frames until `done` holds, giving background tasks time between frames.
fn pump(app: &mut App, what: &str, done: impl Fn(&World) -> bool) {
    for _ in 0..500 {
        app.update();
        if done(app.world()) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {}", what);
}

fn ready(world: &World) -> bool {
    world.contains_resource::<GridHandle>() && !world.resource::<GridView>().is_busy()
}

fn contacts() -> Vec<Row> {
    vec![
        Row::new("r1").with_field("name", "Ana"),
        Row::new("r2").with_field("name", "Bruno"),
    ]
}

#[test]
fn grid_initializes_in_the_background_and_mirrors_rows() {
    let mut app = app_over(Arc::new(MemoryCollection::new(contacts())));
    pump(&mut app, "grid handle", ready);

    let view = app.world().resource::<GridView>();
    assert_eq!(view.snapshot.row_count, 2);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].id, "r1");
}

#[test]
fn cell_edit_event_persists_and_reports_feedback() {
    let collection = Arc::new(MemoryCollection::new(contacts()));
    let mut app = app_over(Arc::clone(&collection));
    pump(&mut app, "grid handle", ready);

    app.world_mut().send_event(UpdateCellEvent {
        row_id: "r2".to_string(),
        field: "name".to_string(),
        value: json!("Bea"),
    });
    pump(&mut app, "edit feedback", |world| {
        world
            .resource::<GridFeedbackState>()
            .last_message
            .starts_with("Updated")
    });
    pump(&mut app, "mirrored edit", |world| {
        world
            .resource::<GridView>()
            .rows
            .iter()
            .any(|r| r.field("name") == Some(&json!("Bea")))
    });

    assert_eq!(collection.update_calls(), 1);
    assert!(!app.world().resource::<GridFeedbackState>().is_error);
    let stored = collection.rows().into_iter().find(|r| r.id == "r2").unwrap();
    assert_eq!(stored.field("name"), Some(&json!("Bea")));
}

#[test]
fn row_detail_request_answers_with_the_row() {
    let mut app = app_over(Arc::new(MemoryCollection::new(contacts())));
    pump(&mut app, "grid handle", ready);

    app.world_mut().send_event(RequestRowDetail {
        row_id: "r1".to_string(),
    });
    app.world_mut().send_event(RequestRowDetail {
        row_id: "ghost".to_string(),
    });
    pump(&mut app, "row details", |world| world.resource::<LoadedDetails>().0.len() == 2);

    let details = &app.world().resource::<LoadedDetails>().0;
    let found = details.iter().find(|d| d.row_id == "r1").unwrap();
    assert_eq!(found.row.as_ref().map(|r| r.id.as_str()), Some("r1"));
    let missing = details.iter().find(|d| d.row_id == "ghost").unwrap();
    assert!(missing.row.is_none());
}
