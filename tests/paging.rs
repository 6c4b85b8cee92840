// tests/paging.rs
// Row model selection, page application, lookahead and stale-result handling.

mod common;

use common::{numbered_rows, RecordingSink, ScriptedCollection};
use gridwind::grid::definitions::{ColumnFilter, Criteria, FilterOperator, SortSpec};
use gridwind::grid::fetch::RowModelKind;
use gridwind::grid::notify::NoticeLevel;
use gridwind::grid::{GridError, GridRuntime, LoadOutcome};
use gridwind::settings::GridSettings;
use std::sync::Arc;

fn paged_settings(page_size: usize) -> GridSettings {
    GridSettings {
        full_set_threshold: 1,
        page_size,
        row_height: 10.0,
        overscan: 0,
        lookahead_rows: 10,
        estimated_viewport_height: 100.0,
        ..GridSettings::default()
    }
}

async fn paged_grid(service: &Arc<ScriptedCollection>, page_size: usize) -> Arc<GridRuntime> {
    Arc::new(
        GridRuntime::builder(service.clone())
            .settings(paged_settings(page_size))
            .initialize()
            .await
            .unwrap(),
    )
}

fn held_ids(grid: &GridRuntime) -> Vec<String> {
    grid.rows().into_iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn small_collections_are_fetched_once_and_paged_locally() {
    let service = ScriptedCollection::numbered(30);
    let grid = GridRuntime::builder(service.clone())
        .settings(GridSettings {
            page_size: 10,
            ..GridSettings::default()
        })
        .initialize()
        .await
        .unwrap();

    assert_eq!(grid.model_kind(), RowModelKind::FullSet);
    assert_eq!(grid.row_count(), 10);
    assert_eq!(grid.snapshot().total_count, 30);

    grid.load_page(1, true).await.unwrap();
    grid.load_page(2, true).await.unwrap();
    assert_eq!(grid.row_count(), 30);
    assert!(!grid.snapshot().has_more);

    // Filtering and sorting happen in memory.
    let outcome = grid
        .set_criteria(
            Criteria::default()
                .with_filter("score", ColumnFilter::new(FilterOperator::LessThan, 5))
                .with_sort(SortSpec::desc("score")),
        )
        .await
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { rows: 5, total: 5 });
    assert_eq!(held_ids(&grid), vec!["r4", "r3", "r2", "r1", "r0"]);

    assert_eq!(ScriptedCollection::calls(&service.all_calls), 1);
    assert_eq!(ScriptedCollection::calls(&service.page_calls), 0);
    assert_eq!(ScriptedCollection::calls(&service.count_calls), 1);
}

#[tokio::test]
async fn full_set_is_fetched_under_the_grid_criteria() {
    let rows = numbered_rows(30)
        .into_iter()
        .enumerate()
        .map(|(i, row)| if i % 3 == 0 { row.with_tags(["vip"]) } else { row })
        .collect();
    let service = ScriptedCollection::new(rows);
    let grid = GridRuntime::builder(service.clone())
        .settings(GridSettings {
            page_size: 5,
            ..GridSettings::default()
        })
        .criteria(Criteria::default().with_tags(["vip"]))
        .initialize()
        .await
        .unwrap();

    assert_eq!(grid.model_kind(), RowModelKind::FullSet);
    assert_eq!(*service.all_returned.lock(), vec![10]);
    assert_eq!(grid.snapshot().total_count, 10);
    assert_eq!(grid.row_count(), 5);

    // Narrowing is answered from the held rows.
    let narrowed = Criteria::default()
        .with_tags(["vip"])
        .with_filter("score", ColumnFilter::new(FilterOperator::GreaterThan, 20))
        .with_sort(SortSpec::desc("score"));
    let outcome = grid.set_criteria(narrowed).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { rows: 3, total: 3 });
    assert_eq!(held_ids(&grid), vec!["r27", "r24", "r21"]);
    assert_eq!(ScriptedCollection::calls(&service.all_calls), 1);

    // Dropping the tag widens past the held rows and fetches again.
    let outcome = grid.set_criteria(Criteria::default()).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { rows: 5, total: 30 });
    assert_eq!(*service.all_returned.lock(), vec![10, 30]);
}

#[tokio::test]
async fn refresh_goes_back_to_the_service_in_full_set_mode() {
    let service = ScriptedCollection::numbered(5);
    let grid = GridRuntime::builder(service.clone())
        .initialize()
        .await
        .unwrap();
    assert_eq!(ScriptedCollection::calls(&service.all_calls), 1);

    grid.refresh().await.unwrap();
    assert_eq!(ScriptedCollection::calls(&service.all_calls), 2);
}

#[tokio::test]
async fn large_collections_use_the_paged_model() {
    let service = ScriptedCollection::numbered(50);
    let grid = paged_grid(&service, 10).await;

    assert_eq!(grid.model_kind(), RowModelKind::Paged);
    assert_eq!(grid.snapshot().model, Some(RowModelKind::Paged));
    assert_eq!(grid.row_count(), 10);
    assert_eq!(grid.snapshot().total_count, 50);
    assert!(grid.snapshot().has_more);
    assert_eq!(*service.page_requests.lock(), vec![(0, 10)]);
    assert_eq!(ScriptedCollection::calls(&service.all_calls), 0);
}

#[tokio::test]
async fn append_extends_and_replace_discards_held_rows() {
    let service = ScriptedCollection::numbered(50);
    let grid = paged_grid(&service, 10).await;

    let appended = grid.load_page(1, true).await.unwrap();
    assert_eq!(appended, LoadOutcome::Loaded { rows: 20, total: 50 });
    assert_eq!(held_ids(&grid).first().map(String::as_str), Some("r0"));
    assert_eq!(held_ids(&grid).last().map(String::as_str), Some("r19"));

    let replaced = grid.load_page(3, false).await.unwrap();
    assert_eq!(replaced, LoadOutcome::Loaded { rows: 10, total: 50 });
    let ids = held_ids(&grid);
    assert_eq!(ids.first().map(String::as_str), Some("r30"));
    assert_eq!(ids.len(), 10);
    assert_eq!(service.page_requests.lock().last(), Some(&(30, 40)));

    let first = grid.load_page(0, false).await.unwrap();
    assert_eq!(first, LoadOutcome::Loaded { rows: 10, total: 50 });
    let ids = held_ids(&grid);
    assert_eq!(ids.first().map(String::as_str), Some("r0"));
    assert_eq!(ids.last().map(String::as_str), Some("r9"));
    assert_eq!(grid.window().start, 0);
    assert_eq!(service.page_requests.lock().last(), Some(&(0, 10)));
}

#[tokio::test]
async fn failed_fetch_keeps_rows_and_reports_the_error() {
    let service = ScriptedCollection::numbered(50);
    let sink = RecordingSink::new();
    let grid = GridRuntime::builder(service.clone())
        .settings(paged_settings(10))
        .notifications(sink.clone())
        .initialize()
        .await
        .unwrap();

    service
        .fail_pages
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let err = grid.load_page(1, true).await.unwrap_err();

    assert!(matches!(err, GridError::LoadFailed(_)));
    assert_eq!(grid.row_count(), 10);
    let snapshot = grid.snapshot();
    assert!(snapshot.load_failed.is_some());
    assert!(!snapshot.loading);
    assert_eq!(sink.count(NoticeLevel::Error), 1);

    service
        .fail_pages
        .store(false, std::sync::atomic::Ordering::SeqCst);
    grid.refresh().await.unwrap();
    assert!(grid.snapshot().load_failed.is_none());
}

#[tokio::test]
async fn failed_first_page_still_yields_a_grid() {
    let service = ScriptedCollection::numbered(50);
    service
        .fail_pages
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let grid = paged_grid(&service, 10).await;

    assert_eq!(grid.row_count(), 0);
    assert!(grid.snapshot().load_failed.is_some());
}

#[tokio::test]
async fn scrolling_near_the_end_claims_one_next_page() {
    let service = ScriptedCollection::numbered(100);
    let grid = paged_grid(&service, 20).await;

    // 20 rows of 10px under a 100px viewport: the bottom window is rows 10..20.
    let next = grid.on_scroll(100.0).expect("window reaches the lookahead zone");
    assert!(grid.is_fetching());
    assert!(grid.on_scroll(100.0).is_none(), "a second claim must not fire");

    let outcome = grid.fetch_next(next).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { rows: 40, total: 100 });
    assert_eq!(service.page_requests.lock().last(), Some(&(20, 40)));

    // Rows 10..20 are now far from the end of 40 held rows.
    assert!(grid.on_scroll(100.0).is_none());
    assert_eq!(ScriptedCollection::calls(&service.page_calls), 2);

    let more = grid.scroll_to(200.0).await.unwrap();
    assert_eq!(more, Some(LoadOutcome::Loaded { rows: 60, total: 100 }));
}

#[tokio::test]
async fn repeated_scrolls_during_a_pending_fetch_claim_nothing() {
    let service = ScriptedCollection::numbered(200);
    let grid = paged_grid(&service, 20).await;
    for index in 1..5 {
        grid.load_page(index, true).await.unwrap();
    }
    assert_eq!(grid.row_count(), 100);
    let before = ScriptedCollection::calls(&service.page_calls);

    // Rows 85..95 of 100 are visible: within the 10-row lookahead of the end.
    let _gate = service.close_gate();
    let pending = {
        let grid = Arc::clone(&grid);
        tokio::spawn(async move { grid.scroll_to(850.0).await })
    };
    while ScriptedCollection::calls(&service.page_calls) == before {
        tokio::task::yield_now().await;
    }
    assert_eq!(grid.window().end, 95);
    assert!(grid.is_fetching());

    for _ in 0..5 {
        assert!(grid.on_scroll(850.0).is_none());
    }
    assert_eq!(ScriptedCollection::calls(&service.page_calls), before + 1);

    service.open_gate();
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, Some(LoadOutcome::Loaded { rows: 120, total: 200 }));
    assert_eq!(service.page_requests.lock().last(), Some(&(100, 120)));
    assert_eq!(ScriptedCollection::calls(&service.page_calls), before + 1);
}

#[tokio::test]
async fn nothing_is_fetched_once_every_row_is_held() {
    let service = ScriptedCollection::numbered(20);
    let grid = paged_grid(&service, 20).await;

    assert!(!grid.snapshot().has_more);
    assert!(grid.on_scroll(100.0).is_none());
    assert_eq!(ScriptedCollection::calls(&service.page_calls), 1);
}

#[tokio::test]
async fn aborted_load_is_discarded() {
    let service = ScriptedCollection::numbered(50);
    let grid = paged_grid(&service, 10).await;
    let _gate = service.close_gate();

    let pending = {
        let grid = Arc::clone(&grid);
        tokio::spawn(async move { grid.load_page(1, true).await })
    };
    while ScriptedCollection::calls(&service.page_calls) < 2 {
        tokio::task::yield_now().await;
    }
    assert!(grid.is_fetching());

    grid.abort();
    let outcome = pending.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Discarded);
    assert_eq!(ScriptedCollection::calls(&service.abort_calls), 1);
    assert_eq!(grid.row_count(), 10);
    assert!(!grid.snapshot().loading);
    assert!(!grid.is_fetching());
}

#[tokio::test]
async fn replace_supersedes_a_pending_append() {
    let service = ScriptedCollection::numbered(50);
    let grid = paged_grid(&service, 10).await;
    let _gate = service.close_gate();

    let append = {
        let grid = Arc::clone(&grid);
        tokio::spawn(async move { grid.load_page(1, true).await })
    };
    while ScriptedCollection::calls(&service.page_calls) < 2 {
        tokio::task::yield_now().await;
    }

    let narrowed = Criteria::default()
        .with_filter("score", ColumnFilter::new(FilterOperator::GreaterThan, 44));
    let release = async {
        tokio::task::yield_now().await;
        service.open_gate();
    };
    let (replaced, ()) = tokio::join!(grid.set_criteria(narrowed), release);

    assert_eq!(append.await.unwrap().unwrap(), LoadOutcome::Discarded);
    assert_eq!(replaced.unwrap(), LoadOutcome::Loaded { rows: 5, total: 5 });
    assert_eq!(held_ids(&grid), vec!["r45", "r46", "r47", "r48", "r49"]);
}
