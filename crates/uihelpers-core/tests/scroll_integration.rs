//! Scroll search tests against the scripted driver.

mod common;

use std::time::Duration;

use tokio::time::Instant;

use common::{el, ElementExt, FakeDriver, Trigger};
use uihelpers_core::element::{ElementRef, ElementType, Point, UIElement};
use uihelpers_core::error::HelperError;
use uihelpers_core::scroll::{scroll_to_element, ScrollDirection, ScrollPolicy};

/// A 390x600 collection view whose centre is (195, 400).
fn gallery() -> Vec<UIElement> {
    vec![el("photos", ElementType::CollectionView)
        .with_frame(0.0, 100.0, 390.0, 600.0)
        .with_children(vec![
            el("photo-1", ElementType::Cell),
            el("photo-2", ElementType::Cell),
        ])]
}

fn container() -> ElementRef {
    ElementRef::identifier("photos").of_type(ElementType::CollectionView)
}

fn cell(id: &str) -> ElementRef {
    ElementRef::identifier(id).of_type(ElementType::Cell)
}

#[tokio::test(start_paused = true)]
async fn test_target_revealed_after_three_drags() {
    common::init_tracing();
    let driver = FakeDriver::new(gallery());
    driver.reveal(Trigger::AfterDrags(3), Some("photos"), el("photo-40", ElementType::Cell));

    let report = scroll_to_element(&driver, &container(), &cell("photo-40"), ScrollPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.drags, 3);
    let drags = driver.drags();
    assert_eq!(drags.len(), 3);
    for (from, to) in drags {
        assert_eq!(from, Point::new(195.0, 400.0));
        assert_eq!(to, Point::new(195.0, 150.0));
    }
}

#[tokio::test(start_paused = true)]
async fn test_visible_target_needs_no_drags() {
    let driver = FakeDriver::new(gallery());
    let report = scroll_to_element(&driver, &container(), &cell("photo-2"), ScrollPolicy::default())
        .await
        .unwrap();
    assert_eq!(report.drags, 0);
    assert!(driver.gestures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_covered_target_still_scrolls() {
    let driver = FakeDriver::new(vec![el("photos", ElementType::CollectionView)
        .with_frame(0.0, 100.0, 390.0, 600.0)
        .with_children(vec![el("photo-9", ElementType::Cell).not_hittable()])]);
    driver.schedule(Trigger::AfterDrags(1), common::Change::MakeHittable("photo-9".into()));

    let report = scroll_to_element(&driver, &container(), &cell("photo-9"), ScrollPolicy::default())
        .await
        .unwrap();
    assert_eq!(report.drags, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_target_stops_at_iteration_cap() {
    let driver = FakeDriver::new(gallery());
    let start = Instant::now();

    let err = scroll_to_element(&driver, &container(), &cell("photo-999"), ScrollPolicy::default())
        .await
        .unwrap_err();

    match err {
        HelperError::ScrollExhausted { target, iterations } => {
            assert_eq!(target, "Cell 'photo-999'");
            assert_eq!(iterations, 50);
        }
        other => panic!("expected ScrollExhausted, got {other:?}"),
    }
    assert_eq!(driver.drags().len(), 50);
    // One probe timeout per drag.
    assert_eq!(start.elapsed(), Duration::from_secs(50));
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_limit_ends_search_early() {
    let driver = FakeDriver::new(gallery());
    let policy = ScrollPolicy {
        max_elapsed: Some(Duration::from_secs(5)),
        ..ScrollPolicy::default()
    };

    let err = scroll_to_element(&driver, &container(), &cell("photo-999"), policy)
        .await
        .unwrap_err();
    assert!(matches!(err, HelperError::ScrollExhausted { iterations: 5, .. }), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn test_horizontal_scroll_vector() {
    let driver = FakeDriver::new(gallery());
    driver.reveal(Trigger::AfterDrags(1), Some("photos"), el("photo-next", ElementType::Cell));
    let policy = ScrollPolicy {
        direction: ScrollDirection::Right(120.0),
        ..ScrollPolicy::default()
    };

    scroll_to_element(&driver, &container(), &cell("photo-next"), policy)
        .await
        .unwrap();
    assert_eq!(driver.drags(), vec![(Point::new(195.0, 400.0), Point::new(75.0, 400.0))]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_container_is_reported() {
    let driver = FakeDriver::new(vec![el("root", ElementType::Other)]);
    let err = scroll_to_element(
        &driver,
        &ElementRef::identifier("feed").of_type(ElementType::Table),
        &cell("post-3"),
        ScrollPolicy::default(),
    )
    .await
    .unwrap_err();

    match err {
        HelperError::ElementMissing { target, operation } => {
            assert_eq!(target, "Table 'feed'");
            assert_eq!(operation, "scroll");
        }
        other => panic!("expected ElementMissing, got {other:?}"),
    }
    assert!(driver.gestures().is_empty());
}
