//! End-to-end search flows against an in-memory catalog.

use std::time::Duration;

use market_search::prelude::*;
use serde_json::json;

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new((1..=25).map(|id| {
        let category = if id % 2 == 0 { "Electronics" } else { "Fashion" };
        json!({
            "id": id,
            "name": format!("Item {id}"),
            "description": if id == 7 { "canvas shoe" } else { "plain" },
            "price": id * 10_000,
            "currency": "NGN",
            "category": category,
            "images": [format!("https://cdn.example/{id}.jpg")],
            "ads": [{ "id": format!("ad-{id}"), "is_promoted": id == 25, "views": id }],
            "shops": { "name": "Shop", "location": if id <= 5 { "Kano" } else { "Lagos" } },
        })
    }))
}

#[test]
fn scenario_a_text_only_compiles_with_default_price_bounds() {
    let state = FilterState::new().with_query("shoe");
    let request = compile(&state, PAGE_SIZE);

    assert_eq!(request.text.as_deref(), Some("shoe"));
    assert_eq!(request.categories, None);
    assert_eq!(request.location, None);
    assert_eq!(request.price_min, 0);
    assert_eq!(request.price_max, 10_000_000);
    assert!(request
        .predicates()
        .iter()
        .any(|p| matches!(p, Predicate::Gte { field: Field::Price, value: 0 })));
}

#[test]
fn scenario_b_clearing_text_drops_q_param() {
    let mut state = FilterState::new().with_query("phone");
    state.toggle_category("Electronics");
    state.toggle_category("Fashion");
    state.set_query_text("");

    assert_eq!(to_query_string(&state), "categories=Electronics,Fashion");
}

#[test]
fn scenario_c_changed_min_keeps_both_price_params() {
    let state = FilterState::new().with_price_range(PriceRange::new(500_000, 10_000_000));
    assert_eq!(
        to_query_string(&state),
        "minPrice=500000&maxPrice=10000000"
    );
}

#[test]
fn url_round_trip_preserves_state() {
    let state = FilterState::new()
        .with_query("red & blue")
        .with_category("Home, Garden")
        .with_category("Tools")
        .with_price_range(PriceRange::new(2_000, 90_000))
        .with_location("Port Harcourt")
        .with_page(4);

    let decoded = from_query_string(&to_query_string(&state));
    assert_eq!(decoded, state);
}

#[tokio::test]
async fn driver_filters_and_paginates() {
    let session = SearchSession::new(SearchConfig::default(), "?categories=Fashion");
    let mut driver = SearchDriver::new(session, catalog());

    assert_eq!(driver.start().await, Some(Completion::Applied));
    let view = driver.session().view();
    assert_eq!(view.render, RenderState::Results);
    assert_eq!(view.pagination.total, 13);
    assert_eq!(view.items.len(), 12);
    assert!(view.pagination.has_more);
    assert_eq!(view.items[0].id.as_str(), "25");
    assert!(view.items[0].is_promoted());
    assert_eq!(view.items[0].seller.location, "Lagos");

    driver.dispatch(SearchEvent::NextPage).await;
    let view = driver.session().view();
    assert_eq!(view.items.len(), 1);
    assert!(!view.pagination.has_more);
    assert_eq!(view.href, "/search?categories=Fashion&page=2");

    driver
        .dispatch(SearchEvent::CommitLocation("kano".into()))
        .await;
    let view = driver.session().view();
    assert_eq!(view.pagination.page, 1);
    assert_eq!(view.pagination.total, 3);
}

#[tokio::test]
async fn driver_reports_no_results() {
    let session = SearchSession::new(SearchConfig::default(), "");
    let mut driver = SearchDriver::new(session, catalog());

    assert_eq!(driver.start().await, None);
    assert_eq!(driver.session().view().render, RenderState::Initial);

    driver
        .dispatch(SearchEvent::CommitLocation("Nowhere".into()))
        .await;
    let view = driver.session().view();
    assert_eq!(view.render, RenderState::NoResults);
    assert_eq!(view.chips.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn typing_settles_into_a_single_fetch() {
    let session = SearchSession::new(SearchConfig::default(), "");
    let mut driver = SearchDriver::new(session, catalog());

    for text in ["s", "sh", "sho", "shoe"] {
        assert_eq!(driver.dispatch(SearchEvent::TextInput(text.into())).await, None);
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert_eq!(driver.session().status(), SearchStatus::Idle);

    assert_eq!(driver.settle().await, Some(Completion::Applied));
    let session = driver.session_mut();
    assert_eq!(session.state().query_text(), "shoe");
    let ids: Vec<&str> = session.items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["7"]);

    let update = session.take_url_update().expect("url rewrite");
    assert_eq!(update.href, "/search?q=shoe");
    assert_eq!(update.mode, HistoryMode::Replace);
}

#[tokio::test]
async fn store_subscribers_see_committed_filters() {
    let session = SearchSession::new(SearchConfig::default(), "");
    let mut rx = session.store().subscribe();
    let mut driver = SearchDriver::new(session, catalog());

    driver
        .dispatch(SearchEvent::ToggleCategory("Electronics".into()))
        .await;

    rx.changed().await.expect("store alive");
    assert_eq!(rx.borrow().categories(), &["Electronics".to_string()]);
}

#[tokio::test]
async fn overlapping_fetches_resolve_to_latest() {
    let catalog = catalog();
    let mut session = SearchSession::new(SearchConfig::default(), "");
    let now = tokio::time::Instant::now();

    let first = session
        .handle(SearchEvent::ToggleCategory("Fashion".into()), now)
        .into_fetch()
        .expect("fetch");
    let second = session
        .handle(SearchEvent::CommitLocation("Kano".into()), now)
        .into_fetch()
        .expect("fetch");

    let (first_page, second_page) = futures::join!(
        catalog.query(&first.request),
        catalog.query(&second.request)
    );

    assert_eq!(session.complete(second.ticket, second_page), Completion::Applied);
    assert_eq!(session.complete(first.ticket, first_page), Completion::Discarded);
    assert_eq!(session.pagination().total, 3);
}
