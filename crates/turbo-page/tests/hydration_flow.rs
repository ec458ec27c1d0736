//! Server render to client hydration.

mod common;

use common::*;
use edge_data::StaticFetcher;
use turbo_page::prelude::*;
use turbo_page::{HydrationChannel, PagePhase, PreloadCache};

#[tokio::test]
async fn test_server_render_publishes_state() {
    let fetcher = StaticFetcher::new();
    let (context, response) = server_context(&fetcher, "/products");
    let page = TestPage {
        data_patch: Some(json!({"title": "Summer sale"})),
        ..TestPage::new().with_defaults(json!({"count": 1}))
    };
    let calls = page.calls.clone();
    let ctl = PageController::new(page, Location::new("/products"), context.clone());

    let view = ctl.init().await.unwrap().into_view().unwrap();

    assert!(view.contains("Summer sale"));
    assert_eq!(
        calls.list(),
        vec![
            "should_server_render",
            "get_initial_state",
            "should_component_create",
            "component_will_create",
        ]
    );
    assert_eq!(response.status(), http::StatusCode::OK);

    let json = context.hydration().to_json().unwrap();
    assert!(json.contains("Summer sale"));
    assert!(context.hydration().is_pending());
}

#[tokio::test]
async fn test_client_fast_path_reuses_server_state() {
    let env = ClientEnvironment::new();
    let fetcher = StaticFetcher::new().with_resource("/static/x.css", "a{}");
    let context = client_context(&fetcher, &env)
        .with_scope(hydrated_scope(json!({"title": "Summer sale", "count": 9})));
    let page = TestPage {
        preload: PreloadManifest::new().with("a", "/x.css"),
        ..TestPage::new().with_defaults(json!({"count": 0}))
    };
    let calls = page.calls.clone();
    let ctl = PageController::new(page, Location::new("/products"), context.clone());

    let outcome = ctl.init().await.unwrap();

    assert!(outcome.is_rendered());
    assert_eq!(calls.list(), vec!["state_did_reuse"]);
    assert!(fetcher.requests().is_empty());
    assert_eq!(ctl.subscription_count(), 1);
    assert_eq!(ctl.phase(), PagePhase::ClientReady);

    let state = ctl.store().unwrap().get_state();
    assert_eq!(state["title"], json!("Summer sale"));
    assert_eq!(state["count"], json!(9));
    assert!(!context.hydration().is_pending());
}

#[tokio::test]
async fn test_hydration_consumed_by_one_controller() {
    let env = ClientEnvironment::new();
    let context = client_context(&StaticFetcher::new(), &env)
        .with_scope(hydrated_scope(json!({"title": "from server"})));

    let first_page = TestPage::new();
    let first_calls = first_page.calls.clone();
    let first = PageController::new(first_page, Location::new("/a"), context.clone());
    first.init().await.unwrap();

    let second_page = TestPage::new();
    let second_calls = second_page.calls.clone();
    let second = PageController::new(second_page, Location::new("/b"), context);
    second.init().await.unwrap();

    assert!(first_calls.contains("state_did_reuse"));
    assert!(!second_calls.contains("state_did_reuse"));
    assert!(second_calls.contains("get_initial_state"));
    assert!(second.store().unwrap().get_state().get("title").is_none());
}

#[tokio::test]
async fn test_server_does_not_consume_hydration() {
    let fetcher = StaticFetcher::new();
    let (context, _response) = server_context(&fetcher, "/products");
    context.hydration().set(object(json!({"stale": true})));
    let page = TestPage::new();
    let calls = page.calls.clone();

    PageController::new(page, Location::new("/products"), context.clone())
        .init()
        .await
        .unwrap();

    assert!(calls.contains("get_initial_state"));
    let published = context.hydration().peek_and_clear().unwrap();
    assert!(published.get("stale").is_none());
}

#[tokio::test]
async fn test_round_trip_through_embedded_json() {
    let fetcher = StaticFetcher::new().with_resource("http://localhost:3000/static/x.css", "a{}\r\n");
    let (server, _response) = server_context(&fetcher, "/products");
    let page = TestPage {
        data_patch: Some(json!({"title": "</script><b>"})),
        preload: PreloadManifest::new().with("a", "/x.css"),
        ..TestPage::new()
    };
    PageController::new(page, Location::new("/products"), server.clone())
        .init()
        .await
        .unwrap();

    let embedded_state = server.hydration().to_json().unwrap();
    let embedded_preload = serde_json::to_string(server.preload()).unwrap();
    assert!(!embedded_state.contains("</script>"));

    let env = ClientEnvironment::new();
    let scope = RequestScope::new()
        .with_hydration(HydrationChannel::from_json(&embedded_state).unwrap())
        .with_preload(serde_json::from_str::<PreloadCache>(&embedded_preload).unwrap());
    let client_fetcher = StaticFetcher::new();
    let client = client_context(&client_fetcher, &env).with_scope(scope);
    let page = TestPage {
        preload: PreloadManifest::new().with("a", "/x.css"),
        ..TestPage::new()
    };
    let ctl = PageController::new(page, Location::new("/products"), client.clone());

    ctl.init().await.unwrap();

    assert_eq!(ctl.store().unwrap().get_state()["title"], json!("</script><b>"));
    assert_eq!(client.preload().get("a").as_deref(), Some("a{}\n"));
    assert_eq!(client.preload().etag("a"), server.preload().etag("a"));
    assert!(client_fetcher.requests().is_empty());
}
