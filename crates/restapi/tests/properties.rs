//! Routing and resource properties checked end to end.

use http::StatusCode;
use restapi::prelude::*;
use restapi::router::path;
use restapi_test::{MemoryRepository, TestClient};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Foo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    foo: i64,
}

impl ExternalId<u64> for Foo {
    fn external_id(&self) -> Option<u64> {
        self.id
    }

    fn set_external_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

#[derive(Serialize, Deserialize)]
struct FooDto {
    foo: i64,
}

fn named(name: &'static str) -> impl Handler {
    handler_fn(move |_req: Request| async move { Response::new(full(name)) })
}

/// Answers with `current` and `path_left` joined.
fn cursor() -> impl Handler {
    handler_fn(|req: Request| async move {
        let joined = RoutingContext::get(req.extensions())
            .map(RoutingContext::full_path)
            .unwrap_or_default();
        Response::new(full(joined))
    })
}

#[tokio::test]
async fn test_cursor_covers_request_path() {
    let inner = Router::new();
    inner.get("/:id/posts", cursor());
    inner.handle("/files/", cursor());

    let router = Router::new();
    router.get("/users/:id", cursor());
    router.mount("/assets", cursor());
    router.mount("/api", inner);
    let client = TestClient::new(router);

    for request_path in [
        "/users/42",
        "/users/42/",
        "/assets/css/site.css",
        "/assets/./img/../logo.png",
        "/api/7/posts",
        "/api/files/a/b",
    ] {
        let response = client.get(request_path).send().await;
        response.assert_status(StatusCode::OK);
        response.assert_body_eq(path::clean(&path::canonical(request_path)));
    }
}

#[tokio::test]
async fn test_fixed_beats_dynamic_at_every_depth() {
    let router = Router::new();
    router.get("/a/:x/c", named("dynamic"));
    router.get("/a/b/c", named("fixed"));
    router.get("/a/:x", named("dynamic-short"));
    router.get("/a/b", named("fixed-short"));
    let client = TestClient::new(router);

    client.get("/a/b/c").send().await.assert_body_eq("fixed");
    client.get("/a/b").send().await.assert_body_eq("fixed-short");
    client.get("/a/z/c").send().await.assert_body_eq("dynamic");
    client.get("/a/z").send().await.assert_body_eq("dynamic-short");
}

#[tokio::test]
async fn test_method_beats_default() {
    let router = Router::new();
    router.mount("/foos", named("default"));
    router.get("/foos", named("get"));
    let client = TestClient::new(router);

    client.get("/foos").send().await.assert_body_eq("get");
    client.post("/foos").send().await.assert_body_eq("default");
    client.get("/foos/1").send().await.assert_body_eq("get");
    client.delete("/foos/1").send().await.assert_body_eq("default");
}

#[tokio::test]
async fn test_show_returns_created_entity() {
    let repo = MemoryRepository::sequential();
    let router = Router::new();
    router.resource("/foos", Resource::<Foo, u64>::new().with_crud(repo));
    let client = TestClient::new(router);

    for value in [0, -7, 42, i64::MAX] {
        let created: Foo = client
            .post("/foos")
            .json(&json!({ "foo": value }))
            .send()
            .await
            .json()
            .unwrap();
        let id = created.id.unwrap();

        let shown: Foo = client
            .get(format!("/foos/{id}"))
            .send()
            .await
            .json()
            .unwrap();
        assert_eq!(shown, Foo { id: Some(id), foo: value });
    }
}

#[tokio::test]
async fn test_response_mirrors_request_type() {
    let repo = MemoryRepository::sequential();
    let client = TestClient::new(Resource::<Foo, u64>::new().with_crud(repo));

    let form = client
        .post("/")
        .content_type("application/x-www-form-urlencoded")
        .body("foo=7")
        .send()
        .await;
    form.assert_status(StatusCode::CREATED);
    form.assert_content_type("application/x-www-form-urlencoded");
    form.assert_body_eq("id=1&foo=7");

    let lines = client
        .post("/")
        .content_type("application/x-ndjson")
        .body("{\"foo\":8}\n")
        .send()
        .await;
    lines.assert_status(StatusCode::CREATED);
    lines.assert_content_type("application/x-ndjson");
    assert_eq!(lines.json_lines::<Foo>().unwrap(), vec![Foo { id: Some(2), foo: 8 }]);

    let json = client
        .post("/")
        .content_type("application/json")
        .body(r#"{"foo":9}"#)
        .send()
        .await;
    json.assert_content_type("application/json");
}

#[tokio::test]
async fn test_oversized_body_never_mapped() {
    let mapped = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&mapped);
    let mapping = Dto::new(
        |_ctx: &RequestContext, foo: Foo| Ok(FooDto { foo: foo.foo }),
        move |_ctx: &RequestContext, dto: FooDto| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Foo { id: None, foo: dto.foo })
        },
    );

    let body = r#"{"foo":1}"#;
    let resource = Resource::<Foo, u64>::mapped(mapping)
        .body_read_limit(body.len())
        .create(|_ctx: RequestContext, foo: Foo| async move { Ok::<_, RepositoryError>(foo) });
    let client = TestClient::new(resource);

    client
        .post("/")
        .json(&json!({ "foo": 12 }))
        .send()
        .await
        .assert_problem(ErrorKind::RequestEntityTooLarge);
    assert_eq!(mapped.load(Ordering::SeqCst), 0);

    client
        .post("/")
        .content_type("application/json")
        .body(body)
        .send()
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(mapped.load(Ordering::SeqCst), 1);
}
