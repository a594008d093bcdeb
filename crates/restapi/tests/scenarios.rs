//! End-to-end scenarios for a `/foos` resource and a `/users` router.
//!
//! Every request goes through a root [`Router`] exactly as a hyper
//! connection would deliver it, only without the network.

use http::StatusCode;
use restapi::prelude::*;
use restapi_test::{MemoryRepository, TestClient};
use serde::{Deserialize, Serialize};
use serde_json::json;

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

fn foos_app(limit: Option<usize>) -> (TestClient, MemoryRepository<Foo, u64>) {
    let repo = MemoryRepository::sequential();
    let mut foos = Resource::<Foo, u64>::new().with_crud(repo.clone());
    if let Some(limit) = limit {
        foos = foos.body_read_limit(limit);
    }

    let router = Router::new();
    router.resource("/foos", foos);
    (TestClient::new(router), repo)
}

/// Echoes the routing state a handler observes.
fn probe(name: &'static str) -> impl Handler {
    handler_fn(move |req: Request| async move {
        let routing = RoutingContext::get(req.extensions()).cloned();
        let body = json!({
            "handler": name,
            "params": path_params(req.extensions()),
            "current": routing.as_ref().map(RoutingContext::current),
            "path_left": routing.as_ref().map(RoutingContext::path_left),
        });
        Response::with_body(StatusCode::OK, mime::APPLICATION_JSON, full(body.to_string()))
    })
}

fn problem_type(response: &restapi_test::TestResponse) -> String {
    response.json_value().unwrap()["type"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_list_empty_store() {
    let (client, _) = foos_app(None);

    let response = client
        .get("/foos")
        .accept("application/json")
        .send()
        .await;

    response.assert_status(StatusCode::OK);
    response.assert_header("content-type", "application/json");
    response.assert_body_eq("[]");
}

#[tokio::test]
async fn test_create_assigns_id() {
    let (client, repo) = foos_app(None);

    let response = client
        .post("/foos")
        .accept("application/json")
        .content_type("application/json")
        .body(r#"{"foo":42}"#)
        .send()
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Foo = response.json().unwrap();
    assert!(created.id.is_some());
    assert_eq!(created.foo, 42);
    assert_eq!(repo.snapshot(), vec![created]);
}

#[tokio::test]
async fn test_malformed_id() {
    let (client, _) = foos_app(None);

    let response = client.get("/foos/ABC").send().await;

    response.assert_problem(ErrorKind::MalformedId);
    assert!(problem_type(&response).ends_with("malformed-id-in-path"));
}

#[tokio::test]
async fn test_missing_entity() {
    let (client, _) = foos_app(None);

    let response = client.get("/foos/999").send().await;

    response.assert_problem(ErrorKind::EntityNotFound);
    assert!(problem_type(&response).ends_with("entity-not-found"));
}

#[tokio::test]
async fn test_body_over_limit() {
    let (client, repo) = foos_app(Some(3));

    let response = client
        .post("/foos")
        .content_type("application/json")
        .body("1234")
        .send()
        .await;

    response.assert_problem(ErrorKind::RequestEntityTooLarge);
    assert!(problem_type(&response).ends_with("request-entity-too-large"));
    assert!(repo.is_empty());
}

#[tokio::test]
async fn test_params_and_path_left() {
    let router = Router::new();
    router.get("/users/:id/posts", probe("posts"));
    let client = TestClient::new(router);

    let response = client.get("/users/42/posts").send().await;

    response.assert_status(StatusCode::OK);
    response.assert_json_field("params.id", &json!("42"));
    response.assert_json_field("path_left", &json!("/"));
    response.assert_json_field("current", &json!("/users/42/posts"));
}

#[tokio::test]
async fn test_fixed_and_dynamic_siblings() {
    let router = Router::new();
    router.get("/users/:id", probe("dynamic"));
    router.get("/users/me", probe("fixed"));
    let client = TestClient::new(router);

    let me = client.get("/users/me").send().await;
    me.assert_json_field("handler", &json!("fixed"));
    me.assert_json_field("params", &json!({}));

    let seven = client.get("/users/7").send().await;
    seven.assert_json_field("handler", &json!("dynamic"));
    seven.assert_json_field("params.id", &json!("7"));
}

#[tokio::test]
async fn test_crud_lifecycle() {
    let (client, repo) = foos_app(None);

    for foo in [1, 2, 1] {
        client
            .post("/foos")
            .json(&json!({ "foo": foo }))
            .send()
            .await
            .assert_status(StatusCode::CREATED);
    }

    let ones: Vec<Foo> = client
        .get("/foos?foo=1")
        .accept("application/x-ndjson")
        .send()
        .await
        .json_lines()
        .unwrap();
    assert_eq!(ones.len(), 2);

    client
        .put("/foos/2")
        .json(&json!({ "foo": 20 }))
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT);
    client
        .get("/foos/2")
        .send()
        .await
        .assert_json_eq(&json!({ "id": 2, "foo": 20 }));

    client
        .put("/foos/9")
        .json(&json!({ "foo": 0 }))
        .send()
        .await
        .assert_problem(ErrorKind::EntityNotFound);

    client
        .delete("/foos/2")
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT);
    client
        .delete("/foos/2")
        .send()
        .await
        .assert_problem(ErrorKind::EntityNotFound);

    client
        .delete("/foos?foo=1")
        .send()
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(repo.is_empty());
}

#[tokio::test]
async fn test_unknown_paths_and_methods() {
    let (client, _) = foos_app(None);

    client
        .get("/bars")
        .send()
        .await
        .assert_problem(ErrorKind::PathNotFound);

    let response = client
        .request(http::Method::OPTIONS, "/foos/1")
        .send()
        .await;
    response.assert_problem(ErrorKind::MethodNotAllowed);
    response.assert_header("allow", "GET, PUT, PATCH, DELETE");
}

#[tokio::test]
async fn test_nested_resources_see_parent_id() {
    let bars = Resource::<Foo, u64>::new()
        .with_id_context_key("bar")
        .show(|ctx: RequestContext, id: u64| async move {
            let parent = ctx.id::<u64>("foo").ok_or(RepositoryError::NotFound)?;
            Ok::<_, RepositoryError>(Foo {
                id: Some(id),
                foo: i64::try_from(parent).unwrap_or_default(),
            })
        });
    let foos = Resource::<Foo, u64>::new()
        .with_id_context_key("foo")
        .sub_routes({
            let router = Router::new();
            router.resource("/bars", bars);
            router
        });

    let router = Router::new();
    router.resource("/foos", foos);
    let client = TestClient::new(router);

    client
        .get("/foos/5/bars/6")
        .send()
        .await
        .assert_json_eq(&json!({ "id": 6, "foo": 5 }));
}
