//! Tool dispatch against mocked Improvado and Notion services

use actix_web::{test, web, App};
use improvado_mcp::auth::{
    AuthorizationEngine, CompleteAuthorizationOptions, CredentialVerifier,
    InMemoryAuthorizationEngine, SessionProps,
};
use improvado_mcp::mcp::{configure_routes, GatewayServer, ToolCall};
use improvado_mcp::routing::{ToolDispatcher, MISSING_API_KEY_MESSAGE};
use improvado_mcp::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.verification.base_url = server.uri();
    config.notion.base_url = format!("{}/v1", server.uri());
    config
}

fn dispatcher(server: &MockServer) -> ToolDispatcher {
    let config = config_for(server);
    let verifier = Arc::new(CredentialVerifier::from_config(&config.verification).unwrap());
    ToolDispatcher::new(&config, verifier).unwrap()
}

fn session(key: &str) -> SessionProps {
    SessionProps::with_api_key(key)
}

async fn mount_exchange(server: &MockServer, api_key: &str, notion_token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/gpt/verify"))
        .and(header("authorization", format!("Bearer {}", api_key).as_str()))
        .and(body_json(json!({ "provider": "notion" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "apiKey": notion_token })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_api_key_returns_warning_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    for call in [
        ToolCall::new("executeQuery", json!({ "query": "select 1" })),
        ToolCall::new("notion_retrieve_page", json!({ "page_id": "p1" })),
    ] {
        let result = dispatcher.invoke(&call, &SessionProps::default()).await.unwrap();
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.first_text(), MISSING_API_KEY_MESSAGE);
    }
}

#[tokio::test]
async fn test_query_error_body_surfaces_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/gpt/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .expect(1)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(&ToolCall::new("executeQuery", json!({ "query": "select 1" })), &session("k1"))
        .await
        .unwrap();
    assert_eq!(result.content.len(), 1);
    assert!(result.first_text().contains("boom"), "got: {}", result.first_text());
    assert!(result.first_text().starts_with("❌"));
}

#[tokio::test]
async fn test_execute_query_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/gpt/query"))
        .and(header("authorization", "Bearer k1"))
        .and(body_json(json!({ "query": "select count(*) from spend", "params": [] })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": [{ "count": 42 }] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(
            &ToolCall::new("executeQuery", json!({ "query": "select count(*) from spend" })),
            &session("k1"),
        )
        .await
        .unwrap();
    assert_eq!(
        result.first_text(),
        "Query result:\n[\n  {\n    \"count\": 42\n  }\n]"
    );
}

#[tokio::test]
async fn test_execute_query_reported_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/gpt/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "relation does not exist" })),
        )
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(
            &ToolCall::new("executeQuery", json!({ "query": "select * from nope", "params": [1] })),
            &session("k1"),
        )
        .await
        .unwrap();
    assert!(result.first_text().contains("relation does not exist"));
}

#[tokio::test]
async fn test_notion_call_exchanges_key_each_time() {
    let server = MockServer::start().await;
    mount_exchange(&server, "k1", "ntn_secret", 2).await;
    Mock::given(method("GET"))
        .and(path("/v1/pages/p1"))
        .and(header("authorization", "Bearer ntn_secret"))
        .and(header("notion-version", "2022-06-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "page",
            "id": "p1",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Q3 plan" }] }
            }
        })))
        .expect(2)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(&ToolCall::new("notion_retrieve_page", json!({ "page_id": "p1" })), &session("k1"))
        .await
        .unwrap();
    let body: Value = serde_json::from_str(result.first_text()).expect("json output by default");
    assert_eq!(body["id"], "p1");

    let result = dispatcher
        .invoke(
            &ToolCall::new("notion_retrieve_page", json!({ "page_id": "p1", "format": "markdown" })),
            &session("k1"),
        )
        .await
        .unwrap();
    assert!(result.first_text().starts_with("# Q3 plan"));
}

#[tokio::test]
async fn test_exchange_failure_makes_no_notion_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/gpt/verify"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "results": [] })))
        .expect(0)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(&ToolCall::new("notion_search", json!({ "query": "roadmap" })), &session("k1"))
        .await
        .unwrap();
    assert!(result.first_text().contains("Failed to verify Notion API key"));
    assert!(result.first_text().contains("401"));
}

#[tokio::test]
async fn test_notion_error_message_and_non_json_bodies() {
    let server = MockServer::start().await;
    mount_exchange(&server, "k1", "ntn", 3).await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find block with ID: missing."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/gateway"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream connect error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let text = dispatcher
        .invoke(&ToolCall::new("notion_retrieve_block", json!({ "block_id": "missing" })), &session("k1"))
        .await
        .unwrap();
    assert!(text.first_text().contains("Could not find block with ID: missing."));

    let text = dispatcher
        .invoke(&ToolCall::new("notion_retrieve_block", json!({ "block_id": "gateway" })), &session("k1"))
        .await
        .unwrap();
    assert!(text.first_text().contains("upstream connect error"));

    let text = dispatcher
        .invoke(&ToolCall::new("notion_retrieve_block", json!({ "block_id": "garbled" })), &session("k1"))
        .await
        .unwrap();
    assert!(text.first_text().contains("Failed to parse API response as JSON"));
}

#[tokio::test]
async fn test_pagination_arguments_pass_through() {
    let server = MockServer::start().await;
    mount_exchange(&server, "k1", "ntn", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/b1/children"))
        .and(query_param("start_cursor", "cursor-2"))
        .and(query_param("page_size", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [
                { "object": "block", "type": "paragraph", "paragraph": { "rich_text": [{ "plain_text": "Hello" }] } }
            ],
            "has_more": true,
            "next_cursor": "cursor-3"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let result = dispatcher
        .invoke(
            &ToolCall::new(
                "notion_retrieve_block_children",
                json!({ "block_id": "b1", "start_cursor": "cursor-2", "page_size": 25, "format": "markdown" }),
            ),
            &session("k1"),
        )
        .await
        .unwrap();
    assert!(result.first_text().starts_with("Hello"));
    assert!(result.first_text().contains("cursor-3"));
}

#[tokio::test]
async fn test_write_operations_send_expected_bodies() {
    let server = MockServer::start().await;
    mount_exchange(&server, "k1", "ntn", 2).await;
    Mock::given(method("PATCH"))
        .and(path("/v1/blocks/b1/children"))
        .and(body_json(json!({
            "children": [{ "object": "block", "type": "divider", "divider": {} }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "results": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(body_json(json!({
            "parent": { "database_id": "db1" },
            "properties": { "Name": { "title": [{ "text": { "content": "New" } }] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "page", "id": "p9" })))
        .expect(1)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    dispatcher
        .invoke(
            &ToolCall::new(
                "notion_append_block_children",
                json!({ "block_id": "b1", "children": [{ "object": "block", "type": "divider", "divider": {} }] }),
            ),
            &session("k1"),
        )
        .await
        .unwrap();

    let result = dispatcher
        .invoke(
            &ToolCall::new(
                "notion_create_database_item",
                json!({ "database_id": "db1", "properties": { "Name": { "title": [{ "text": { "content": "New" } }] } } }),
            ),
            &session("k1"),
        )
        .await
        .unwrap();
    assert!(result.first_text().contains("\"p9\""));
}

#[tokio::test]
async fn test_invalid_arguments_are_rejected_before_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dispatcher = dispatcher(&server);

    let err = dispatcher
        .invoke(&ToolCall::new("notion_retrieve_page", json!({ "page_id": 5 })), &session("k1"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "validation");

    let err = dispatcher
        .invoke(&ToolCall::new("notion_teleport", json!({})), &session("k1"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "unknown_tool");
}

#[actix_web::test]
async fn test_tools_call_over_json_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/gpt/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let engine = Arc::new(InMemoryAuthorizationEngine::new());
    let request = engine
        .parse_auth_request("response_type=code&client_id=c&redirect_uri=https%3A%2F%2Fc.example%2Fcb")
        .await
        .unwrap();
    let completed = engine
        .complete_authorization(CompleteAuthorizationOptions {
            scope: request.scope.clone(),
            request,
            user_id: "improvado_user_test".to_string(),
            label: "Improvado User".to_string(),
            props: session("k1"),
        })
        .await
        .unwrap();
    let code = url::Url::parse(&completed.redirect_to)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let dyn_engine: Arc<dyn AuthorizationEngine> = engine;
    let gateway = Arc::new(GatewayServer::from_config(&config, dyn_engine).unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/mcp")
        .insert_header(("Authorization", format!("Bearer {}", code)))
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": "call-1",
            "method": "tools/call",
            "params": { "name": "executeQuery", "arguments": { "query": "select 1" } }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], "call-1");
    assert!(body.get("error").is_none());
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert_eq!(body["result"]["content"][0]["type"], "text");
    assert!(text.contains("boom"));

    let req = test::TestRequest::post()
        .uri("/mcp/call")
        .insert_header(("Authorization", format!("Bearer {}", code)))
        .set_json(json!({ "name": "notion_search", "arguments": { "page_size": "ten" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
