// ==========================================
// HTTP 路由集成测试
// ==========================================
// 测试目标: 路由 → API → 仓储 全链路；错误体 {code, message, details}
// ==========================================


use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use order_manager::app::build_router;
use order_manager::logging;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use test_helpers::{create_test_state, english_csv, sample_lines};
use tower::ServiceExt;

const BOUNDARY: &str = "order-manager-test-boundary";

fn test_app() -> (NamedTempFile, Router) {
    logging::init_test();
    let (temp_file, state) = create_test_state();
    (temp_file, build_router(state))
}

fn multipart_body(file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(file_name: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(file_name, content)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_temp_file, app) = test_app();
    let (status, body) = send(&app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_upload_csv() {
    let (_temp_file, app) = test_app();

    let csv = english_csv(',', &sample_lines());
    let (status, body) = send_json(&app, upload_request("pedidos.csv", csv.as_bytes())).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["summary"]["imported"], 3);
    assert_eq!(body["summary"]["duplicated"], 0);

    let (status, orders) = send_json(&app, get_request("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(3));

    let (status, batches) = send_json(&app, get_request("/api/import/batches?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batches[0]["file_name"], "pedidos.csv");
}

#[tokio::test]
async fn test_upload_rejects_non_csv() {
    let (_temp_file, app) = test_app();

    let (status, body) = send_json(&app, upload_request("pedidos.xlsx", b"anything")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_FILE");
}

#[tokio::test]
async fn test_upload_missing_columns() {
    let (_temp_file, app) = test_app();

    let csv = "Order Number,Buyer Name\n1001,Ana\n";
    let (status, body) = send_json(&app, upload_request("pedidos.csv", csv.as_bytes())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "MISSING_COLUMNS");
    let columns = body["details"]["columns"].as_array().unwrap();
    assert!(columns.iter().any(|c| c == "Email"));
}

#[tokio::test]
async fn test_group_full_returns_conflict() {
    let (_temp_file, app) = test_app();

    for i in 1..=6 {
        let (status, _) = send_json(
            &app,
            json_request(
                "POST",
                "/api/orders",
                json!({
                    "order_id": format!("PED{:03}", i),
                    "customer_name": "Ana Lima",
                    "product_name": "Camiseta G",
                    "size": "G",
                    "freight_type": "STANDARD",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, group) = send_json(
        &app,
        json_request("POST", "/api/groups", json!({ "name": "Grupo 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = group["group_id"].as_i64().unwrap();

    let ids: Vec<String> = (1..=5).map(|i| format!("PED{:03}", i)).collect();
    let (status, moved) = send_json(
        &app,
        json_request(
            "POST",
            "/api/orders/batch/move",
            json!({ "group_id": group_id, "order_ids": ids }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["moved"].as_array().map(Vec::len), Some(5));

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            &format!("/api/groups/{}/orders", group_id),
            json!({ "order_id": "PED006" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "GROUP_FULL");
    assert_eq!(body["details"]["capacity"], 5);
}

#[tokio::test]
async fn test_unknown_order_returns_not_found() {
    let (_temp_file, app) = test_app();

    let (status, body) = send_json(&app, get_request("/api/orders/PED404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_export_headers() {
    let (_temp_file, app) = test_app();

    let csv = english_csv(',', &sample_lines());
    let (status, _) = send(&app, upload_request("pedidos.csv", csv.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);

    let resp = app.clone().oneshot(get_request("/api/export")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment; filename=\"orders_"));

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("TYPE,ORDER_ID,CUSTOMER,PRODUCT,SIZE,FREIGHT,GROUP,SHIPPED,DATE")
    );
    // 无分组：只有 1001 的两件加急商品
    assert_eq!(lines.count(), 2);
}
