//! API tests for tasks, clients and the dashboard

mod common;

use axum::http::{Method, StatusCode};
use common::{json_request, request, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_task_visibility_follows_role() {
    let ctx = TestContext::new().await;
    ctx.create_task("Finance for A", "Finance", Some("e.williams")).await;
    ctx.create_task("Finance for B", "Finance", Some("k.patel")).await;
    ctx.create_task("Marketing", "Marketing", Some("s.green")).await;

    let expectations = [("admin", 3), ("l.chen", 2), ("e.williams", 1), ("s.green", 1)];
    for (username, expected) in expectations {
        let token = ctx.login(username).await;
        let (status, body) = ctx.send(request(Method::GET, "/tasks", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), expected, "{}", username);
    }
}

#[tokio::test]
async fn test_list_filters_from_query_string() {
    let ctx = TestContext::new().await;
    ctx.create_task("Invoice run", "Finance", None).await;
    ctx.create_task("Brochure", "Marketing", None).await;
    let admin = ctx.login("admin").await;

    let (status, body) = ctx
        .send(request(
            Method::GET,
            "/tasks?search=invoice&status=&department=Finance",
            Some(&admin),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Invoice run");

    let (status, body) = ctx
        .send(request(Method::GET, "/tasks?status=finished", Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_staff_status_update_scenario() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("T1", "Finance", Some("e.williams")).await;
    let staff_a = ctx.login("e.williams").await;
    let staff_b = ctx.login("k.patel").await;
    let uri = format!("/tasks/{}/status", task);

    let (status, _) = ctx
        .send(json_request(Method::POST, &uri, Some(&staff_b), json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(json_request(Method::POST, &uri, Some(&staff_a), json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = ctx
        .send(json_request(Method::POST, &uri, Some(&staff_a), json!({ "status": "done" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_staff_cannot_create_edit_or_delete() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("Own", "Finance", Some("e.williams")).await;
    let staff = ctx.login("e.williams").await;
    let uri = format!("/tasks/{}", task);
    let body = json!({ "title": "Renamed", "department": "Finance" });

    let (status, _) = ctx
        .send(json_request(Method::POST, "/tasks", Some(&staff), body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(Method::PUT, &uri, Some(&staff), body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(request(Method::DELETE, &uri, Some(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.send(request(Method::GET, &uri, Some(&staff))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Own");
    assert!(body["attachments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_staff_denied_before_field_limits_apply() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("Own", "Finance", Some("e.williams")).await;
    let staff = ctx.login("e.williams").await;
    let admin = ctx.login("admin").await;
    let long_title = json!({ "title": "x".repeat(201), "department": "Finance" });

    let (status, _) = ctx
        .send(json_request(Method::POST, "/tasks", Some(&staff), long_title.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(
            Method::PUT,
            &format!("/tasks/{}", task),
            Some(&staff),
            long_title.clone(),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let long_client = json!({
        "company_name": "x".repeat(201),
        "contact_name": "Someone",
        "contact_email": "someone@example.com"
    });
    let (status, _) = ctx
        .send(json_request(Method::POST, "/clients", Some(&staff), long_client.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The limits still hold for callers who may write
    let (status, body) = ctx
        .send(json_request(Method::POST, "/tasks", Some(&admin), long_title))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = ctx
        .send(json_request(Method::POST, "/clients", Some(&admin), long_client))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "company_name");
}

#[tokio::test]
async fn test_out_of_scope_task_is_not_found() {
    let ctx = TestContext::new().await;
    let marketing = ctx.create_task("Brochure", "Marketing", None).await;
    let manager = ctx.login("l.chen").await;

    let (status, body) = ctx
        .send(request(Method::GET, &format!("/tasks/{}", marketing), Some(&manager)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn test_manager_edit_and_delete() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("Draft", "Finance", None).await;
    let manager = ctx.login("l.chen").await;
    let assignee = ctx.user_id("k.patel").await;
    let uri = format!("/tasks/{}", task);

    let (status, body) = ctx
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&manager),
            json!({
                "title": "Final",
                "department": "Finance",
                "priority": "urgent",
                "assigned_to": assignee,
                "due_date": "2030-01-31"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final");
    assert_eq!(body["priority"], "urgent");
    assert_eq!(body["due_date"], "2030-01-31");
    assert_eq!(body["created_by"], ctx.user_id("admin").await);

    let (status, body) = ctx
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&manager),
            json!({ "title": "", "department": "Finance", "due_date": "31/01/2030" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"due_date"));

    let (status, _) = ctx.send(request(Method::DELETE, &uri, Some(&manager))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(request(Method::GET, &uri, Some(&manager))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_client_routes_enforce_roles_and_links() {
    let ctx = TestContext::new().await;
    let admin = ctx.login("admin").await;
    let manager = ctx.login("l.chen").await;
    let staff = ctx.login("e.williams").await;

    let (status, _) = ctx.send(request(Method::GET, "/clients", Some(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/clients",
            Some(&manager),
            json!({
                "company_name": "Westfield Accountants",
                "contact_name": "John Westfield",
                "contact_email": "john@westfieldacc.co.uk",
                "industry": "Accounting"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "active");
    let client_id = body["id"].as_i64().unwrap();
    let uri = format!("/clients/{}", client_id);

    let (status, _) = ctx.send(request(Method::DELETE, &uri, Some(&manager))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(
            Method::POST,
            "/tasks",
            Some(&admin),
            json!({ "title": "Report", "department": "Finance", "client_id": client_id }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx.send(request(Method::DELETE, &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains('1'));

    let (status, body) = ctx
        .send(request(Method::GET, "/clients?status=active", Some(&manager)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_client_validation_errors() {
    let ctx = TestContext::new().await;
    let admin = ctx.login("admin").await;

    let (status, body) = ctx
        .send(json_request(
            Method::POST,
            "/clients",
            Some(&admin),
            json!({
                "company_name": "",
                "contact_name": "Someone",
                "contact_email": "not-an-email"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (status, _) = ctx.send(request(Method::GET, "/clients/999", Some(&admin))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_shape_per_role() {
    let ctx = TestContext::new().await;
    ctx.create_task("A1", "Finance", Some("e.williams")).await;
    ctx.create_task("B1", "Finance", Some("k.patel")).await;
    ctx.create_task("M1", "Marketing", None).await;

    let admin = ctx.login("admin").await;
    let (status, body) = ctx.send(request(Method::GET, "/dashboard", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["counts"]["total"], 3);
    assert_eq!(body["organisation"]["total_staff"], 5);
    assert!(body["by_department"].is_array());

    let manager = ctx.login("l.chen").await;
    let (_, body) = ctx.send(request(Method::GET, "/dashboard", Some(&manager))).await;
    assert_eq!(body["counts"]["total"], 2);
    assert!(body["organisation"].get("total_staff").is_none());
    assert!(body.get("by_department").is_none());

    let staff = ctx.login("e.williams").await;
    let (_, body) = ctx.send(request(Method::GET, "/dashboard", Some(&staff))).await;
    assert_eq!(body["counts"]["total"], 1);
    assert!(body.get("organisation").is_none());
    assert!(body.get("workload").is_none());
}
