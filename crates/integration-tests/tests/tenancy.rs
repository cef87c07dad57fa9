//! Warehouse and inventory access is confined to the owning shop.

use axum::http::{Method, StatusCode};
use serde_json::json;

use stockmate_integration_tests::TestContext;

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let ctx = TestContext::new();

    for (method, uri) in [
        (Method::GET, "/api/warehouse"),
        (Method::POST, "/api/warehouse"),
        (Method::GET, "/api/warehouse/1"),
        (Method::DELETE, "/api/warehouse/1"),
        (Method::GET, "/api/inventory"),
        (Method::GET, "/api/inventory/1"),
        (Method::DELETE, "/api/inventory/1"),
    ] {
        let response = ctx.request(method, uri, None, Some(json!({}))).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_warehouse_create_and_list() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;
    let profile = ctx.get("/api/shop/profile", Some(&token)).await;

    let created = ctx
        .post(
            "/api/warehouse",
            Some(&token),
            json!({ "name": "Main", "location": "Dock 4", "capacity": 500 }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["capacity"], 500);
    assert_eq!(created.body["shop_id"], profile.body["id"]);

    let listed = ctx.get("/api/warehouse", Some(&token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    assert_eq!(listed.body[0]["name"], "Main");
}

#[tokio::test]
async fn test_warehouse_validation() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;

    for body in [
        json!({ "name": "Main", "location": "Dock 4", "capacity": 0 }),
        json!({ "name": "  ", "location": "Dock 4", "capacity": 10 }),
        json!({ "name": "Main", "location": "Dock 4", "capacity": "many" }),
        json!({ "name": "Main", "capacity": 10 }),
    ] {
        let response = ctx.post("/api/warehouse", Some(&token), body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.error().is_some());
    }
}

#[tokio::test]
async fn test_foreign_warehouse_is_not_found() {
    let ctx = TestContext::new();
    let a = ctx.signed_in_shop("a@shop.test").await;
    let b = ctx.signed_in_shop("b@shop.test").await;
    let warehouse = ctx.create_warehouse(&a, "Main", 500).await;

    let foreign = ctx.get(&format!("/api/warehouse/{warehouse}"), Some(&b)).await;
    let missing = ctx.get("/api/warehouse/999999", Some(&b)).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert_eq!(foreign.bytes, missing.bytes);

    let delete = ctx.delete(&format!("/api/warehouse/{warehouse}"), Some(&b)).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let still_there = ctx.get(&format!("/api/warehouse/{warehouse}"), Some(&a)).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["capacity"], 500);

    let b_list = ctx.get("/api/warehouse", Some(&b)).await;
    assert_eq!(b_list.body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_item_cannot_be_created_in_foreign_warehouse() {
    let ctx = TestContext::new();
    let a = ctx.signed_in_shop("a@shop.test").await;
    let b = ctx.signed_in_shop("b@shop.test").await;
    let warehouse = ctx.create_warehouse(&a, "Main", 500).await;

    let response = ctx.create_item(&b, warehouse, "W-1").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let a_items = ctx.get("/api/inventory", Some(&a)).await;
    assert_eq!(a_items.body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_foreign_item_operations_are_not_found() {
    let ctx = TestContext::new();
    let a = ctx.signed_in_shop("a@shop.test").await;
    let b = ctx.signed_in_shop("b@shop.test").await;
    let warehouse = ctx.create_warehouse(&a, "Main", 500).await;
    let item = ctx.create_item(&a, warehouse, "W-1").await;
    assert_eq!(item.status, StatusCode::CREATED);
    let id = item.body["id"].as_i64().unwrap_or_default();
    let uri = format!("/api/inventory/{id}");

    let attempts = [
        ctx.get(&uri, Some(&b)).await,
        ctx.request(Method::PUT, &uri, Some(&b), Some(json!({ "quantity": 0 })))
            .await,
        ctx.request(
            Method::PATCH,
            &format!("{uri}/price"),
            Some(&b),
            Some(json!({ "price": "0.01" })),
        )
        .await,
        ctx.request(Method::PATCH, &uri, Some(&b), Some(json!({ "sku": "X" })))
            .await,
        ctx.delete(&uri, Some(&b)).await,
    ];
    for response in attempts {
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error(), Some("Not found"));
    }

    let unchanged = ctx.get(&uri, Some(&a)).await;
    assert_eq!(unchanged.body, item.body);
}

#[tokio::test]
async fn test_owner_item_lifecycle() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;
    let warehouse = ctx.create_warehouse(&token, "Main", 500).await;
    let item = ctx.create_item(&token, warehouse, "W-1").await;
    assert_eq!(item.status, StatusCode::CREATED);
    assert_eq!(item.body["price"], "4.50");
    let id = item.body["id"].as_i64().unwrap_or_default();
    let uri = format!("/api/inventory/{id}");

    let quantity = ctx
        .request(Method::PUT, &uri, Some(&token), Some(json!({ "quantity": 3 })))
        .await;
    assert_eq!(quantity.status, StatusCode::OK);
    assert_eq!(quantity.body["quantity"], 3);

    let price = ctx
        .request(
            Method::PATCH,
            &format!("{uri}/price"),
            Some(&token),
            Some(json!({ "price": "9.99" })),
        )
        .await;
    assert_eq!(price.status, StatusCode::OK);
    assert_eq!(price.body["price"], "9.99");

    let whole = ctx
        .request(
            Method::PATCH,
            &format!("{uri}/price"),
            Some(&token),
            Some(json!({ "price": 12 })),
        )
        .await;
    assert_eq!(whole.status, StatusCode::OK);
    assert_eq!(whole.body["price"], "12.00");

    let details = ctx
        .request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "category": "tools" })),
        )
        .await;
    assert_eq!(details.status, StatusCode::OK);
    assert_eq!(details.body["category"], "tools");
    assert_eq!(details.body["sku"], "W-1");

    let deleted = ctx.delete(&uri, Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.get(&uri, Some(&token)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_item_validation() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;
    let warehouse = ctx.create_warehouse(&token, "Main", 500).await;
    let id = ctx.create_item(&token, warehouse, "W-1").await.body["id"]
        .as_i64()
        .unwrap_or_default();
    let uri = format!("/api/inventory/{id}");

    let negative_quantity = ctx
        .request(Method::PUT, &uri, Some(&token), Some(json!({ "quantity": -1 })))
        .await;
    assert_eq!(negative_quantity.status, StatusCode::BAD_REQUEST);

    let negative_price = ctx
        .request(
            Method::PATCH,
            &format!("{uri}/price"),
            Some(&token),
            Some(json!({ "price": "-0.01" })),
        )
        .await;
    assert_eq!(negative_price.status, StatusCode::BAD_REQUEST);

    let fractional_cent = ctx
        .request(
            Method::PATCH,
            &format!("{uri}/price"),
            Some(&token),
            Some(json!({ "price": "19.999" })),
        )
        .await;
    assert_eq!(fractional_cent.status, StatusCode::BAD_REQUEST);

    let oversized = ctx
        .post(
            "/api/inventory",
            Some(&token),
            json!({
                "warehouse_id": warehouse,
                "product_name": "Widget",
                "sku": "W-2",
                "quantity": 1,
                "price": "123456789012345.999",
                "category": "parts",
            }),
        )
        .await;
    assert_eq!(oversized.status, StatusCode::BAD_REQUEST);
    assert!(oversized.error().is_some());

    let stored = ctx.get(&uri, Some(&token)).await;
    assert_eq!(stored.body["price"], "4.50");
    let listed = ctx.get("/api/inventory", Some(&token)).await;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));

    let empty_update = ctx
        .request(Method::PATCH, &uri, Some(&token), Some(json!({})))
        .await;
    assert_eq!(empty_update.status, StatusCode::BAD_REQUEST);

    let bad_id = ctx.get("/api/inventory/abc", Some(&token)).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_filters_by_warehouse() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;
    let main = ctx.create_warehouse(&token, "Main", 500).await;
    let annex = ctx.create_warehouse(&token, "Annex", 50).await;
    ctx.create_item(&token, main, "W-1").await;
    ctx.create_item(&token, main, "W-2").await;
    ctx.create_item(&token, annex, "W-3").await;

    let all = ctx.get("/api/inventory", Some(&token)).await;
    assert_eq!(all.body.as_array().map(Vec::len), Some(3));

    let annex_only = ctx
        .get(&format!("/api/inventory?warehouse_id={annex}"), Some(&token))
        .await;
    assert_eq!(annex_only.status, StatusCode::OK);
    assert_eq!(annex_only.body.as_array().map(Vec::len), Some(1));
    assert_eq!(annex_only.body[0]["sku"], "W-3");
}

#[tokio::test]
async fn test_deleting_warehouse_removes_its_items() {
    let ctx = TestContext::new();
    let token = ctx.signed_in_shop("a@shop.test").await;
    let main = ctx.create_warehouse(&token, "Main", 500).await;
    let annex = ctx.create_warehouse(&token, "Annex", 50).await;
    ctx.create_item(&token, main, "W-1").await;
    ctx.create_item(&token, annex, "W-2").await;

    let deleted = ctx.delete(&format!("/api/warehouse/{main}"), Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let remaining = ctx.get("/api/inventory", Some(&token)).await;
    assert_eq!(remaining.body.as_array().map(Vec::len), Some(1));
    assert_eq!(remaining.body[0]["sku"], "W-2");
}
