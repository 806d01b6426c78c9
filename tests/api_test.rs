mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use lumina::{api, config::Settings, domain::RailKind, service::ServiceContext};

async fn test_app(settings: Settings) -> anyhow::Result<(axum::Router, Arc<ServiceContext>)> {
    let ctx = common::test_context(&settings).await?;
    let app = api::create_app(ctx.clone(), Arc::new(settings));
    Ok((app, ctx))
}

async fn body_json(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn health_endpoint_responds() -> anyhow::Result<()> {
    let (app, _ctx) = test_app(common::test_settings()).await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");

    Ok(())
}

#[tokio::test]
async fn card_payment_flow_over_http() -> anyhow::Result<()> {
    let (app, ctx) = test_app(common::test_settings()).await?;

    // Sign up
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": "http@example.com",
                        "country": "US",
                        "phone": "+1 555 0100"
                    })
                    .to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = body_json(response).await?;
    let user_id = user["id"].as_str().unwrap().to_string();
    assert_eq!(user["plan"], "free");

    let method = common::method_for(&ctx, RailKind::Card).await?;

    // Pay with the always-approving test card
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/card")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "user_id": user_id,
                        "method_id": method.id,
                        "cardholder_name": "Http Tester",
                        "card_number": "4242424242424242",
                        "expiry_date": "12/39",
                        "cvc": "123"
                    })
                    .to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = body_json(response).await?;
    assert_eq!(payment["status"], "approved");
    assert_eq!(payment["masked_card_number"], "**** **** **** 4242");

    // The upgrade is visible on the user resource
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{}", user_id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await?;
    assert_eq!(user["plan"], "pro");

    Ok(())
}

#[tokio::test]
async fn admin_reject_requires_known_payment() -> anyhow::Result<()> {
    let (app, _ctx) = test_app(common::test_settings()).await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/admin/payments/{}/reject", uuid::Uuid::new_v4()))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "reason": "test" }).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn duplicate_signup_conflicts() -> anyhow::Result<()> {
    let (app, ctx) = test_app(common::test_settings()).await?;
    common::create_user(&ctx, "taken@example.com", None).await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": "taken@example.com",
                        "country": "US",
                        "phone": "+1 555 0100"
                    })
                    .to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    Ok(())
}
