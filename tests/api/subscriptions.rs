use sqlx::{postgres::PgRow, Row};

use crate::helpers::TestApp;

struct SavedSubscription {
    email: String,
    interests: Vec<String>,
    timezone: String,
}

async fn saved_subscriptions(test_app: &TestApp) -> Vec<SavedSubscription> {
    sqlx::query("SELECT email, interests, timezone FROM subscriptions;")
        .map(|row: PgRow| SavedSubscription {
            email: row.get("email"),
            interests: row.get("interests"),
            timezone: row.get("timezone"),
        })
        .fetch_all(&test_app.db_pool)
        .await
        .expect("Query to fetch subscriptions failed.")
}

#[tokio::test]
async fn subscribe_returns_201_when_body_is_valid() {
    let test_app = TestApp::spawn_app().await;
    let body = serde_json::json!({
        "email": "reader@test.com",
        "interests": ["science", "health"],
        "timezone": "Europe/Madrid"
    });

    let response = test_app.post_subscription(body).await;

    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    let test_app = TestApp::spawn_app().await;
    let body = serde_json::json!({
        "email": "reader@test.com",
        "interests": ["Science", "Clean-Energy!", "science"],
        "timezone": "Europe/Madrid"
    });

    test_app.post_subscription(body).await;

    let subscriptions = saved_subscriptions(&test_app).await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].email, "reader@test.com");
    assert_eq!(subscriptions[0].interests, vec!["science", "clean-energy"]);
    assert_eq!(subscriptions[0].timezone, "Europe/Madrid");
}

#[tokio::test]
async fn subscribe_defaults_to_new_york_timezone() {
    let test_app = TestApp::spawn_app().await;
    let body = serde_json::json!({
        "email": "reader@test.com",
        "interests": ["sports"]
    });

    test_app.post_subscription(body).await;

    let subscriptions = saved_subscriptions(&test_app).await;
    assert_eq!(subscriptions[0].timezone, "America/New_York");
}

#[tokio::test]
async fn repeat_subscription_updates_preferences_in_place() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_subscription(serde_json::json!({
            "email": "reader@test.com",
            "interests": ["science"]
        }))
        .await;
    let response = test_app
        .post_subscription(serde_json::json!({
            "email": "reader@test.com",
            "interests": ["health", "ocean cleanup"],
            "timezone": "Asia/Tokyo"
        }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("preferences have been updated"));

    let subscriptions = saved_subscriptions(&test_app).await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].interests, vec!["health", "ocean cleanup"]);
    assert_eq!(subscriptions[0].timezone, "Asia/Tokyo");
}

#[tokio::test]
async fn subscribe_returns_400_when_body_require_field_is_missing() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases = vec![
        (serde_json::json!({}), "missing body parameters"),
        (
            serde_json::json!({ "interests": ["science"] }),
            "missing email parameter",
        ),
        (
            serde_json::json!({ "email": "reader@test.com" }),
            "missing interests parameter",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn subscribe_returns_400_when_body_is_present_but_not_valid() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![
        (
            serde_json::json!({ "email": "reader.test.com", "interests": ["science"] }),
            "invalid email parameter",
        ),
        (
            serde_json::json!({ "email": "reader@test.com", "interests": [] }),
            "empty interests",
        ),
        (
            serde_json::json!({ "email": "reader@test.com", "interests": ["<>", "!!"] }),
            "interests empty after sanitization",
        ),
        (
            serde_json::json!({
                "email": "reader@test.com",
                "interests": ["science"],
                "timezone": "Moon/Tranquility_Base"
            }),
            "unknown timezone",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    assert!(saved_subscriptions(&test_app).await.is_empty());
}
