//! End-to-end test of the donation lifecycle over the HTTP surface:
//! verification gating, the confirmation cascade, its concurrency guard, and
//! chat pairing rules.
//!
//! Requires a reachable PostgreSQL instance; set TEST_DATABASE_URL to run
//! (the test is skipped otherwise). The object store is not needed: every
//! endpoint exercised here is JSON- or text-only.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use givehub::transport;
use givehub::transport::http::AppState;
use givehub::{storage, Config, LifecycleEngine, ObjectStore, StorageConfig};

fn test_config(database_url: &str) -> Config {
    Config {
        port: 0,
        database_url: database_url.to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_access_ttl: Duration::from_secs(3600),
        jwt_refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        storage: StorageConfig {
            endpoint: "localhost:9000".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            use_ssl: false,
            region: "us-east-1".to_string(),
        },
    }
}

fn unique_phone(tag: u32) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    // Distinct per actor within a run, unlikely to collide across runs.
    format!(
        "+7{}{:03}{:07}",
        tag % 10,
        std::process::id() % 1000,
        nanos % 10_000_000
    )
}

async fn register(
    client: &reqwest::Client,
    base: &str,
    phone: &str,
    name: &str,
) -> (i64, String) {
    let resp = client
        .post(format!("{base}/api/v1/auth/register"))
        .json(&json!({
            "phone": phone,
            "password": "secret-password",
            "first_name": name,
            "last_name": "Test",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "registration failed");
    let body: Value = resp.json().await.unwrap();
    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn login(client: &reqwest::Client, base: &str, phone: &str) -> String {
    let resp = client
        .post(format!("{base}/api/v1/auth/login"))
        .json(&json!({"phone": phone, "password": "secret-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "login failed");
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_donation_cascade() {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping DB-backed integration test");
        return;
    };

    let pool = storage::db::connect(&database_url).await.unwrap();
    storage::db::init_schema(&pool).await.unwrap();

    let config = Arc::new(test_config(&database_url));
    let state = AppState {
        engine: LifecycleEngine::new(pool.clone()),
        pool: pool.clone(),
        store: ObjectStore::new(config.storage.clone()).unwrap(),
        config: config.clone(),
    };
    let app = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    // --- Actors: a needy user, a donor, and an admin ---
    let needy_phone = unique_phone(1);
    let donor_phone = unique_phone(2);
    let admin_phone = unique_phone(3);
    let (needy_id, needy_token) = register(&client, &base, &needy_phone, "Needy").await;
    let (_donor_id, donor_token) = register(&client, &base, &donor_phone, "Donor").await;
    let (admin_id, _) = register(&client, &base, &admin_phone, "Admin").await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(admin_id)
        .execute(&pool)
        .await
        .unwrap();
    // Re-login so the token carries the admin role.
    let admin_token = login(&client, &base, &admin_phone).await;

    // --- Post creation is gated on an approved verification ---
    let post_payload = json!({
        "title": "Medical treatment",
        "description": "Help needed",
        "amount": 1000,
        "recipient": "Needy Test",
        "bank": "Test Bank",
        "phone": needy_phone,
    });
    let resp = client
        .post(format!("{base}/api/v1/posts"))
        .bearer_auth(&needy_token)
        .json(&post_payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403, "unverified user must not create posts");

    let verification_payload = json!({
        "last_name": "Test",
        "first_name": "Needy",
        "birth_date": "1990-01-01",
        "passport_series": "1234",
        "passport_number": "567890",
        "passport_issuer": "Test Issuer",
        "passport_date": "2010-01-01",
        "doc_type": "inn",
        "inn": "1234567890",
        "passport_scans_urls": [
            "http://localhost:9000/verification-docs/verifications/0/scan_0.jpg",
            "http://localhost:9000/verification-docs/verifications/0/scan_1.jpg"
        ],
        "consent1": true,
        "consent2": true,
        "consent3": true,
    });
    let resp = client
        .post(format!("{base}/api/v1/verifications"))
        .bearer_auth(&needy_token)
        .json(&verification_payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let verification: Value = resp.json().await.unwrap();
    let verification_id = verification["id"].as_i64().unwrap();
    assert_eq!(verification["status"], "pending");

    // Submission is one-shot, regardless of status.
    let resp = client
        .post(format!("{base}/api/v1/verifications"))
        .bearer_auth(&needy_token)
        .json(&verification_payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409, "second verification must conflict");

    // Only admins review.
    let resp = client
        .patch(format!("{base}/api/v1/verifications/{verification_id}"))
        .bearer_auth(&needy_token)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .patch(format!("{base}/api/v1/verifications/{verification_id}"))
        .bearer_auth(&admin_token)
        .json(&json!({"status": "approved"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // A reviewed verification is terminal.
    let resp = client
        .patch(format!("{base}/api/v1/verifications/{verification_id}"))
        .bearer_auth(&admin_token)
        .json(&json!({"status": "rejected"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Approved now; the post goes through.
    let resp = client
        .post(format!("{base}/api/v1/posts"))
        .bearer_auth(&needy_token)
        .json(&post_payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let post: Value = resp.json().await.unwrap();
    let post_id = post["id"].as_i64().unwrap();
    assert_eq!(post["collected"].as_f64().unwrap(), 0.0);

    // --- Donation confirm cascade ---
    let resp = client
        .post(format!("{base}/api/v1/donations"))
        .bearer_auth(&donor_token)
        .json(&json!({"post_id": post_id, "amount": 25.7}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let donation: Value = resp.json().await.unwrap();
    let donation_id = donation["id"].as_i64().unwrap();
    assert_eq!(donation["status"], "pending");

    // The donor may not resolve their own donation.
    let resp = client
        .patch(format!("{base}/api/v1/donations/{donation_id}"))
        .bearer_auth(&donor_token)
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // N concurrent confirmations: exactly one succeeds.
    let confirm = |token: String| {
        let client = client.clone();
        let url = format!("{base}/api/v1/donations/{donation_id}");
        async move {
            client
                .patch(url)
                .bearer_auth(token)
                .json(&json!({"status": "confirmed"}))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }
    };
    let results = futures::future::join_all((0..5).map(|_| confirm(needy_token.clone()))).await;
    let successes = results.iter().filter(|&&s| s == 200).count();
    let conflicts = results.iter().filter(|&&s| s == 409).count();
    assert_eq!(successes, 1, "exactly one confirmation must win: {results:?}");
    assert_eq!(conflicts, 4, "the rest must conflict: {results:?}");

    // Collected grew by the amount exactly once.
    let resp = client
        .get(format!("{base}/api/v1/posts/{post_id}"))
        .send()
        .await
        .unwrap();
    let post: Value = resp.json().await.unwrap();
    assert_eq!(post["collected"].as_f64().unwrap(), 25.7);

    // Rating credited once: floor(25.7) points, full amount in the total.
    let resp = client
        .get(format!("{base}/api/v1/ratings/me"))
        .bearer_auth(&donor_token)
        .send()
        .await
        .unwrap();
    let rating: Value = resp.json().await.unwrap();
    assert_eq!(rating["points"].as_i64().unwrap(), 25);
    assert_eq!(rating["total_donated"].as_f64().unwrap(), 25.7);
    assert_eq!(rating["status"], "Platform Friend");
    assert_eq!(rating["position"].as_i64().unwrap(), 1);

    // Rejecting a confirmed donation is a conflict and changes nothing.
    let resp = client
        .patch(format!("{base}/api/v1/donations/{donation_id}"))
        .bearer_auth(&admin_token)
        .json(&json!({"status": "rejected"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let resp = client
        .get(format!("{base}/api/v1/posts/{post_id}"))
        .send()
        .await
        .unwrap();
    let post: Value = resp.json().await.unwrap();
    assert_eq!(post["collected"].as_f64().unwrap(), 25.7);

    // --- Chat pairing ---
    let resp = client
        .post(format!("{base}/api/v1/chats"))
        .bearer_auth(&donor_token)
        .json(&json!({"post_id": post_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let chat: Value = resp.json().await.unwrap();
    let chat_id = chat["id"].as_i64().unwrap();
    assert_eq!(chat["needy_id"].as_i64().unwrap(), needy_id);

    let resp = client
        .post(format!("{base}/api/v1/chats"))
        .bearer_auth(&donor_token)
        .json(&json!({"post_id": post_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409, "duplicate (post, helper) pair must conflict");

    let resp = client
        .post(format!("{base}/api/v1/chats"))
        .bearer_auth(&needy_token)
        .json(&json!({"post_id": post_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422, "the owner cannot open a chat on their own post");

    // --- Message authorship guards ---
    let form = reqwest::multipart::Form::new().text("text", "hello there");
    let resp = client
        .post(format!("{base}/api/v1/chats/{chat_id}/messages"))
        .bearer_auth(&donor_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let message: Value = resp.json().await.unwrap();
    let message_id = message["id"].as_i64().unwrap();

    let resp = client
        .patch(format!("{base}/api/v1/chats/{chat_id}/messages/{message_id}"))
        .bearer_auth(&needy_token)
        .json(&json!({"text": "hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403, "only the sender may edit");

    let resp = client
        .patch(format!("{base}/api/v1/chats/{chat_id}/messages/{message_id}"))
        .bearer_auth(&donor_token)
        .json(&json!({"text": "hello, edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let edited: Value = resp.json().await.unwrap();
    assert_eq!(edited["is_edited"], true);

    let resp = client
        .delete(format!("{base}/api/v1/chats/{chat_id}/messages/{message_id}"))
        .bearer_auth(&needy_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403, "only the sender may delete");

    let resp = client
        .delete(format!("{base}/api/v1/chats/{chat_id}/messages/{message_id}"))
        .bearer_auth(&donor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}
