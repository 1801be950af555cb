use crate::helpers::{spawn_app, valid_submission};

use portfolio_contact::routes::contact::BODY_LIMIT;
use wiremock::{
    matchers::{any, method, path},
    Mock, ResponseTemplate,
};

const GENERIC_FAILURE: &str =
    "Failed to send message. Please try again later or contact me directly via email.";

#[tokio::test]
async fn a_valid_submission_is_relayed_and_acknowledged() {
    let app = spawn_app().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "success": true,
            "message": "Message sent successfully! I will get back to you soon.",
        })
    );
}

#[tokio::test]
async fn the_notification_goes_to_the_recipient_with_the_submitter_as_reply_to() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.post_contact(&valid_submission()).await;

    let requests = app.email_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["To"], app.recipient.as_str());
    assert_eq!(body["ReplyTo"], "jane@example.com");
    assert_eq!(body["Subject"], "Portfolio Contact: Hello there");
    assert!(body["HtmlBody"]
        .as_str()
        .unwrap()
        .contains("This is a long enough message."));
}

#[tokio::test]
async fn invalid_submissions_are_rejected_with_itemized_errors() {
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({
                "email": "jane@example.com",
                "subject": "Hello there",
                "message": "This is a long enough message.",
            }),
            vec!["Name must be at least 2 characters long"],
            "missing name",
        ),
        (
            serde_json::json!({
                "name": "Jane Doe",
                "email": "not-an-email",
                "subject": "Hello there",
                "message": "This is a long enough message.",
            }),
            vec!["Valid email address is required"],
            "invalid email",
        ),
        (
            serde_json::json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "subject": "Hi",
                "message": "short",
            }),
            vec![
                "Subject must be at least 3 characters long",
                "Message must be at least 10 characters long",
            ],
            "short subject and message",
        ),
        (
            serde_json::json!({}),
            vec![
                "Name must be at least 2 characters long",
                "Valid email address is required",
                "Subject must be at least 3 characters long",
                "Message must be at least 10 characters long",
            ],
            "empty payload",
        ),
    ];

    for (payload, expected_errors, description) in test_cases {
        let response = app.post_contact(&payload).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(
            body["errors"],
            serde_json::json!(expected_errors),
            "Unexpected errors for {}.",
            description
        );
    }
}

#[tokio::test]
async fn a_body_that_is_not_json_is_treated_as_an_empty_form() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/api/contact", app.address))
        .header("Content-Type", "text/plain")
        .body("hello")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn rejected_submissions_do_not_send_email() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    app.post_contact(&serde_json::json!({ "name": "J" })).await;
}

#[tokio::test]
async fn the_sixth_request_in_the_window_is_rate_limited() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    // Valid and invalid submissions count alike.
    let payloads = [
        valid_submission(),
        serde_json::json!({}),
        valid_submission(),
        serde_json::json!({ "name": "J" }),
        serde_json::json!({}),
    ];
    for (payload, remaining) in payloads.iter().zip((0..5).rev()) {
        let response = app.post_contact(payload).await;

        assert_ne!(response.status().as_u16(), 429);
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            remaining.to_string().as_str()
        );
        assert!(response.headers().contains_key("x-ratelimit-reset"));
    }

    for payload in [valid_submission(), serde_json::json!({})] {
        let response = app.post_contact(&payload).await;

        assert_eq!(response.status().as_u16(), 429);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert!(response.headers().contains_key("x-ratelimit-reset"));
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "message": "Too many requests from this IP, please try again later.",
            })
        );
    }
}

#[tokio::test]
async fn a_failing_email_service_yields_a_generic_500() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid server token"))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(response.status().as_u16(), 500);
    let text = response.text().await.unwrap();
    assert!(!text.contains("401"));
    assert!(!text.contains("token"));
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "message": GENERIC_FAILURE })
    );
}

#[tokio::test]
async fn a_url_encoded_submission_is_relayed() {
    let app = spawn_app().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let body = "name=Jane+Doe&email=jane%40example.com&subject=Hello+there&message=This+is+a+long+enough+message.";
    let response = app.post_contact_form(body).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn an_invalid_url_encoded_submission_reports_only_its_errors() {
    let app = spawn_app().await;

    let response = app
        .post_contact_form("name=Jane+Doe&email=jane%40example.com&subject=Hi&message=This+is+a+long+enough+message.")
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"],
        serde_json::json!(["Subject must be at least 3 characters long"])
    );
}

#[tokio::test]
async fn an_oversized_body_is_rejected_without_sending_email() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let mut payload = valid_submission();
    payload["message"] = serde_json::Value::String("a".repeat(BODY_LIMIT as usize + 1));
    let response = app.post_contact(&payload).await;

    assert_eq!(response.status().as_u16(), 413);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "message": "Request body is too large" })
    );
}

#[tokio::test]
async fn a_wrongly_typed_field_only_reports_its_own_error() {
    let app = spawn_app().await;

    let response = app
        .post_contact(&serde_json::json!({
            "name": 123,
            "email": "jane@example.com",
            "subject": "Hello there",
            "message": "This is a long enough message.",
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"],
        serde_json::json!(["Name must be at least 2 characters long"])
    );
}
