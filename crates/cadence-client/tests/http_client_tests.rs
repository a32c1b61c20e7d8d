//! # HTTP Collaborator Tests
//!
//! Drives the live adapters against wiremock servers to check request
//! construction, reply parsing and error mapping.

use cadence_client::anthropic::AnthropicClient;
use cadence_client::config::{AnthropicConfig, LinkedInConfig, OpenAiConfig};
use cadence_client::linkedin::LinkedInPublisher;
use cadence_client::openai::OpenAiImageClient;
use cadence_client::{
    CollaboratorError, ImagePromptRequest, ImagePrompter, ImageRenderer, MediaKind,
    NarrativeOrderer, PublishMedia, PublishRequest, Publisher, PublisherCredentials, TagRequest,
    TagSelector, TitledPost,
};
use cadence_core::{ContentType, PostId};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn anthropic(server: &MockServer) -> AnthropicClient {
    let mut cfg = AnthropicConfig::new(Url::parse(&server.uri()).unwrap(), "test-key");
    cfg.timeout_secs = 5;
    AnthropicClient::new(cfg).expect("client build")
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    }))
}

fn creds() -> PublisherCredentials {
    PublisherCredentials {
        access_token: "li-token".into(),
        person_urn: "urn:li:person:abc".into(),
    }
}

// ── Anthropic ────────────────────────────────────────────────────────────

#[tokio::test]
async fn narrative_order_sends_numbered_titles_and_parses_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-haiku-4-5-20251001",
            "max_tokens": 150,
            "messages": [{
                "role": "user",
                "content": "Order these by narrative arc:\n1. [id:10] Problem\n2. [id:11] Proof"
            }]
        })))
        .respond_with(text_reply("```json\n[11, \"10\"]\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let posts = [
        TitledPost { id: PostId::new(10), title: "Problem".into() },
        TitledPost { id: PostId::new(11), title: "Proof".into() },
    ];
    let order = anthropic(&server).narrative_order(&posts).await.unwrap();
    assert_eq!(order, vec![PostId::new(11), PostId::new(10)]);
}

#[tokio::test]
async fn narrative_order_rejects_non_array_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(text_reply("Post 11 first, then 10."))
        .mount(&server)
        .await;

    let posts = [TitledPost { id: PostId::new(10), title: "x".into() }];
    let err = anthropic(&server).narrative_order(&posts).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::MalformedReply { .. }));
}

#[tokio::test]
async fn tag_selection_keeps_only_strings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({ "max_tokens": 80 })))
        .respond_with(text_reply("[\"#GovTech\", 7, \"#AI\"]"))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = ["#BHTLabs", "#GovTech", "#AI"];
    let req = TagRequest {
        content_type: ContentType::Insight,
        title: "Title",
        body: "Body",
        candidates: &candidates,
    };
    let tags = anthropic(&server).select_tags(&req).await.unwrap();
    assert_eq!(tags, vec!["#GovTech", "#AI"]);
}

#[tokio::test]
async fn image_prompt_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({ "max_tokens": 200 })))
        .respond_with(text_reply("  Navy grid over teal negative space.  \n"))
        .expect(1)
        .mount(&server)
        .await;

    let req = ImagePromptRequest {
        content_type: ContentType::Vision,
        title: "Where federal data goes next",
        body: "A look ahead.",
    };
    let prompt = anthropic(&server).image_prompt(&req).await.unwrap();
    assert_eq!(prompt, "Navy grid over teal negative space.");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .expect(1)
        .mount(&server)
        .await;

    let req = ImagePromptRequest {
        content_type: ContentType::General,
        title: "t",
        body: "b",
    };
    let err = anthropic(&server).image_prompt(&req).await.unwrap_err();
    match err {
        CollaboratorError::ApiError { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .expect(4)
        .mount(&server)
        .await;

    let req = ImagePromptRequest {
        content_type: ContentType::General,
        title: "t",
        body: "b",
    };
    let err = anthropic(&server).image_prompt(&req).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::ApiError { status: 529, .. }));
}

// ── OpenAI ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn render_generates_then_downloads() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G'];

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("Authorization", "Bearer oa-key"))
        .and(body_partial_json(json!({
            "model": "dall-e-3",
            "size": "1792x1024",
            "quality": "standard",
            "style": "natural",
            "n": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1,
            "data": [{ "url": format!("{}/files/img.png", server.uri()) }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = OpenAiConfig::new(Url::parse(&server.uri()).unwrap(), "oa-key");
    cfg.timeout_secs = 5;
    let bytes = OpenAiImageClient::new(cfg).unwrap().render("grid").await.unwrap();
    assert_eq!(bytes, png);
}

#[tokio::test]
async fn render_without_url_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let cfg = OpenAiConfig::new(Url::parse(&server.uri()).unwrap(), "oa-key");
    let err = OpenAiImageClient::new(cfg).unwrap().render("grid").await.unwrap_err();
    assert!(matches!(err, CollaboratorError::MalformedReply { .. }));
}

// ── LinkedIn ─────────────────────────────────────────────────────────────

fn publisher(server: &MockServer) -> LinkedInPublisher {
    LinkedInPublisher::new(LinkedInConfig::new(Url::parse(&server.uri()).unwrap())).unwrap()
}

#[tokio::test]
async fn publish_text_post_reads_restli_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .and(header("Authorization", "Bearer li-token"))
        .and(header("LinkedIn-Version", "202401"))
        .and(header("X-Restli-Protocol-Version", "2.0.0"))
        .and(body_partial_json(json!({
            "author": "urn:li:person:abc",
            "commentary": "Body\n\n#BHTLabs",
            "visibility": "PUBLIC",
            "lifecycleState": "PUBLISHED",
            "distribution": { "feedDistribution": "MAIN_FEED" }
        })))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:99"))
        .expect(1)
        .mount(&server)
        .await;

    let req = PublishRequest {
        commentary: PublishRequest::commentary_for("Body", "#BHTLabs"),
        title: "Title".into(),
        media: None,
    };
    let id = publisher(&server).publish(&creds(), &req).await.unwrap();
    assert_eq!(id, "urn:li:share:99");
}

#[tokio::test]
async fn publish_falls_back_to_body_id_then_literal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "urn:li:share:7" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let req = PublishRequest {
        commentary: "c".into(),
        title: "t".into(),
        media: None,
    };
    let p = publisher(&server);
    assert_eq!(p.publish(&creds(), &req).await.unwrap(), "urn:li:share:7");
    assert_eq!(p.publish(&creds(), &req).await.unwrap(), "posted");
}

#[tokio::test]
async fn publish_document_uploads_then_attaches_with_title() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/documents"))
        .and(query_param("action", "initializeUpload"))
        .and(body_partial_json(json!({
            "initializeUploadRequest": { "owner": "urn:li:person:abc" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "uploadUrl": format!("{}/upload/doc-1", server.uri()),
                "document": "urn:li:document:D1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/doc-1"))
        .and(header("Content-Type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .and(body_partial_json(json!({
            "content": { "media": { "id": "urn:li:document:D1", "title": "Capability deck" } }
        })))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:5"))
        .expect(1)
        .mount(&server)
        .await;

    let req = PublishRequest {
        commentary: "See attached.".into(),
        title: "Capability deck".into(),
        media: Some(PublishMedia {
            kind: MediaKind::Document,
            bytes: b"%PDF-1.7".to_vec(),
        }),
    };
    let id = publisher(&server).publish(&creds(), &req).await.unwrap();
    assert_eq!(id, "urn:li:share:5");
}

#[tokio::test]
async fn publish_rejection_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .expect(1)
        .mount(&server)
        .await;

    let req = PublishRequest {
        commentary: "c".into(),
        title: "t".into(),
        media: None,
    };
    let err = publisher(&server).publish(&creds(), &req).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::ApiError { status: 401, .. }));
}

#[tokio::test]
async fn verify_reads_userinfo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/userinfo"))
        .and(header("Authorization", "Bearer li-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "abc",
            "name": "Dana Reyes",
            "picture": "https://media.example/p.jpg",
            "email_verified": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = publisher(&server).verify(&creds()).await.unwrap();
    assert_eq!(profile.subject.as_deref(), Some("abc"));
    assert_eq!(profile.name.as_deref(), Some("Dana Reyes"));
    assert!(profile.picture.is_some());
}

#[tokio::test]
async fn verify_rejection_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/userinfo"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = publisher(&server).verify(&creds()).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::ApiError { status: 401, .. }));
}
