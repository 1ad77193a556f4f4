use anyhow::{ensure, Result};
use base64ct::{Base64, Encoding};
use iam_auth::{
    identity::{
        http::{QR_CODE_PATH, SESSION_PATH, VERIFICATION_PATH},
        Credentials, HttpIdentityClient,
    },
    session::{Access, AuthErrorKind, Coordinator, Phase, PollSettings},
};
use secrecy::SecretString;
use serde_json::json;
use std::{net::TcpListener, sync::Arc, time::Duration};
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

const APP_ID: &str = "0f6a3c1e-7d2b-4a58-9c41-2e8b5d7f9a10";
const HUB_ID: &str = "5b1d9e47-3c6a-4f20-8e15-a7c2d4b6e893";
const PNG: &str = "iVBORw0KGgo=";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn credentials() -> Result<Credentials> {
    let key = Base64::encode_string(&[3u8; 32]);
    Ok(Credentials::new(APP_ID, HUB_ID, SecretString::from(key))?)
}

fn fast_settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(20),
        check_timeout: Duration::from_millis(500),
    }
}

async fn mount_issuance(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(QR_CODE_PATH))
        .and(body_partial_json(json!({ "appId": APP_ID, "hubId": HUB_ID })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "qrCodeBase64": PNG,
            "transactionId": "tx-42"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn coordinator(server: &MockServer) -> Result<Coordinator> {
    let client = HttpIdentityClient::new(&server.uri())?;
    Ok(Coordinator::new(
        Arc::new(client),
        credentials()?,
        fast_settings(),
    ))
}

#[tokio::test]
async fn login_completes_after_pending_checks() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_issuance(&server).await;

    // Two pending checks, then the transaction is approved
    Mock::given(method("POST"))
        .and(path(VERIFICATION_PATH))
        .and(body_partial_json(json!({ "transactionId": "tx-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "verified": false })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(VERIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verified": true,
            "encryptedSessionToken": "sealed",
            "encryptionIv": "nonce"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(body_partial_json(json!({
            "encryptedSessionToken": "sealed",
            "encryptionIv": "nonce",
            "applicationId": APP_ID
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "email": "ada@example.com" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server).await?;
    coordinator.start_authentication().await;

    let issued = coordinator.snapshot();
    ensure!(issued.phase == Phase::Polling, "expected polling, got {issued:?}");
    ensure!(issued.transaction_id() == Some("tx-42"));

    let settled = tokio::time::timeout(Duration::from_secs(5), coordinator.wait_until_settled())
        .await?;

    assert_eq!(settled.phase, Phase::Authenticated);
    assert!(settled.is_authenticated);
    assert!(!settled.poll_active);
    assert_eq!(
        Access::from(&settled),
        Access::Granted {
            email: "ada@example.com".to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn failed_check_ends_the_attempt() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_issuance(&server).await;

    Mock::given(method("POST"))
        .and(path(VERIFICATION_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server).await?;
    coordinator.start_authentication().await;

    let settled = tokio::time::timeout(Duration::from_secs(5), coordinator.wait_until_settled())
        .await?;

    assert_eq!(settled.phase, Phase::Failed);
    assert_eq!(settled.error_message().as_deref(), Some("Verification failed"));
    assert_eq!(
        settled.error.as_ref().map(iam_auth::session::AuthError::kind),
        Some(AuthErrorKind::Verification)
    );
    assert!(!settled.poll_active);

    // No further checks once the attempt has failed
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}

#[tokio::test]
async fn issuance_error_is_reported_with_its_message() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(QR_CODE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("unknown hub"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(VERIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = coordinator(&server).await?;
    coordinator.start_authentication().await;

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert!(snapshot.qr_code.is_none());
    assert!(snapshot
        .error_message()
        .is_some_and(|message| message.contains("unknown hub")));
    Ok(())
}

#[tokio::test]
async fn sign_out_stops_polling() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_issuance(&server).await;
    Mock::given(method("POST"))
        .and(path(VERIFICATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "verified": false })))
        .mount(&server)
        .await;

    let coordinator = coordinator(&server).await?;
    coordinator.start_authentication().await;
    tokio::time::sleep(Duration::from_millis(70)).await;

    coordinator.sign_out();
    let checks_at_sign_out = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == VERIFICATION_PATH)
        .count();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let checks_later = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == VERIFICATION_PATH)
        .count();

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(!snapshot.loading);
    assert!(snapshot.qr_code.is_none());
    // A check already in flight at sign-out may still land
    assert!(checks_later <= checks_at_sign_out + 1);
    Ok(())
}
