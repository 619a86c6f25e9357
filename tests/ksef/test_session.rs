// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session lifecycle: idempotent reuse, key exchange, encrypted submission.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::Oaep;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ksef_client::crypto::decrypt_invoice;
use ksef_client::{KsefApiError, SessionKeys, SessionState};

use super::support;

/// Spec property: a stored session whose status probe reports an active code
/// is reused as-is; no key exchange or re-key happens.
#[tokio::test]
async fn test_open_session_reuses_active_session() {
    let cert_hits = Arc::new(AtomicUsize::new(0));
    let open_hits = Arc::new(AtomicUsize::new(0));

    let c = cert_hits.clone();
    let o = open_hits.clone();
    let router = Router::new()
        .route(
            "/sessions/:reference",
            get(|Path(_r): Path<String>| async {
                Json(json!({"status": {"code": 100, "description": "In progress"}}))
            }),
        )
        .route(
            "/security/public-key-certificates",
            get(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Json(json!([]))
                }
            }),
        )
        .route(
            "/sessions/online",
            post(move || {
                let o = o.clone();
                async move {
                    o.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"referenceNumber": "REF-NEW"}))
                }
            }),
        );

    let base_url = support::spawn(router).await;
    let keys = SessionKeys::generate();
    let state = SessionState::new(Some("REF123".to_string()), Some(keys.clone()));
    let mut client = support::test_client(&base_url, state);

    let reference = client.open_session().await.expect("open session");

    assert_eq!(reference, "REF123");
    assert_eq!(cert_hits.load(Ordering::SeqCst), 0);
    assert_eq!(open_hits.load(Ordering::SeqCst), 0);
    // Key material untouched by the short-circuit.
    assert_eq!(client.session_state().keys(), Some(&keys));
}

/// Spec property: every genuinely fresh open generates new key material.
/// The service sees two different wrapped keys and two different IVs.
#[tokio::test]
async fn test_fresh_opens_generate_distinct_keys() {
    let authority = support::test_authority();
    let open_bodies = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));

    let bodies = open_bodies.clone();
    let certificate_body = support::certificate_list_body(authority);
    let router = Router::new()
        .route(
            "/sessions/:reference",
            get(|Path(_r): Path<String>| async {
                // Stored sessions are always stale here, forcing a re-key.
                Json(json!({"status": {"code": 440, "description": "Session expired"}}))
            }),
        )
        .route(
            "/security/public-key-certificates",
            get(move || {
                let body = certificate_body.clone();
                async move { Json(body) }
            }),
        )
        .route(
            "/sessions/online",
            post(move |Json(body): Json<serde_json::Value>| {
                let bodies = bodies.clone();
                async move {
                    let n = {
                        let mut bodies = bodies.lock().unwrap();
                        bodies.push(body);
                        bodies.len()
                    };
                    Json(json!({"referenceNumber": format!("REF-{}", n)}))
                }
            }),
        );

    let base_url = support::spawn(router).await;
    let mut client = support::test_client(&base_url, SessionState::empty());

    let first = client.open_session().await.expect("first open");
    let second = client.open_session().await.expect("second open");
    assert_eq!(first, "REF-1");
    assert_eq!(second, "REF-2");

    let bodies = open_bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);

    let mut keys = Vec::new();
    let mut ivs = Vec::new();
    for body in bodies.iter() {
        assert_eq!(body["formCode"]["systemCode"], "FA (3)");
        assert_eq!(body["formCode"]["schemaVersion"], "1-0E");
        assert_eq!(body["formCode"]["value"], "FA");

        let wrapped = BASE64
            .decode(body["encryption"]["encryptedSymmetricKey"].as_str().unwrap())
            .unwrap();
        let key = authority
            .private_key
            .decrypt(Oaep::new::<Sha256>(), &wrapped)
            .expect("unwrap session key");
        assert_eq!(key.len(), 32);
        let iv = BASE64
            .decode(body["encryption"]["initializationVector"].as_str().unwrap())
            .unwrap();
        assert_eq!(iv.len(), 16);
        keys.push(key);
        ivs.push(iv);
    }
    assert_ne!(keys[0], keys[1]);
    assert_ne!(ivs[0], ivs[1]);
}

/// Spec property: a certificate list without the symmetric-encryption usage
/// fails with a configuration error before the session endpoint is touched.
#[tokio::test]
async fn test_missing_symmetric_usage_is_configuration_error() {
    let authority = support::test_authority();
    let open_hits = Arc::new(AtomicUsize::new(0));

    let o = open_hits.clone();
    let certificate_b64 = authority.certificate_b64.clone();
    let router = Router::new()
        .route(
            "/security/public-key-certificates",
            get(move || {
                let certificate_b64 = certificate_b64.clone();
                async move {
                    Json(json!([
                        {"usage": ["KsefTokenEncryption"], "certificate": certificate_b64}
                    ]))
                }
            }),
        )
        .route(
            "/sessions/online",
            post(move || {
                let o = o.clone();
                async move {
                    o.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"referenceNumber": "REF-NEW"}))
                }
            }),
        );

    let base_url = support::spawn(router).await;
    let mut client = support::test_client(&base_url, SessionState::empty());

    let result = client.open_session().await;

    assert!(
        matches!(result, Err(KsefApiError::Configuration(_))),
        "expected Configuration, got {:?}",
        result
    );
    assert_eq!(open_hits.load(Ordering::SeqCst), 0);
}

/// End-to-end: open a session, submit an encrypted invoice, confirm the
/// session reads as open. The mock service verifies the integrity contract
/// the real service enforces: both hash/size pairs and the ciphertext itself.
#[tokio::test]
async fn test_open_send_status_end_to_end() {
    let authority = support::test_authority();
    let open_bodies = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));
    let invoice_bodies = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));

    let ob = open_bodies.clone();
    let ib = invoice_bodies.clone();
    let certificate_body = support::certificate_list_body(authority);
    let router = Router::new()
        .route(
            "/security/public-key-certificates",
            get(move || {
                let body = certificate_body.clone();
                async move { Json(body) }
            }),
        )
        .route(
            "/sessions/online",
            post(move |Json(body): Json<serde_json::Value>| {
                let ob = ob.clone();
                async move {
                    ob.lock().unwrap().push(body);
                    Json(json!({"referenceNumber": "REF123"}))
                }
            }),
        )
        .route(
            "/sessions/online/:reference/invoices",
            post(
                move |Path(reference): Path<String>, Json(body): Json<serde_json::Value>| {
                    let ib = ib.clone();
                    async move {
                        assert_eq!(reference, "REF123");
                        ib.lock().unwrap().push(body);
                        Json(json!({"referenceNumber": "INV-REF-1", "processingCode": 100}))
                    }
                },
            ),
        )
        .route(
            "/sessions/:reference",
            get(|Path(_r): Path<String>| async {
                Json(json!({"status": {"code": 200, "description": "Session active"}}))
            }),
        );

    let base_url = support::spawn(router).await;
    let mut client = support::test_client(&base_url, SessionState::empty());

    let xml = b"<xml/>";
    let reference = client.open_session().await.expect("open session");
    assert_eq!(reference, "REF123");

    let receipt = client.send_invoice(xml).await.expect("send invoice");
    assert_eq!(receipt.reference_number.as_deref(), Some("INV-REF-1"));

    assert!(client.is_session_opened().await.expect("status probe"));

    // Recover the session key the way the service would and verify the
    // upload payload against it.
    let open_body = open_bodies.lock().unwrap()[0].clone();
    let wrapped = BASE64
        .decode(open_body["encryption"]["encryptedSymmetricKey"].as_str().unwrap())
        .unwrap();
    let key: [u8; 32] = authority
        .private_key
        .decrypt(Oaep::new::<Sha256>(), &wrapped)
        .expect("unwrap session key")
        .try_into()
        .unwrap();
    let iv: [u8; 16] = BASE64
        .decode(open_body["encryption"]["initializationVector"].as_str().unwrap())
        .unwrap()
        .try_into()
        .unwrap();
    let session_keys = SessionKeys::from_raw(key, iv);

    let payload = invoice_bodies.lock().unwrap()[0].clone();
    let ciphertext = BASE64
        .decode(payload["encryptedInvoiceContent"].as_str().unwrap())
        .unwrap();

    assert_eq!(payload["invoiceSize"], xml.len());
    assert_eq!(
        payload["invoiceHash"],
        BASE64.encode(Sha256::digest(xml))
    );
    assert_eq!(payload["encryptedInvoiceSize"], ciphertext.len());
    assert_eq!(
        payload["encryptedInvoiceHash"],
        BASE64.encode(Sha256::digest(&ciphertext))
    );

    let decrypted = decrypt_invoice(&session_keys, &ciphertext).expect("decrypt invoice");
    assert_eq!(decrypted, xml);
}

/// No implicit auto-open: submitting without a session is an immediate error.
#[tokio::test]
async fn test_send_invoice_without_session_fails() {
    let base_url = support::spawn(Router::new()).await;
    let mut client = support::test_client(&base_url, SessionState::empty());

    let result = client.send_invoice(b"<xml/>").await;
    assert!(matches!(result, Err(KsefApiError::NoActiveSession)));
}

/// Closing is advisory: a remote failure is swallowed, and closing without a
/// session is a no-op.
#[tokio::test]
async fn test_close_session_is_best_effort() {
    let close_hits = Arc::new(AtomicUsize::new(0));

    let c = close_hits.clone();
    let router = Router::new().route(
        "/sessions/online/:reference/close",
        post(move |Path(_r): Path<String>| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "boom"})),
                )
            }
        }),
    );

    let base_url = support::spawn(router).await;

    let mut client = support::test_client(&base_url, SessionState::empty());
    client.close_session().await;
    assert_eq!(close_hits.load(Ordering::SeqCst), 0);

    let state = SessionState::new(Some("REF123".to_string()), None);
    let mut client = support::test_client(&base_url, state);
    client.close_session().await;
    assert_eq!(close_hits.load(Ordering::SeqCst), 1);
    // The reference survives; the next open probes and re-keys as needed.
    assert_eq!(client.session_state().reference_number(), Some("REF123"));
}

/// The paginated listing forwards its page window as query parameters.
#[tokio::test]
async fn test_session_invoices_listing_paginates() {
    let seen_query = Arc::new(Mutex::new(None));

    let q = seen_query.clone();
    let router = Router::new().route(
        "/sessions/online/:reference/invoices",
        get(
            move |Path(_r): Path<String>, Query(params): Query<HashMap<String, String>>| {
                let q = q.clone();
                async move {
                    *q.lock().unwrap() = Some(params);
                    Json(json!({"invoices": [], "totalCount": 0}))
                }
            },
        ),
    );

    let base_url = support::spawn(router).await;
    let state = SessionState::new(Some("REF123".to_string()), None);
    let mut client = support::test_client(&base_url, state);

    let listing = client
        .get_session_invoices_status(50, 100)
        .await
        .expect("listing");
    assert_eq!(listing["totalCount"], 0);

    let params = seen_query.lock().unwrap().clone().unwrap();
    assert_eq!(params["pageSize"], "50");
    assert_eq!(params["pageOffset"], "100");
}

/// Invoice status is addressed by session and invoice reference together.
#[tokio::test]
async fn test_invoice_status_by_reference() {
    let router = Router::new().route(
        "/sessions/:session/invoices/:invoice",
        get(|Path((session, invoice)): Path<(String, String)>| async move {
            assert_eq!(session, "REF123");
            assert_eq!(invoice, "INV-REF-1");
            Json(json!({
                "status": {"code": 200, "description": "Processed"},
                "ksefNumber": "1234567883-20250806-ABCDEF-01"
            }))
        }),
    );

    let base_url = support::spawn(router).await;
    let state = SessionState::new(Some("REF123".to_string()), None);
    let mut client = support::test_client(&base_url, state);

    let status = client
        .get_invoice_status("INV-REF-1", "REF123")
        .await
        .expect("invoice status");
    assert_eq!(status.status.unwrap().code, 200);
    assert_eq!(status.extra["ksefNumber"], "1234567883-20250806-ABCDEF-01");
}

/// The UPO endpoint returns the receipt bytes untouched.
#[tokio::test]
async fn test_invoice_upo_returns_raw_bytes() {
    let router = Router::new().route(
        "/sessions/:session/invoices/:invoice/upo",
        get(|Path((_s, _i)): Path<(String, String)>| async {
            b"%PDF-1.7 fake receipt".to_vec()
        }),
    );

    let base_url = support::spawn(router).await;
    let state = SessionState::new(Some("REF123".to_string()), None);
    let mut client = support::test_client(&base_url, state);

    let upo = client
        .get_invoice_upo("INV-REF-1", "REF123")
        .await
        .expect("fetch UPO");
    assert_eq!(upo, b"%PDF-1.7 fake receipt");
}
