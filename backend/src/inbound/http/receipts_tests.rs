//! Tests for receipt HTTP handlers.

use super::*;
use crate::domain::{
    INVALID_FILE_TYPE_MESSAGE, NewReceipt, RECEIPT_NOT_FOUND_MESSAGE, StorageKey, UsageCheck,
    UsageLimit, USAGE_LIMIT_EXCEEDED_MESSAGE,
};
use crate::inbound::http::sessions::create_session;
use crate::inbound::http::test_utils::{
    TestPorts, session_cookie, session_request, test_session_middleware,
};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use url::Url;

const USER: &str = "user_2bXk9QwErTy";

fn user() -> UserId {
    UserId::new(USER).expect("fixture user id")
}

fn sample_receipt() -> Receipt {
    Receipt::new_upload(
        NewReceipt {
            user_id: user(),
            storage_key: StorageKey::generate_pdf(),
            file_name: "lunch.pdf".to_owned(),
            size_bytes: 2048,
            mime_type: "application/pdf".to_owned(),
        },
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}

async fn call(
    ports: TestPorts,
    request: actix_test::TestRequest,
) -> actix_web::dev::ServiceResponse {
    let app = actix_test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(ports.into_state())
            .service(
                web::scope("/api/v1")
                    .service(create_session)
                    .service(upload_receipt)
                    .service(list_receipts)
                    .service(receipt_status)
                    .service(get_receipt)
                    .service(receipt_download_url)
                    .service(delete_receipt),
            ),
    )
    .await;
    let login = actix_test::call_service(&app, session_request(USER).to_request()).await;
    let cookie = session_cookie(&login);
    actix_test::call_service(&app, request.cookie(cookie).to_request()).await
}

async fn call_json(ports: TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let res = call(ports, request).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn pdf_upload() -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/api/v1/receipts")
        .insert_header((header::CONTENT_TYPE, "application/pdf"))
        .insert_header((FILE_NAME_HEADER, "lunch.pdf"))
        .set_payload(&b"%PDF-1.7 fixture"[..])
}

#[rstest]
#[actix_web::test]
async fn upload_returns_success_envelope() {
    let receipt_id = ReceiptId::random();
    let mut ports = TestPorts::default();
    ports
        .receipts
        .expect_upload()
        .withf(|request| {
            request.user_id.as_ref() == USER
                && request.file_name == "lunch.pdf"
                && request.content_type.as_deref() == Some("application/pdf")
                && request.bytes.starts_with(b"%PDF")
        })
        .times(1)
        .returning(move |request| {
            Ok(UploadedReceipt {
                receipt_id,
                file_name: request.file_name,
            })
        });

    let (status, body) = call_json(ports, pdf_upload()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["receiptId"], receipt_id.to_string());
    assert_eq!(body["data"]["fileName"], "lunch.pdf");
    assert!(body.get("error").is_none());
}

#[rstest]
#[actix_web::test]
async fn upload_without_file_name_uses_default() {
    let mut ports = TestPorts::default();
    ports
        .receipts
        .expect_upload()
        .withf(|request| request.file_name == DEFAULT_FILE_NAME)
        .returning(|request| {
            Ok(UploadedReceipt {
                receipt_id: ReceiptId::random(),
                file_name: request.file_name,
            })
        });
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/receipts")
        .insert_header((header::CONTENT_TYPE, "application/pdf; charset=binary"))
        .set_payload(&b"%PDF"[..]);

    let (status, body) = call_json(ports, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fileName"], DEFAULT_FILE_NAME);
}

#[rstest]
#[actix_web::test]
async fn upload_rejection_keeps_envelope_shape() {
    let mut ports = TestPorts::default();
    ports
        .receipts
        .expect_upload()
        .returning(|_| Err(Error::invalid_request(INVALID_FILE_TYPE_MESSAGE)));

    let (status, body) = call_json(ports, pdf_upload()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], INVALID_FILE_TYPE_MESSAGE);
    assert!(body.get("data").is_none());
}

#[rstest]
#[actix_web::test]
async fn quota_denial_surfaces_usage_check() {
    let check = UsageCheck::evaluate(UsageLimit::Bounded(5), 5);
    let mut ports = TestPorts::default();
    ports.receipts.expect_upload().returning(move |_| {
        Err(Error::forbidden(USAGE_LIMIT_EXCEEDED_MESSAGE)
            .with_details(json!({ "usageCheck": check })))
    });

    let (status, body) = call_json(ports, pdf_upload()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["usageCheck"]["allowed"], false);
    assert_eq!(body["usageCheck"]["limit"], 5);
    assert_eq!(body["usageCheck"]["remaining"], 0);
}

#[rstest]
#[actix_web::test]
async fn internal_upload_failures_are_redacted() {
    let mut ports = TestPorts::default();
    ports
        .receipts
        .expect_upload()
        .returning(|_| Err(Error::internal("pool exhausted")));

    let (status, body) = call_json(ports, pdf_upload()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], UPLOAD_FAILED_MESSAGE);
}

#[rstest]
#[actix_web::test]
async fn upload_without_session_is_unauthorised() {
    let app = actix_test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(TestPorts::default().into_state())
            .service(web::scope("/api/v1").service(upload_receipt)),
    )
    .await;

    let res = actix_test::call_service(&app, pdf_upload().to_request()).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["success"], false);
}

#[rstest]
#[actix_web::test]
async fn list_returns_receipts() {
    let receipt = sample_receipt();
    let expected_id = receipt.id.to_string();
    let mut ports = TestPorts::default();
    ports
        .receipts_query
        .expect_list()
        .withf(|user_id| user_id.as_ref() == USER)
        .returning(move |_| Ok(vec![receipt.clone()]));

    let (status, body) = call_json(
        ports,
        actix_test::TestRequest::get().uri("/api/v1/receipts"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], expected_id);
    assert_eq!(body[0]["status"], "processing");
    assert_eq!(body[0]["fileName"], "lunch.pdf");
}

#[rstest]
#[actix_web::test]
async fn status_reports_current_state() {
    let receipt_id = ReceiptId::random();
    let mut ports = TestPorts::default();
    ports
        .receipts_query
        .expect_status()
        .withf(move |_, id| id == &receipt_id)
        .returning(|_, _| Ok(ReceiptStatus::Completed));

    let (status, body) = call_json(
        ports,
        actix_test::TestRequest::get().uri(&format!("/api/v1/receipts/status?id={receipt_id}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["id"], receipt_id.to_string());
}

#[rstest]
#[case::absent("/api/v1/receipts/status")]
#[case::blank("/api/v1/receipts/status?id=")]
#[actix_web::test]
async fn status_requires_id(#[case] uri: &str) {
    let (status, body) = call_json(
        TestPorts::default(),
        actix_test::TestRequest::get().uri(uri),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], RECEIPT_ID_REQUIRED_MESSAGE);
}

#[rstest]
#[actix_web::test]
async fn malformed_id_is_bad_request() {
    let (status, body) = call_json(
        TestPorts::default(),
        actix_test::TestRequest::get().uri("/api/v1/receipts/not-a-uuid"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "id");
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[rstest]
#[actix_web::test]
async fn get_maps_not_found() {
    let mut ports = TestPorts::default();
    ports
        .receipts_query
        .expect_get()
        .returning(|_, _| Err(Error::not_found(RECEIPT_NOT_FOUND_MESSAGE)));

    let (status, body) = call_json(
        ports,
        actix_test::TestRequest::get().uri(&format!("/api/v1/receipts/{}", ReceiptId::random())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], RECEIPT_NOT_FOUND_MESSAGE);
}

#[rstest]
#[actix_web::test]
async fn download_url_is_returned() {
    let mut ports = TestPorts::default();
    ports.receipts_query.expect_download_url().returning(|_, _| {
        Ok(Url::parse("http://localhost:8080/files/abc.pdf").expect("url"))
    });

    let (status, body) = call_json(
        ports,
        actix_test::TestRequest::get().uri(&format!(
            "/api/v1/receipts/{}/download-url",
            ReceiptId::random()
        )),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "http://localhost:8080/files/abc.pdf");
}

#[rstest]
#[actix_web::test]
async fn delete_returns_no_content() {
    let receipt_id = ReceiptId::random();
    let mut ports = TestPorts::default();
    ports
        .receipts
        .expect_delete()
        .withf(move |user_id, id| user_id.as_ref() == USER && id == &receipt_id)
        .times(1)
        .returning(|_, _| Ok(()));

    let res = call(
        ports,
        actix_test::TestRequest::delete().uri(&format!("/api/v1/receipts/{receipt_id}")),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
