use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use shared::{
    error::MSG_NOT_FOUND,
    protocol::{SearchRequest, SEARCH_ROUTE},
};
use tokio::{net::TcpListener, sync::Notify};

use crate::error::{MSG_NO_INFORMATION, MSG_SEARCH_FAILED};

fn record_a() -> InvitationRecord {
    InvitationRecord {
        name: "A".into(),
        email: "a@x.com".into(),
        phone_number: "0912345678".into(),
        letter_url: Some("http://x/y".into()),
    }
}

/// Answers from a fixed table and counts requests.
#[derive(Default)]
struct TableTransport {
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl TableTransport {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl LookupTransport for TableTransport {
    async fn search(&self, phone_number: &str) -> Result<InvitationRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match phone_number {
            "0912345678" => Ok(record_a()),
            "0500000000" => Err(LookupError::EmptyResult),
            _ => Err(LookupError::Rejected {
                status: 404,
                message: MSG_NOT_FOUND.to_string(),
            }),
        }
    }
}

struct PanickingTransport;

#[async_trait]
impl LookupTransport for PanickingTransport {
    async fn search(&self, _phone_number: &str) -> Result<InvitationRecord, LookupError> {
        panic!("transport blew up");
    }
}

fn form() -> (LookupForm, Arc<TableTransport>) {
    let transport = Arc::new(TableTransport::default());
    let form = LookupForm::with_transport(transport.clone());
    (form, transport)
}

#[test]
fn typing_keeps_digits_only_and_caps_length() {
    let (form, _) = form();
    for ch in "09a12-3456789999".chars() {
        form.key_down(FormKey::Char(ch));
    }
    assert_eq!(form.snapshot().phone_number, "0912345678");
    assert!(matches!(form.key_down(FormKey::Char('x')), KeyOutcome::Blocked));
    assert_eq!(form.snapshot().phone_number, "0912345678");
}

#[tokio::test]
async fn extra_digit_on_full_field_keeps_previous_outcome() {
    let (form, _) = form();
    form.input("0912345678");
    form.submit().wait().await;
    assert_eq!(form.snapshot().result, Some(record_a()));

    assert!(matches!(form.key_down(FormKey::Char('1')), KeyOutcome::Ignored));
    let state = form.snapshot();
    assert_eq!(state.phone_number, "0912345678");
    assert_eq!(state.result, Some(record_a()));
}

#[test]
fn paste_replaces_value_with_its_digits() {
    let (form, _) = form();
    form.input("111");
    form.paste("Phone: (091) 234-5678, thanks!");
    assert_eq!(form.snapshot().phone_number, "0912345678");
    form.paste("+84 912 345 678 999");
    assert_eq!(form.snapshot().phone_number, "8491234567");
    form.paste("no digits at all");
    assert_eq!(form.snapshot().phone_number, "");
}

#[test]
fn key_filter_allows_navigation_and_clipboard_shortcuts() {
    let (form, _) = form();
    form.input("0912");
    for key in [
        FormKey::Tab,
        FormKey::Delete,
        FormKey::ArrowLeft,
        FormKey::ArrowRight,
        FormKey::ArrowUp,
        FormKey::ArrowDown,
        FormKey::Home,
        FormKey::End,
        FormKey::Shortcut('a'),
        FormKey::Shortcut('C'),
        FormKey::Shortcut('v'),
        FormKey::Shortcut('x'),
    ] {
        assert!(matches!(form.key_down(key), KeyOutcome::Ignored), "{key:?}");
    }
    assert!(matches!(form.key_down(FormKey::Shortcut('z')), KeyOutcome::Blocked));
    assert!(matches!(form.key_down(FormKey::Char('#')), KeyOutcome::Blocked));
    assert_eq!(form.snapshot().phone_number, "0912");

    assert!(matches!(form.key_down(FormKey::Backspace), KeyOutcome::Edited));
    assert_eq!(form.snapshot().phone_number, "091");
    form.input("");
    assert!(matches!(form.key_down(FormKey::Backspace), KeyOutcome::Ignored));
}

#[tokio::test]
async fn short_or_empty_input_never_sends_a_request() {
    let (form, transport) = form();

    let submission = form.submit();
    assert!(matches!(submission, Submission::Blocked(PhoneInputError::Missing)));
    assert_eq!(form.snapshot().error.as_deref(), Some("phone number required"));

    for len in 1..PHONE_NUMBER_LEN {
        form.input(&"9".repeat(len));
        let submission = form.submit();
        assert!(matches!(
            submission,
            Submission::Blocked(PhoneInputError::WrongLength)
        ));
        let state = form.snapshot();
        assert_eq!(
            state.error.as_deref(),
            Some("phone number must be exactly 10 digits")
        );
        assert!(!state.is_searching);
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_search_sets_result_only() {
    let (form, transport) = form();
    form.input("0912345678");
    form.submit().wait().await;

    let state = form.snapshot();
    assert_eq!(state.result, Some(record_a()));
    assert_eq!(state.error, None);
    assert!(!state.is_searching);
    assert_eq!(
        state.letter_link().map(|url| url.to_string()),
        Some("http://x/y".to_string())
    );
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_search_sets_error_only() {
    let (form, _) = form();
    form.input("0999999999");
    form.submit().wait().await;

    let state = form.snapshot();
    assert_eq!(state.result, None);
    assert_eq!(state.error.as_deref(), Some(MSG_NOT_FOUND));
    assert!(!state.is_searching);

    form.input("0500000000");
    form.submit().wait().await;
    assert_eq!(form.snapshot().error.as_deref(), Some(MSG_NO_INFORMATION));
}

#[tokio::test]
async fn searching_flag_is_visible_while_request_is_in_flight() {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(TableTransport::gated(gate.clone()));
    let form = LookupForm::with_transport(transport.clone());

    form.input("0912345678");
    let submission = form.submit();
    assert!(submission.is_started());
    let state = form.snapshot();
    assert!(state.is_searching);
    assert_eq!(state.result, None);
    assert_eq!(state.error, None);
    assert!(!state.can_submit());
    assert!(matches!(form.submit(), Submission::Busy));

    gate.notify_one();
    submission.wait().await;
    let state = form.snapshot();
    assert!(!state.is_searching);
    assert_eq!(state.result, Some(record_a()));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn edits_during_a_search_are_refused() {
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(TableTransport::gated(gate.clone()));
    let form = LookupForm::with_transport(transport.clone());

    form.input("0912345678");
    let submission = form.submit();
    assert!(submission.is_started());

    form.input("0999999999");
    form.paste("0888888888");
    assert!(matches!(form.key_down(FormKey::Backspace), KeyOutcome::Blocked));
    assert!(matches!(form.key_down(FormKey::Char('5')), KeyOutcome::Blocked));
    assert_eq!(form.snapshot().phone_number, "0912345678");

    gate.notify_one();
    submission.wait().await;
    let state = form.snapshot();
    let result = state.result.expect("result for the searched number");
    assert_eq!(result.phone_number, state.phone_number);

    form.input("0999999999");
    let state = form.snapshot();
    assert_eq!(state.phone_number, "0999999999");
    assert_eq!(state.result, None);
}

#[tokio::test]
async fn enter_key_and_submit_action_behave_the_same() {
    for input in ["0912345678", "0999999999", "0912", ""] {
        let (by_button, _) = form();
        let (by_enter, _) = form();
        by_button.paste(input);
        by_enter.paste(input);

        by_button.submit().wait().await;
        match by_enter.key_down(FormKey::Enter) {
            KeyOutcome::Submitted(submission) => submission.wait().await,
            other => panic!("enter should submit, got {other:?}"),
        }
        assert_eq!(by_button.snapshot(), by_enter.snapshot(), "{input:?}");
    }
}

#[tokio::test]
async fn editing_clears_previous_outcome() {
    let (form, _) = form();
    form.input("0912345678");
    form.submit().wait().await;
    assert!(form.snapshot().result.is_some());

    form.key_down(FormKey::Backspace);
    let state = form.snapshot();
    assert_eq!(state.result, None);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn panicking_transport_still_clears_searching_flag() {
    let form = LookupForm::new(PanickingTransport);
    form.input("0912345678");
    form.submit().wait().await;
    assert!(!form.snapshot().is_searching);
}

#[test]
fn letter_link_requires_absolute_url() {
    let mut state = FormState {
        result: Some(InvitationRecord {
            letter_url: Some("letters/a.pdf".into()),
            ..record_a()
        }),
        ..FormState::default()
    };
    assert!(state.letter_link().is_none());

    state.result = Some(InvitationRecord {
        letter_url: None,
        ..record_a()
    });
    assert!(state.letter_link().is_none());
}

async fn fake_search(Json(request): Json<SearchRequest>) -> axum::response::Response {
    match request.phone_number.as_deref() {
        Some("0912345678") => Json(serde_json::json!({
            "success": true,
            "data": {
                "name": "A",
                "email": "a@x.com",
                "phoneNumber": "0912345678",
                "letterURL": "http://x/y",
            }
        }))
        .into_response(),
        Some("0200000000") => Json(serde_json::json!({ "success": false })).into_response(),
        Some("0400000000") => (StatusCode::BAD_REQUEST, Json(serde_json::json!({})))
            .into_response(),
        Some("0500000000") => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": MSG_NOT_FOUND })),
        )
            .into_response(),
    }
}

async fn spawn_fake_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(SEARCH_ROUTE, post(fake_search));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn http_client_decodes_success_envelope() {
    let client = HttpLookupClient::new(spawn_fake_server().await);
    assert!(client.search_url().ends_with("/api/search"));
    assert!(!client.search_url().contains("//api"));

    let record = client.search("0912345678").await.expect("record");
    assert_eq!(record, record_a());
}

#[tokio::test]
async fn http_client_maps_error_responses() {
    let client = HttpLookupClient::new(spawn_fake_server().await);

    let err = client.search("0999999999").await.expect_err("not found");
    assert!(matches!(err, LookupError::Rejected { status: 404, .. }));
    assert_eq!(err.user_message(), MSG_NOT_FOUND);

    let err = client.search("0400000000").await.expect_err("no message");
    assert_eq!(err.user_message(), MSG_NO_INFORMATION);

    let err = client.search("0200000000").await.expect_err("empty");
    assert!(matches!(err, LookupError::EmptyResult));

    let err = client.search("0500000000").await.expect_err("not json");
    assert!(matches!(err, LookupError::Decode(_)));
    assert_eq!(err.user_message(), MSG_SEARCH_FAILED);
}

#[tokio::test]
async fn unreachable_server_shows_generic_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let form = LookupForm::new(HttpLookupClient::new(format!("http://{addr}")));
    form.input("0912345678");
    form.submit().wait().await;

    let state = form.snapshot();
    assert_eq!(state.error.as_deref(), Some(MSG_SEARCH_FAILED));
    assert!(!state.is_searching);
}
