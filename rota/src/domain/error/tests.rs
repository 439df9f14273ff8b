//! Tests for domain error construction.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn shift_error() -> DomainError {
    DomainError::invalid_request("Please enter both Start and End.")
}

#[rstest]
fn keeps_the_manager_facing_message(shift_error: DomainError) {
    assert_eq!(shift_error.code(), ErrorCode::InvalidRequest);
    assert_eq!(shift_error.message(), "Please enter both Start and End.");
    assert_eq!(shift_error.to_string(), "Please enter both Start and End.");
}

#[rstest]
#[case(ErrorCode::Unauthorized, "Sign in to continue.")]
#[case(ErrorCode::ServiceUnavailable, "The rota service is unavailable.")]
fn blank_messages_fall_back_to_the_category_default(
    #[case] code: ErrorCode,
    #[case] expected: &str,
) {
    assert_eq!(DomainError::new(code, "  ").message(), expected);
}

#[rstest]
fn try_new_refuses_blank_messages() {
    assert_eq!(
        DomainError::try_new(ErrorCode::NotFound, "\t"),
        Err(DomainErrorValidationError::EmptyMessage)
    );
}

#[rstest]
#[case(DomainError::unauthorized("x"), ErrorCode::Unauthorized, false)]
#[case(DomainError::not_found("x"), ErrorCode::NotFound, false)]
#[case(DomainError::service_unavailable("x"), ErrorCode::ServiceUnavailable, true)]
#[case(DomainError::internal("x"), ErrorCode::InternalError, false)]
fn constructors_set_codes(
    #[case] error: DomainError,
    #[case] expected: ErrorCode,
    #[case] retryable: bool,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().is_retryable(), retryable);
}

#[rstest]
fn details_are_addressable_by_key(shift_error: DomainError) {
    let error = shift_error.with_details(json!({ "field": "shift", "shiftDate": "2026-02-09" }));
    assert_eq!(error.detail("shiftDate"), Some(&json!("2026-02-09")));
    assert_eq!(error.detail("missing"), None);
}

#[test]
fn codes_render_in_snake_case() {
    assert_eq!(ErrorCode::ServiceUnavailable.to_string(), "service_unavailable");
}
