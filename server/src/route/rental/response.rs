use crate::controller::Exhaust;
use application::transfer::{RentalDto, ReturnDto};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct RentalResponse {
    id: i64,
    customer_id: i64,
    copy_id: String,
    #[serde(with = "time::serde::rfc3339")]
    rented_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    due_at: Option<OffsetDateTime>,
}

impl IntoResponse for RentalResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    penalty: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    returned_at: OffsetDateTime,
}

impl IntoResponse for ReturnResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<RentalDto> for Presenter {
    type To = RentalResponse;
    fn emit(&self, input: RentalDto) -> Self::To {
        RentalResponse {
            id: input.id,
            customer_id: input.customer_id,
            copy_id: input.copy_id,
            rented_at: input.rented_at,
            due_at: input.due_at,
        }
    }
}

impl Exhaust<ReturnDto> for Presenter {
    type To = ReturnResponse;
    fn emit(&self, input: ReturnDto) -> Self::To {
        ReturnResponse {
            penalty: input.penalty,
            returned_at: input.returned_at,
        }
    }
}
