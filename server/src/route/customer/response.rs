use crate::controller::Exhaust;
use application::transfer::{ClientRentalDto, QuotaDto};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kernel::prelude::entity::RentalStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct ClientRentalResponse {
    rental_id: i64,
    copy_id: String,
    #[serde(with = "time::serde::rfc3339")]
    rented_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    due_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    returned_at: Option<OffsetDateTime>,
    title: String,
    release_year: i32,
    duration_minutes: i32,
    poster_url: Option<String>,
    penalty: Decimal,
    status: RentalStatus,
}

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    active_rentals: i64,
    max_active_rentals: i32,
    can_rent: bool,
}

impl IntoResponse for QuotaResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<Vec<ClientRentalDto>> for Presenter {
    type To = Json<Vec<ClientRentalResponse>>;
    fn emit(&self, input: Vec<ClientRentalDto>) -> Self::To {
        let result = input
            .into_iter()
            .map(|rental| ClientRentalResponse {
                rental_id: rental.rental_id,
                copy_id: rental.copy_id,
                rented_at: rental.rented_at,
                due_at: rental.due_at,
                returned_at: rental.returned_at,
                title: rental.title,
                release_year: rental.release_year,
                duration_minutes: rental.duration_minutes,
                poster_url: rental.poster_url,
                penalty: rental.penalty,
                status: rental.status,
            })
            .collect::<Vec<_>>();

        Json::from(result)
    }
}

impl Exhaust<QuotaDto> for Presenter {
    type To = QuotaResponse;
    fn emit(&self, input: QuotaDto) -> Self::To {
        QuotaResponse {
            active_rentals: input.active_rentals,
            max_active_rentals: input.max_active_rentals,
            can_rent: input.can_rent,
        }
    }
}
