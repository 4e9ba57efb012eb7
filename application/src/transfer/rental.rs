use kernel::prelude::entity::{
    DestructFilm, DestructRental, DestructRentalRecord, Penalty, Quota, Rental, RentalRecord,
    RentalStatus, ReturnedAt,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct RentalDto {
    pub id: i64,
    pub customer_id: i64,
    pub copy_id: String,
    pub rented_at: OffsetDateTime,
    pub due_at: Option<OffsetDateTime>,
}

impl From<Rental> for RentalDto {
    fn from(value: Rental) -> Self {
        let DestructRental {
            id,
            customer_id,
            copy_id,
            rented_at,
            due_at,
            ..
        } = value.into_destruct();
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            copy_id: copy_id.into(),
            rented_at: rented_at.into(),
            due_at: due_at.map(Into::into),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReturnDto {
    pub penalty: Decimal,
    pub returned_at: OffsetDateTime,
}

impl ReturnDto {
    pub fn new(penalty: Penalty, returned_at: ReturnedAt) -> Self {
        Self {
            penalty: penalty.into(),
            returned_at: returned_at.into(),
        }
    }
}

/// One line of a customer's rental history as shown on the dashboard.
#[derive(Debug, Clone)]
pub struct ClientRentalDto {
    pub rental_id: i64,
    pub copy_id: String,
    pub rented_at: OffsetDateTime,
    pub due_at: Option<OffsetDateTime>,
    pub returned_at: Option<OffsetDateTime>,
    pub title: String,
    pub release_year: i32,
    pub duration_minutes: i32,
    pub poster_url: Option<String>,
    pub penalty: Decimal,
    pub status: RentalStatus,
}

impl ClientRentalDto {
    pub fn new(record: RentalRecord, penalty: Penalty, status: RentalStatus) -> Self {
        let DestructRentalRecord { rental, film, .. } = record.into_destruct();
        let DestructRental {
            id,
            copy_id,
            rented_at,
            due_at,
            returned_at,
            ..
        } = rental.into_destruct();
        let DestructFilm {
            title,
            release_year,
            duration,
            poster_url,
            ..
        } = film.into_destruct();
        Self {
            rental_id: id.into(),
            copy_id: copy_id.into(),
            rented_at: rented_at.into(),
            due_at: due_at.map(Into::into),
            returned_at: returned_at.map(Into::into),
            title: title.into(),
            release_year: release_year.into(),
            duration_minutes: duration.into(),
            poster_url: poster_url.map(Into::into),
            penalty: penalty.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDto {
    pub active_rentals: i64,
    pub max_active_rentals: i32,
    pub can_rent: bool,
}

impl From<Quota> for QuotaDto {
    fn from(value: Quota) -> Self {
        Self {
            active_rentals: *value.active_rentals().as_ref(),
            max_active_rentals: *value.rental_limit().as_ref(),
            can_rent: value.can_rent(),
        }
    }
}

pub struct RentFilmDto {
    pub customer_id: i64,
    pub film_id: i64,
}

pub struct ReturnCopyDto {
    pub copy_id: String,
}

pub struct GetClientRentalsDto {
    pub customer_id: i64,
}

pub struct CheckQuotaDto {
    pub customer_id: i64,
}
