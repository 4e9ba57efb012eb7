use crate::controller::Intake;
use application::transfer::{RentFilmDto, ReturnCopyDto};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RentRequest {
    customer_id: i64,
    film_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    copy_id: String,
}

pub struct Transformer;

impl Intake<RentRequest> for Transformer {
    type To = RentFilmDto;
    fn emit(&self, input: RentRequest) -> Self::To {
        RentFilmDto {
            customer_id: input.customer_id,
            film_id: input.film_id,
        }
    }
}

impl Intake<ReturnRequest> for Transformer {
    type To = ReturnCopyDto;
    fn emit(&self, input: ReturnRequest) -> Self::To {
        ReturnCopyDto {
            copy_id: input.copy_id,
        }
    }
}
