use crate::controller::Intake;
use application::transfer::{CheckQuotaDto, GetClientRentalsDto};

#[derive(Debug)]
pub struct GetRentalsRequest {
    customer_id: i64,
}

impl GetRentalsRequest {
    pub fn new(customer_id: i64) -> Self {
        Self { customer_id }
    }
}

#[derive(Debug)]
pub struct GetQuotaRequest {
    customer_id: i64,
}

impl GetQuotaRequest {
    pub fn new(customer_id: i64) -> Self {
        Self { customer_id }
    }
}

pub struct Transformer;

impl Intake<GetRentalsRequest> for Transformer {
    type To = GetClientRentalsDto;
    fn emit(&self, input: GetRentalsRequest) -> Self::To {
        GetClientRentalsDto {
            customer_id: input.customer_id,
        }
    }
}

impl Intake<GetQuotaRequest> for Transformer {
    type To = CheckQuotaDto;
    fn emit(&self, input: GetQuotaRequest) -> Self::To {
        CheckQuotaDto {
            customer_id: input.customer_id,
        }
    }
}
