use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Referenced customer, plan, film, copy or open rental does not exist.
    NotFound,
    /// The customer already holds as many open rentals as the plan permits.
    QuotaExceeded,
    /// Every copy of the film is checked out or locked by another rental.
    NoAvailableCopy,
    Timeout,
    Internal,
}

impl KernelError {
    /// Infrastructure faults, as opposed to rejected business rules.
    pub fn is_storage(&self) -> bool {
        matches!(self, KernelError::Timeout | KernelError::Internal)
    }
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "Requested entity not found"),
            KernelError::QuotaExceeded => write!(f, "Rental quota of the plan exceeded"),
            KernelError::NoAvailableCopy => write!(f, "No available copy for the film"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
