use serde::{Deserialize, Serialize};
use time::Duration;
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Fromln, AsRefln, Serialize, Deserialize)]
pub struct LoanDays(i32);

impl LoanDays {
    pub fn new(days: impl Into<i32>) -> Self {
        Self(days.into())
    }

    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.0))
    }
}
