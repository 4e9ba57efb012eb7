use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct ReleaseYear(i32);

impl ReleaseYear {
    pub fn new(year: impl Into<i32>) -> Self {
        Self(year.into())
    }
}
