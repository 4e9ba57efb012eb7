use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Running time in minutes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct FilmDuration(i32);

impl FilmDuration {
    pub fn new(minutes: impl Into<i32>) -> Self {
        Self(minutes.into())
    }
}
