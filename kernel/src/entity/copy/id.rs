use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[derive(Serialize, Deserialize, Fromln, AsRefln)]
pub struct CopyId(String);

impl CopyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}
