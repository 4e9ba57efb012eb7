use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct FilmLanguage(String);

impl FilmLanguage {
    pub fn new(language: impl Into<String>) -> Self {
        Self(language.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct Synopsis(String);

impl Synopsis {
    pub fn new(synopsis: impl Into<String>) -> Self {
        Self(synopsis.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct PosterUrl(String);

impl PosterUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}
