//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("cache error: {0}")]
    Cache(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for MapperError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, resp) => {
                MapperError::Http(format!("{} returned status {}", resp.get_url(), code))
            }
            ureq::Error::Transport(t) => MapperError::Http(t.to_string()),
        }
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(e: serde_json::Error) -> Self {
        MapperError::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for MapperError {
    fn from(e: toml::de::Error) -> Self {
        MapperError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for MapperError {
    fn from(e: toml::ser::Error) -> Self {
        MapperError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
