#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("std::io error: `{0}`")]
    StdIO(#[from] std::io::Error),
    #[error("json error: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("no readable catalog file among the candidate paths")]
    CatalogNotFound,
}

pub type Result<T> = std::result::Result<T, Error>;
