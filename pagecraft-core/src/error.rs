use pagecraft_render::PageError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Component {id} not found")]
    NotFound { id: i64 },

    #[error("Slug '{slug}' is already taken")]
    SlugTaken { slug: String },
}
