use hostbridge_body::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("writing rendered view failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ViewError> for BridgeError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Io(e) => BridgeError::Io(e),
            other => BridgeError::ContentWriter(other.to_string()),
        }
    }
}
