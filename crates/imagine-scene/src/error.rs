use std::io;
use std::path::PathBuf;

use imagine_ecs::EcsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error("scene runtime is not running")]
    NotRunning,

    #[error("scene runtime is already running")]
    AlreadyRunning,

    #[error("failed to access scene file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid scene document: {0}")]
    Json(#[from] serde_json::Error),
}
