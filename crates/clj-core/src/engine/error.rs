use super::boxes::BoxesError;
use super::config::ConfigError;
use super::grid::GridError;
use crate::core::atoms::AtomsError;
use crate::core::kernel::KernelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Kernel evaluation failed: {source}")]
    Kernel {
        #[from]
        source: KernelError,
    },

    #[error("Invalid atom data: {source}")]
    Atoms {
        #[from]
        source: AtomsError,
    },

    #[error("Spatial partition failed: {source}")]
    Boxes {
        #[from]
        source: BoxesError,
    },

    #[error("Invalid grid: {source}")]
    Grid {
        #[from]
        source: GridError,
    },
}
