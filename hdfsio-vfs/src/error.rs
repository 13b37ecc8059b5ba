//! Native library load errors

use hdfsio_config::HDFS_HOME_ENV;
use hdfsio_core::Status;
use std::path::PathBuf;
use thiserror::Error;

/// Why the native client could not be made available
///
/// The dynamic loader's own text already names the library or symbol,
/// so it is rendered as is.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The installation root is not configured
    #[error("Environment variable {var} not set")]
    MissingEnv { var: &'static str },

    /// `dlopen` failed
    #[error("{source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A required entry point is missing from the library
    #[error("{source}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
}

impl LoadError {
    pub fn missing_home() -> Self {
        LoadError::MissingEnv { var: HDFS_HOME_ENV }
    }
}

impl From<LoadError> for Status {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingEnv { .. } => Status::failed_precondition(err.to_string()),
            LoadError::Open { .. } | LoadError::Symbol { .. } => Status::not_found(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdfsio_core::Code;

    #[test]
    fn test_missing_env_status() {
        let status: Status = LoadError::missing_home().into();
        assert_eq!(status.code(), Code::FailedPrecondition);
        assert_eq!(
            status.to_string(),
            "Failed precondition: Environment variable HADOOP_HDFS_HOME not set"
        );
    }
}
