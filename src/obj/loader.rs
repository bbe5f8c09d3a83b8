//! Read an OBJ file from disk and parse it

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ObjError;
use super::model::ParsedObject;
use super::parser::{parse_with, ParseOptions};

/// Model loading errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {size} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ObjError,
    },
}

/// Load and parse one `.obj` file, rejecting files larger than `max_bytes`.
pub async fn load_obj(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    max_bytes: u64,
) -> Result<Vec<ParsedObject>, LoadError> {
    let path = path.as_ref();
    let text = read_model_text(path, max_bytes).await?;

    debug!(path = %path.display(), bytes = text.len(), "Loaded OBJ text");

    parse_with(&text, options).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read model text after checking its size against `max_bytes`
pub async fn read_model_text(path: &Path, max_bytes: u64) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    if size > max_bytes {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }

    tokio::fs::read_to_string(path).await.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_load_obj_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let objects = assert_ok!(load_obj(&path, &ParseOptions::default(), 1024).await);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "tri");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = assert_err!(load_obj(dir.path().join("nope.obj"), &ParseOptions::default(), 1024).await);
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn test_oversize_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.obj");
        std::fs::write(&path, "v 0 0 0\n".repeat(64)).unwrap();

        let err = assert_err!(load_obj(&path, &ParseOptions::default(), 16).await);
        assert!(matches!(err, LoadError::TooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.obj");
        std::fs::write(&path, "v 0 0 0\nf 1 2 3\n").unwrap();

        let err = assert_err!(load_obj(&path, &ParseOptions::default(), 1024).await);
        assert!(err.to_string().contains("bad.obj"));
        assert!(matches!(
            err,
            LoadError::Parse {
                source: ObjError::MalformedIndex { line: 2, .. },
                ..
            }
        ));
    }
}
