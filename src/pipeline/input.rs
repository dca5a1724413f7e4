//! Upload acceptance - which sources may be imported at all
//!
//! A source is accepted when its name ends in `.csv` or its content type is
//! `text/csv`, and it is no larger than the configured limit. Rejections
//! happen before any preview is built.

use miette::Diagnostic;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default upload limit: 10 MiB
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Source name used for text read from stdin
pub const STDIN_NAME: &str = "-";

#[derive(Debug, Error, Diagnostic)]
pub enum InputRejected {
    #[error("'{name}' is not a CSV file")]
    #[diagnostic(
        code(vct::input::wrong_type),
        help("only files ending in .csv (or text/csv content) can be imported")
    )]
    WrongType { name: String },

    #[error("'{name}' is {size} bytes, larger than the {limit} byte limit")]
    #[diagnostic(code(vct::input::too_large), help("split the file into smaller imports"))]
    TooLarge { name: String, size: u64, limit: u64 },
}

#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rejected(#[from] InputRejected),

    #[error("failed to read '{name}': {source}")]
    #[diagnostic(code(vct::input::read))]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{name}' is not valid UTF-8 text")]
    #[diagnostic(code(vct::input::encoding), help("save the file as UTF-8 and try again"))]
    Encoding { name: String },
}

/// Describes an upload before its contents are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMeta<'a> {
    pub name: &'a str,
    pub content_type: Option<&'a str>,
    pub size: u64,
}

/// Check an upload against the type and size rules
pub fn check_upload(meta: &UploadMeta<'_>, limit: u64) -> Result<(), InputRejected> {
    let csv_name = meta.name.to_ascii_lowercase().ends_with(".csv");
    let csv_type = meta
        .content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("text/csv"));

    if !csv_name && !csv_type {
        return Err(InputRejected::WrongType {
            name: meta.name.to_string(),
        });
    }
    if meta.size > limit {
        return Err(InputRejected::TooLarge {
            name: meta.name.to_string(),
            size: meta.size,
            limit,
        });
    }
    Ok(())
}

/// Read a file path, or stdin for `-`, enforcing the upload rules
///
/// Stdin is treated as pasted `text/csv`.
pub fn read_source(source: &Path, limit: u64) -> Result<String, InputError> {
    let name = source.display().to_string();

    let bytes = if name == STDIN_NAME {
        let mut buf = Vec::new();
        // Read one byte past the limit so oversize input is detected without buffering it all
        std::io::stdin()
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|source| InputError::Read {
                name: name.clone(),
                source,
            })?;
        check_upload(
            &UploadMeta {
                name: &name,
                content_type: Some("text/csv"),
                size: buf.len() as u64,
            },
            limit,
        )?;
        buf
    } else {
        let metadata = std::fs::metadata(source).map_err(|source| InputError::Read {
            name: name.clone(),
            source,
        })?;
        check_upload(
            &UploadMeta {
                name: &name,
                content_type: None,
                size: metadata.len(),
            },
            limit,
        )?;
        std::fs::read(source).map_err(|source| InputError::Read {
            name: name.clone(),
            source,
        })?
    };

    debug!(source = %name, bytes = bytes.len(), "read import source");
    String::from_utf8(bytes).map_err(|_| InputError::Encoding { name })
}
