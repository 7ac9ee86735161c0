//! Configuration and boundary errors.
//!
//! Data mismatches never show up here: the loader and dumper absorb them. What
//! remains are broken type declarations and failures at the text/file edge.
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{owner}.{field}`: forward reference `{name}` does not name a declared record type")]
    UnresolvedForwardReference {
        owner: String,
        field: String,
        name: String,
    },

    #[error("`{owner}.{field}`: generic `{origin}` with {arity} argument(s) is not supported")]
    UnsupportedGenericShape {
        owner: String,
        field: String,
        origin: String,
        arity: usize,
    },

    #[error("malformed type expression `{expr}`: {message}")]
    TypeSyntax { expr: String, message: String },

    #[error("unknown record type `{0}`")]
    UnknownRecordType(String),

    #[error("record type `{0}` declared twice")]
    DuplicateRecordType(String),

    #[error("record type `{owner}` declares field `{field}` twice")]
    DuplicateField { owner: String, field: String },

    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },

    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True when a type declaration is unusable, as opposed to bad input text or I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedForwardReference { .. }
                | Error::UnsupportedGenericShape { .. }
                | Error::TypeSyntax { .. }
                | Error::DuplicateRecordType(_)
                | Error::DuplicateField { .. }
        )
    }
}
