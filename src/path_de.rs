use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages. Trailing input is an error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(src);
    let out = serde_path_to_error::deserialize(&mut de).map_err(path_error)?;
    de.end().map_err(root_error)?;
    Ok(out)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let out = serde_path_to_error::deserialize(&mut de).map_err(path_error)?;
    de.end().map_err(root_error)?;
    Ok(out)
}

/// Typed view of an already decoded value, e.g. a dumped record.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(path_error)
}

fn path_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    Error::Decode { path, message: err.into_inner().to_string() }
}

fn root_error(err: serde_json::Error) -> Error {
    Error::Decode { path: ".".into(), message: err.to_string() }
}
