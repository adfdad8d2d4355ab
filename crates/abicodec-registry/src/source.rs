//! Schema sources: anything that can produce a list of schemas to load.

use abicodec_core::{error::SchemaError, schema::Schema};
use std::path::{Path, PathBuf};

use crate::{csdl::CsdlSource, human::Declarations, json_abi::JsonAbiSource};

/// A declarative collection of schemas.
pub trait SchemaSource {
    /// Parse and validate every schema, in source order.
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError>;
}

impl SchemaSource for Vec<Schema> {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        Ok(self.clone())
    }
}

impl SchemaSource for [Schema] {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        Ok(self.to_vec())
    }
}

impl<S: SchemaSource + ?Sized> SchemaSource for &S {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        (**self).schemas()
    }
}

impl<S: SchemaSource + ?Sized> SchemaSource for Box<S> {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        (**self).schemas()
    }
}

/// File extensions recognised by [`from_path`].
pub const EXTENSIONS: &[&str] = &["csdl", "json", "abi", "sol", "txt"];

/// Read a schema file, choosing the format from its extension:
/// `.csdl` → CSDL, `.json`/`.abi` → JSON ABI, `.sol`/`.txt` → declarations.
pub fn from_path(path: &Path) -> Result<Box<dyn SchemaSource>, SchemaError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), format = %ext, "reading schema file");
    match ext.as_str() {
        "csdl" => Ok(Box::new(CsdlSource::new(text))),
        "json" | "abi" => Ok(Box::new(JsonAbiSource::new(text))),
        "sol" | "txt" => Ok(Box::new(Declarations::new(text))),
        _ => Err(SchemaError::Parse(format!(
            "{}: unrecognised schema file extension",
            path.display()
        ))),
    }
}

/// All schema files under `dir`, recursively, sorted by path.
pub fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    if !dir.is_dir() {
        return Err(SchemaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }
    let mut files = Vec::new();
    collect(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SchemaError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}
