//! Loading fit configurations from YAML

use std::fs;
use std::path::Path;

use super::schema::FitSpec;
use super::validate::validate_spec;
use crate::error::{Error, Result};

/// Parse and validate a YAML document; `origin` names it in error messages
pub fn parse_config(yaml: &str, origin: &Path) -> Result<FitSpec> {
    let spec: FitSpec = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;
    validate_spec(&spec)?;
    Ok(spec)
}

/// Read, parse and validate a YAML fit configuration
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FitSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading config file {}", path.display()), e))?;
    parse_config(&yaml, path)
}
