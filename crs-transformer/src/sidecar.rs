use std::fs;
use std::path::{Path, PathBuf};

use projection_catalog::EpsgCode;

use crate::error::ProjectionError;

/// Writes the plain-text projection definition next to the primary
/// artifact, as `<primary>.prj`. Returns the sidecar path.
pub fn write_projection_sidecar(
    primary: &Path,
    code: EpsgCode,
) -> Result<PathBuf, ProjectionError> {
    let definition = projection_catalog::lookup(code)?;
    let path = primary.with_extension("prj");
    fs::write(&path, &definition)?;
    log::info!("wrote projection sidecar {:?} ({})", path, code);
    Ok(path)
}
