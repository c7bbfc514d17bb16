//! End-to-end hoisting: extract, merge, serialize, prove equivalence.

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::info;

use crate::equivalence::check_equivalence;
use crate::error::HoistError;
use crate::extractor::extract;
use crate::node::Node;
use crate::types::{HoistOptions, HoistReport};

/// A transformed document that passed the equivalence check.
#[derive(Debug, Clone)]
pub struct Hoisted {
    /// Serialized transformed document.
    pub document: String,
    pub report: HoistReport,
}

/// Hoist every inline schema in `source` and return the verified result.
///
/// # Errors
///
/// Returns any extraction, merge, or serialization error, or
/// `HoistError::EquivalenceDivergence` if the result is not equivalent to
/// the input.
pub fn hoist(source: &str, options: &HoistOptions) -> Result<Hoisted, HoistError> {
    let (document, report) = transform(source, options)?;
    check_equivalence(source, &document, options)?;
    Ok(Hoisted { document, report })
}

/// Hoist `source` into the file at `output`.
///
/// The document is staged in a temporary file next to `output`, and the
/// equivalence check runs against what was written. The file only replaces
/// `output` if the check passes; otherwise the staged file is removed.
pub fn hoist_to_file(
    source: &str,
    output: &Path,
    options: &HoistOptions,
) -> Result<HoistReport, HoistError> {
    let (document, report) = transform(source, options)?;
    commit_verified(source, &document, output, options)?;
    Ok(report)
}

/// Stage `document` beside `output`, check it as read back from disk, and
/// rename it into place only if it is equivalent to `source`.
fn commit_verified(
    source: &str,
    document: &str,
    output: &Path,
    options: &HoistOptions,
) -> Result<(), HoistError> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let write_error = |source: std::io::Error| HoistError::WriteError {
        path: output.to_path_buf(),
        source,
    };

    let mut staged = stage_beside(dir, output).map_err(write_error)?;
    staged
        .write_all(document.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(write_error)?;

    let written = std::fs::read_to_string(staged.path()).map_err(|source| HoistError::ReadError {
        path: staged.path().to_path_buf(),
        source,
    })?;
    // Dropping `staged` on error removes it
    check_equivalence(source, &written, options)?;

    staged.persist(output).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Create the staged file with the permissions `output` will end up with:
/// those of the file being replaced, or the umask default for a new one.
fn stage_beside(dir: &Path, output: &Path) -> std::io::Result<NamedTempFile> {
    let existing = std::fs::metadata(output).ok().map(|m| m.permissions());

    let mut builder = Builder::new();
    if existing.is_none() {
        default_permissions(&mut builder);
    }
    let staged = builder.tempfile_in(dir)?;

    if let Some(permissions) = existing {
        staged.as_file().set_permissions(permissions)?;
    }
    Ok(staged)
}

#[cfg(unix)]
fn default_permissions(builder: &mut Builder<'_, '_>) {
    use std::os::unix::fs::PermissionsExt;
    // Masked by the process umask at creation, like a plain `fs::write`
    builder.permissions(std::fs::Permissions::from_mode(0o666));
}

#[cfg(not(unix))]
fn default_permissions(_builder: &mut Builder<'_, '_>) {}

fn transform(source: &str, options: &HoistOptions) -> Result<(String, HoistReport), HoistError> {
    let mut doc = Node::parse(source)?;
    let extracted = extract(&mut doc, options)?;
    let document = doc.render(options.format)?;

    info!(count = extracted.len(), "extracted inline schemas");
    Ok((document, HoistReport { extracted }))
}
