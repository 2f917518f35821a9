use crate::exceptions::PatchError;
use std::fs;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Atomically write text to a file using a temporary file + rename strategy.
pub fn atomic_write_text<P: AsRef<Path>>(path: P, text: &str) -> Result<(), PatchError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Create temp file in the same directory to ensure atomic rename works across filesystems
    let mut temp_file = NamedTempFile::new_in(dir)?;

    temp_file.write_all(text.as_bytes())?;

    // Carry over the target's permissions, a fresh temp file is 0600
    if let Ok(meta) = fs::metadata(path) {
        temp_file.as_file().set_permissions(meta.permissions())?;
    }

    // Persist replaces the destination path atomically
    temp_file
        .persist(path)
        .map_err(|e| PatchError::Io(e.error))?;

    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PatchError> {
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Resolves `rel` against `root`, refusing paths that leave the root.
///
/// Returns the absolute target and its normalized root-relative form.
pub fn resolve_within_root(root: &Path, rel: &Path) -> Result<(PathBuf, String), PatchError> {
    if rel.is_absolute() {
        return Err(PatchError::InvalidInput(format!(
            "Path '{}' must be relative to the project root",
            rel.display()
        )));
    }

    let root_abs = if root.is_absolute() {
        normalize_path(root)
    } else {
        normalize_path(&std::env::current_dir()?.join(root))
    };
    let target = normalize_path(&root_abs.join(rel));

    let rel_path = target.strip_prefix(&root_abs).map_err(|_| {
        PatchError::InvalidInput(format!(
            "Path '{}' is outside the project root",
            rel.display()
        ))
    })?;

    // Symlinks may still point elsewhere physically
    if let (Ok(root_canon), Ok(target_canon)) =
        (fs::canonicalize(&root_abs), fs::canonicalize(&target))
        && !target_canon.starts_with(&root_canon)
    {
        return Err(PatchError::InvalidInput(format!(
            "Path '{}' resolves outside the project root",
            rel.display()
        )));
    }

    let rel_str = rel_path.to_string_lossy().replace('\\', "/");
    Ok((target, rel_str))
}

fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut acc, component| {
            match component {
                // ".." means pop the last segment
                Component::ParentDir => {
                    acc.pop();
                }
                // "." means do nothing
                Component::CurDir => {}
                // Normal segments, Root, and Prefix just get pushed
                c => acc.push(c.as_os_str()),
            };
            acc
        })
}
