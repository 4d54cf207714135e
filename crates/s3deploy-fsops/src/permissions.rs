//! Best-effort permission normalisation for an extracted release.
//!
//! # Design
//! - Individual failures become [`PermissionWarning`]s in the report; nothing here aborts
//!   an install.
//! - Only regular files are touched; directories are walked but keep their modes.
//! - Explicit scripts are applied after the walk so they win over the flag rules.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

#[cfg(unix)]
use std::{fs, io, os::unix::fs::PermissionsExt, path::Component};

#[cfg(unix)]
use nix::sys::stat::Mode;
#[cfg(unix)]
use tracing::{debug, info};
#[cfg(unix)]
use walkdir::WalkDir;

/// Suffix that marks a file as a script needing the owner-execute bit.
pub const SCRIPT_SUFFIX: &str = ".sh";

/// Flags controlling how a release tree is normalised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionPolicy {
    /// Add the group-write bit to every regular file.
    pub group_writable: bool,
    /// Clear every "other" bit on every regular file.
    pub remove_other_permissions: bool,
    /// Release-relative paths that must become owner-executable.
    pub scripts: Vec<String>,
}

/// What a normalisation pass changed and what it could not do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionReport {
    /// Regular files whose mode was rewritten during the walk.
    pub files_updated: usize,
    /// Explicit scripts that exist and are now owner-executable.
    pub scripts_marked: Vec<String>,
    /// Problems encountered; each was also logged.
    pub warnings: Vec<PermissionWarning>,
}

impl PermissionReport {
    fn warn(&mut self, warning: PermissionWarning) {
        warn!(warning = %warning, "permission normalisation warning");
        self.warnings.push(warning);
    }
}

/// A non-fatal problem found while normalising permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermissionWarning {
    /// A listed script does not exist in the release.
    MissingScript {
        /// Script path as supplied.
        script: String,
    },
    /// A listed script is absolute or climbs out of the release.
    InvalidScriptPath {
        /// Script path as supplied.
        script: String,
    },
    /// The directory walk could not visit a path.
    Walk {
        /// Path the walk failed on, when known.
        path: Option<PathBuf>,
        /// Error detail.
        detail: String,
    },
    /// Reading or writing a file's mode failed.
    Chmod {
        /// File whose mode could not be read or set.
        path: PathBuf,
        /// Error detail.
        detail: String,
    },
    /// The platform has no unix permission bits.
    Unsupported {
        /// Target operating system.
        platform: &'static str,
    },
}

impl fmt::Display for PermissionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScript { script } => write!(f, "script '{script}' not found in release"),
            Self::InvalidScriptPath { script } => {
                write!(f, "script '{script}' is not a path inside the release")
            }
            Self::Walk {
                path: Some(path),
                detail,
            } => write!(f, "could not walk {}: {detail}", path.display()),
            Self::Walk { path: None, detail } => write!(f, "could not walk release: {detail}"),
            Self::Chmod { path, detail } => {
                write!(f, "could not update mode of {}: {detail}", path.display())
            }
            Self::Unsupported { platform } => {
                write!(f, "permission normalisation is not supported on {platform}")
            }
        }
    }
}

/// Normalise permissions below `root` according to `policy`.
///
/// Never fails; every problem is returned as a warning in the report.
#[cfg(unix)]
#[must_use]
pub fn normalize(root: &Path, policy: &PermissionPolicy) -> PermissionReport {
    let mut report = PermissionReport::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.warn(PermissionWarning::Walk {
                    path: err.path().map(Path::to_path_buf),
                    detail: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match apply_mode(path, |mode| policy_mode(path, mode, policy)) {
            Ok(true) => report.files_updated += 1,
            Ok(false) => {}
            Err(err) => report.warn(PermissionWarning::Chmod {
                path: path.to_path_buf(),
                detail: err.to_string(),
            }),
        }
    }

    for script in &policy.scripts {
        mark_script(root, script, &mut report);
    }

    info!(
        root = %root.display(),
        files_updated = report.files_updated,
        scripts_marked = report.scripts_marked.len(),
        warnings = report.warnings.len(),
        "permissions normalised"
    );
    report
}

/// Normalise permissions below `root` according to `policy`.
///
/// Unix permission bits do not exist here, so this only reports that fact.
#[cfg(not(unix))]
#[must_use]
pub fn normalize(root: &Path, policy: &PermissionPolicy) -> PermissionReport {
    let _ = (root, policy);
    let mut report = PermissionReport::default();
    report.warn(PermissionWarning::Unsupported {
        platform: std::env::consts::OS,
    });
    report
}

#[cfg(unix)]
fn mark_script(root: &Path, script: &str, report: &mut PermissionReport) {
    let relative = Path::new(script);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes {
        report.warn(PermissionWarning::InvalidScriptPath {
            script: script.to_string(),
        });
        return;
    }

    let path = root.join(relative);
    match apply_mode(&path, |mode| mode | mode_bit(Mode::S_IXUSR)) {
        Ok(changed) => {
            debug!(script, changed, "script marked executable");
            report.scripts_marked.push(script.to_string());
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            report.warn(PermissionWarning::MissingScript {
                script: script.to_string(),
            });
        }
        Err(err) => report.warn(PermissionWarning::Chmod {
            path,
            detail: err.to_string(),
        }),
    }
}

/// Mode a regular file should carry under `policy`, starting from `mode`.
#[cfg(unix)]
fn policy_mode(path: &Path, mode: u32, policy: &PermissionPolicy) -> u32 {
    let mut desired = mode;
    if policy.group_writable {
        desired |= mode_bit(Mode::S_IWGRP);
    }
    if policy.remove_other_permissions {
        desired &= !mode_bit(Mode::S_IRWXO);
    }
    if is_script(path) {
        desired |= mode_bit(Mode::S_IXUSR);
    }
    desired
}

/// Rewrite the mode of `path` when `update` changes it. Returns whether a write happened.
#[cfg(unix)]
fn apply_mode(path: &Path, update: impl FnOnce(u32) -> u32) -> io::Result<bool> {
    let current = fs::metadata(path)?.permissions().mode() & 0o7777;
    let desired = update(current);
    if desired == current {
        return Ok(false);
    }
    fs::set_permissions(path, fs::Permissions::from_mode(desired))?;
    Ok(true)
}

#[cfg(unix)]
fn mode_bit(mode: Mode) -> u32 {
    u32::from(mode.bits())
}

#[cfg(unix)]
fn is_script(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|name| name.ends_with(SCRIPT_SUFFIX))
}
