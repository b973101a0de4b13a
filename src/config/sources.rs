//! Env File Discovery
//!
//! Locates a `.env` file and merges it into the process environment. The
//! candidates are tried in order and the first one that loads wins:
//!
//! 1. `.env` next to the running executable
//! 2. `.env` in the current working directory
//! 3. `.env` in the parent of the working directory, loaded with override
//!    semantics so its values replace variables that are already set
//!
//! Finding nothing is not an error; configuration then comes from the
//! process environment alone.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

/// Name of the override file searched for in each candidate directory.
pub const ENV_FILE_NAME: &str = ".env";

/// Which source supplied the env file, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvOrigin {
    ExecutableDir,
    WorkingDir,
    ProjectRoot,
    ProcessOnly,
}

impl std::fmt::Display for EnvOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnvOrigin::ExecutableDir => "executable directory",
            EnvOrigin::WorkingDir => "working directory",
            EnvOrigin::ProjectRoot => "project root",
            EnvOrigin::ProcessOnly => "process environment only",
        };
        f.write_str(name)
    }
}

/// One place an env file may live.
#[derive(Debug, Clone)]
pub struct EnvCandidate {
    pub origin: EnvOrigin,
    pub path: PathBuf,
    /// Replace variables that are already set in the process environment
    pub override_existing: bool,
}

/// Outcome of env file discovery.
///
/// Discovery runs before the logger exists, so warnings are kept here and
/// emitted later through [`EnvReport::log`].
#[derive(Debug, Clone)]
pub struct EnvReport {
    pub origin: EnvOrigin,
    pub path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl EnvReport {
    /// Writes the discovery outcome to the log.
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!(warning = %warning, "env file warning");
        }
        match &self.path {
            Some(path) => info!(
                origin = %self.origin,
                path = %path.display(),
                "loaded environment file"
            ),
            None => info!("no .env file found, using process environment variables"),
        }
    }
}

// == Candidates ==
/// Builds the standard candidate list for this process.
///
/// Directories that cannot be determined are skipped with a warning.
pub fn default_candidates() -> (Vec<EnvCandidate>, Vec<String>) {
    let mut candidates = Vec::with_capacity(3);
    let mut warnings = Vec::new();

    match std::env::current_exe() {
        Ok(exe) => {
            if let Some(dir) = exe.parent() {
                candidates.push(EnvCandidate {
                    origin: EnvOrigin::ExecutableDir,
                    path: dir.join(ENV_FILE_NAME),
                    override_existing: false,
                });
            }
        }
        Err(e) => warnings.push(format!("cannot determine executable path: {e}")),
    }

    match std::env::current_dir() {
        Ok(dir) => {
            candidates.push(EnvCandidate {
                origin: EnvOrigin::WorkingDir,
                path: dir.join(ENV_FILE_NAME),
                override_existing: false,
            });
        }
        Err(e) => warnings.push(format!("cannot determine working directory: {e}")),
    }

    candidates.push(EnvCandidate {
        origin: EnvOrigin::ProjectRoot,
        path: Path::new("..").join(ENV_FILE_NAME),
        override_existing: true,
    });

    (candidates, warnings)
}

// == Loading ==
fn load_file(candidate: &EnvCandidate) -> Result<(), dotenvy::Error> {
    if candidate.override_existing {
        dotenvy::from_path_override(&candidate.path)
    } else {
        dotenvy::from_path(&candidate.path)
    }
}

/// Tries each candidate in order and stops at the first one that loads.
///
/// Missing files are skipped silently; files that exist but fail to parse
/// produce a warning and the search moves on.
pub fn load_from(candidates: &[EnvCandidate]) -> EnvReport {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if !candidate.path.is_file() {
            continue;
        }
        match load_file(candidate) {
            Ok(()) => {
                return EnvReport {
                    origin: candidate.origin,
                    path: Some(candidate.path.clone()),
                    warnings,
                };
            }
            Err(e) => warnings.push(format!(
                "cannot load {}: {e}",
                candidate.path.display()
            )),
        }
    }

    EnvReport {
        origin: EnvOrigin::ProcessOnly,
        path: None,
        warnings,
    }
}

static ENV_REPORT: OnceLock<EnvReport> = OnceLock::new();

/// Loads the env file once per process.
///
/// Later calls return the report of the first call without touching the
/// filesystem again.
pub fn load_env_files() -> &'static EnvReport {
    ENV_REPORT.get_or_init(|| {
        let (candidates, mut warnings) = default_candidates();
        let mut report = load_from(&candidates);
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        report
    })
}
