//! LaTeX compilation of the mutated template.
//!
//! The engine runs in the template directory. Exit status is not trusted
//! (pdflatex exits non-zero on warnings), so success means the PDF exists
//! after every pass.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::CompilerConfig;
use crate::retry::RetryPolicy;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Auxiliary files left behind by pdflatex/latexmk/bibtex.
const ARTIFACT_SUFFIXES: &[&str] = &[
    ".aux",
    ".log",
    ".out",
    ".toc",
    ".fdb_latexmk",
    ".fls",
    ".synctex.gz",
    ".blg",
    ".bbl",
];

// Windows sharing/lock violations (ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION).
const WINDOWS_LOCK_ERRORS: [i32; 2] = [32, 33];

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{engine} not found or not runnable; install a TeX distribution")]
    EngineMissing { engine: String },

    #[error("pass {pass} timed out after {}s", .limit.as_secs())]
    Timeout { pass: u32, limit: Duration },

    #[error("pass {pass} produced no PDF:\n{output}")]
    NoArtifact { pass: u32, output: String },

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Runs the configured TeX engine over the template's main document.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    engine: String,
    workdir: PathBuf,
    main_file: String,
    output_dir: PathBuf,
    passes: u32,
    pass_timeout: Duration,
    lock_retry: RetryPolicy,
}

impl LatexCompiler {
    pub fn new(config: &CompilerConfig, workdir: &Path) -> Self {
        let output_dir = if config.output_dir.is_absolute() {
            config.output_dir.clone()
        } else {
            workdir.join(&config.output_dir)
        };

        Self {
            engine: config.engine.clone(),
            workdir: workdir.to_path_buf(),
            main_file: config.main_file.clone(),
            output_dir,
            passes: config.passes.max(1),
            pass_timeout: Duration::from_secs(config.pass_timeout_secs),
            lock_retry: RetryPolicy::fixed(
                config.lock_retry_attempts,
                Duration::from_millis(config.lock_retry_delay_ms),
            ),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the PDF the engine writes next to the main document.
    pub fn artifact_path(&self) -> PathBuf {
        self.workdir
            .join(Path::new(&self.main_file).with_extension("pdf"))
    }

    /// Compiles and moves the PDF to `<output_dir>/<output_name>.pdf`.
    /// Failures are logged; the caller only gets the verdict.
    pub async fn compile(&self, output_name: &str) -> bool {
        match self.compile_to(output_name).await {
            Ok(target) => {
                info!(pdf = %target.display(), "PDF generated");
                true
            }
            Err(e) => {
                error!("LaTeX compilation failed: {e}");
                false
            }
        }
    }

    pub async fn compile_to(&self, output_name: &str) -> Result<PathBuf, CompileError> {
        self.check_engine().await?;

        let artifact = self.artifact_path();
        self.lock_retry
            .run("remove stale PDF", is_lock_error, || async {
                remove_if_exists(&artifact)
            })
            .await
            .map_err(|source| CompileError::Io {
                action: "removing stale",
                path: artifact.clone(),
                source,
            })?;

        for pass in 1..=self.passes {
            self.run_pass(pass).await?;
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| CompileError::Io {
            action: "creating",
            path: self.output_dir.clone(),
            source,
        })?;
        let target = self.output_dir.join(format!("{output_name}.pdf"));

        self.lock_retry
            .run("relocate PDF", is_lock_error, || async {
                std::fs::rename(&artifact, &target)
            })
            .await
            .map_err(|source| CompileError::Io {
                action: "moving PDF to",
                path: target.clone(),
                source,
            })?;

        Ok(target)
    }

    /// `<engine> --version` must succeed before any pass is attempted.
    pub async fn check_engine(&self) -> Result<(), CompileError> {
        let missing = || CompileError::EngineMissing {
            engine: self.engine.clone(),
        };

        let probe = Command::new(&self.engine)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(VERSION_CHECK_TIMEOUT, probe).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => {
                debug!(status = %output.status, "engine version check failed");
                Err(missing())
            }
            Ok(Err(e)) => {
                debug!("engine version check could not start: {e}");
                Err(missing())
            }
            Err(_) => Err(missing()),
        }
    }

    async fn run_pass(&self, pass: u32) -> Result<(), CompileError> {
        debug!(pass, engine = %self.engine, "running LaTeX pass");

        let run = Command::new(&self.engine)
            .arg("-interaction=nonstopmode")
            .arg(&self.main_file)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.pass_timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(_)) => {
                return Err(CompileError::EngineMissing {
                    engine: self.engine.clone(),
                })
            }
            Err(_) => {
                return Err(CompileError::Timeout {
                    pass,
                    limit: self.pass_timeout,
                })
            }
        };

        if !self.artifact_path().exists() {
            return Err(CompileError::NoArtifact {
                pass,
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }
        if !output.status.success() {
            warn!(pass, status = %output.status, "engine reported errors but produced a PDF");
        }
        Ok(())
    }

    /// Removes auxiliary files from the template directory. Returns how many were deleted.
    pub fn cleanup_artifacts(&self) -> usize {
        let entries = match std::fs::read_dir(&self.workdir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan {} for artifacts: {e}", self.workdir.display());
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !ARTIFACT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => debug!("Could not remove {name}: {e}"),
            }
        }
        debug!(removed, "LaTeX artifacts cleaned up");
        removed
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// A file held open by a viewer shows up as a permission or sharing error.
fn is_lock_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || err
            .raw_os_error()
            .is_some_and(|code| WINDOWS_LOCK_ERRORS.contains(&code))
}
