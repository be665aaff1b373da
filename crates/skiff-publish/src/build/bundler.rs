//! Artifact production

use crate::error::BuildError;
use async_trait::async_trait;
use skiff_types::{ArtifactFormat, BuildConfig, ModuleSource};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Upper bound on a custom build command
pub const CUSTOM_BUILD_TIMEOUT: Duration = Duration::from_secs(30);

/// Compiled worker ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub main: ModuleSource,
    /// Additional modules, never including the entry point
    pub modules: Vec<ModuleSource>,
}

/// Produces the worker artifact from the project's entry point
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Run the project's build step, if any, and check the entry exists
    async fn prepare(&self, entry: &Path, build: &BuildConfig) -> Result<(), BuildError>;

    /// Infer the artifact format from the entry point
    async fn detect_format(&self, entry: &Path) -> Result<ArtifactFormat, BuildError>;

    /// Produce the artifact in the given format
    async fn bundle(&self, entry: &Path, format: ArtifactFormat) -> Result<Bundle, BuildError>;

    /// Bundler name for logging
    fn name(&self) -> &str;
}

/// Publishes the entry file as-is
pub struct PassthroughBundler {
    build_timeout: Duration,
}

impl PassthroughBundler {
    pub fn new() -> Self {
        Self {
            build_timeout: CUSTOM_BUILD_TIMEOUT,
        }
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    async fn run_custom_build(&self, command: &str, cwd: Option<&PathBuf>) -> Result<(), BuildError> {
        info!(command, "Running custom build");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let status = tokio::time::timeout(self.build_timeout, cmd.status())
            .await
            .map_err(|_| BuildError::CommandTimedOut {
                command: command.to_string(),
                seconds: self.build_timeout.as_secs(),
            })?
            .map_err(|source| BuildError::CommandSpawn {
                command: command.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: command.to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

impl Default for PassthroughBundler {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_entry(entry: &Path) -> Result<Vec<u8>, BuildError> {
    tokio::fs::read(entry)
        .await
        .map_err(|source| BuildError::ReadEntry {
            path: entry.to_path_buf(),
            source,
        })
}

/// Whether the source exports a module default or named bindings
fn looks_like_modules(source: &str) -> bool {
    source.contains("export default") || source.contains("export {")
}

#[async_trait]
impl Bundler for PassthroughBundler {
    #[instrument(skip(self, build), fields(entry = %entry.display()))]
    async fn prepare(&self, entry: &Path, build: &BuildConfig) -> Result<(), BuildError> {
        if let Some(command) = &build.command {
            self.run_custom_build(command, build.cwd.as_ref()).await?;
        }

        if tokio::fs::metadata(entry).await.is_err() {
            return Err(BuildError::UnresolvedEntry(entry.to_path_buf()));
        }
        Ok(())
    }

    async fn detect_format(&self, entry: &Path) -> Result<ArtifactFormat, BuildError> {
        let source = read_entry(entry).await?;
        let format = if looks_like_modules(&String::from_utf8_lossy(&source)) {
            ArtifactFormat::Modules
        } else {
            ArtifactFormat::ServiceWorker
        };
        debug!(%format, "Detected artifact format");
        Ok(format)
    }

    async fn bundle(&self, entry: &Path, format: ArtifactFormat) -> Result<Bundle, BuildError> {
        let content = read_entry(entry).await?;
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.js".to_string());

        Ok(Bundle {
            main: ModuleSource::new(name, content, format.main_module_type()),
            modules: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_types::ModuleType;

    #[tokio::test]
    async fn test_detects_modules_format() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("index.mjs");
        tokio::fs::write(&entry, "export default { fetch() {} }")
            .await
            .unwrap();

        let bundler = PassthroughBundler::new();
        assert_eq!(
            bundler.detect_format(&entry).await.unwrap(),
            ArtifactFormat::Modules
        );

        let bundle = bundler.bundle(&entry, ArtifactFormat::Modules).await.unwrap();
        assert_eq!(bundle.main.name, "index.mjs");
        assert_eq!(bundle.main.module_type, ModuleType::Esm);
    }

    #[tokio::test]
    async fn test_detects_service_worker_format() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("worker.js");
        tokio::fs::write(&entry, "addEventListener('fetch', () => {})")
            .await
            .unwrap();

        let bundler = PassthroughBundler::new();
        assert_eq!(
            bundler.detect_format(&entry).await.unwrap(),
            ArtifactFormat::ServiceWorker
        );
    }

    #[tokio::test]
    async fn test_missing_entry_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("dist/index.js");

        let err = PassthroughBundler::new()
            .prepare(&entry, &BuildConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedEntry(_)));
    }

    #[tokio::test]
    async fn test_custom_build_produces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildConfig {
            command: Some("mkdir -p dist && echo 'export default {}' > dist/index.js".into()),
            cwd: Some(dir.path().to_path_buf()),
        };

        let entry = dir.path().join("dist/index.js");
        PassthroughBundler::new()
            .prepare(&entry, &build)
            .await
            .unwrap();
        assert!(entry.exists());
    }

    #[tokio::test]
    async fn test_failing_custom_build() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildConfig {
            command: Some("exit 3".into()),
            cwd: Some(dir.path().to_path_buf()),
        };

        let err = PassthroughBundler::new()
            .prepare(&dir.path().join("index.js"), &build)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::CommandFailed { status: 3, .. }));
    }

    #[tokio::test]
    async fn test_custom_build_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildConfig {
            command: Some("sleep 5".into()),
            cwd: Some(dir.path().to_path_buf()),
        };

        let err = PassthroughBundler::new()
            .with_build_timeout(Duration::from_millis(100))
            .prepare(&dir.path().join("index.js"), &build)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::CommandTimedOut { .. }));
    }
}
