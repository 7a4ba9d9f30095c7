//! Building checktype images from local source directories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use walkdir::WalkDir;

use basalt_core::{Checktype, Error, Result};
use basalt_containers::ContainerEngine;

use crate::image::{self, CheckImage};
use crate::manifest::Manifest;

/// Tag given to locally built checktype images.
const LOCAL_TAG: &str = "local";

/// A local directory containing the source of a checktype.
#[derive(Debug, Clone)]
pub struct CheckSource {
    dir: PathBuf,
}

impl CheckSource {
    pub fn new(dir: impl Into<PathBuf>) -> CheckSource {
        CheckSource { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checktype name, taken from the directory basename.
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Deterministic image reference for this checktype.
    pub fn image_tag(&self) -> String {
        format!("{}:{}", self.name(), LOCAL_TAG)
    }

    /// Resolves this source into a checktype descriptor, building its image
    /// only when the source tree changed since the last build.
    pub async fn build<C: ContainerEngine>(&self, engine: &C) -> Result<Checktype> {
        let image = match self.cached(engine).await? {
            Some(image) => {
                info!("no changes in checktype {}, reusing {}", self.name(), image.name);
                image
            }
            None => self.rebuild(engine).await?,
        };
        image.checktype()
    }

    /// The cache record for this source, if its fingerprint is still valid.
    async fn cached<C: ContainerEngine>(&self, engine: &C) -> Result<Option<CheckImage>> {
        let tag = self.image_tag();
        let image = match CheckImage::inspect(engine, &tag).await {
            Ok(image) => image,
            Err(e) if e.is_no_checktype_image() => {
                debug!("no previous build of {tag}: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let current = image::encode_fingerprint(self.last_modified()?);
        let recorded = image::encode_fingerprint(image.last_modified);
        if current != recorded {
            debug!("{tag} is stale: source {current}, image {recorded}");
            return Ok(None);
        }
        Ok(Some(image))
    }

    /// Compiles the source, archives the tree and builds a fresh image.
    async fn rebuild<C: ContainerEngine>(&self, engine: &C) -> Result<CheckImage> {
        let (manifest, manifest_text) = Manifest::from_dir(&self.dir)?;

        self.compile().await?;

        // Taken after compiling so the produced binaries are part of the
        // fingerprint; an untouched tree then matches on the next run.
        let fingerprint = self.last_modified()?;
        let context = self.archive()?;
        let labels = image::build_labels(&self.name(), &manifest_text, fingerprint);

        let tag = self.image_tag();
        info!("building image {tag} from {}", self.dir.display());
        let output = engine.build_image(&[tag.clone()], &labels, context).await?;
        debug!("build output for {tag}: {}", output.trim_end());

        Ok(CheckImage {
            name: tag,
            checktype_name: self.name(),
            manifest,
            last_modified: fingerprint,
        })
    }

    /// Compiles the checktype when its directory is a Cargo crate.
    ///
    /// Checktype containers run on Linux, so crates are built statically
    /// against the host architecture's musl target. Directories without a
    /// crate manifest (Dockerfile-only checktypes) have nothing to compile.
    async fn compile(&self) -> Result<()> {
        if !self.dir.join("Cargo.toml").is_file() {
            debug!("no crate manifest in {}, skipping compile", self.dir.display());
            return Ok(());
        }

        let target = format!("{}-unknown-linux-musl", std::env::consts::ARCH);
        info!("compiling checktype {} for {target}", self.name());
        let status = tokio::process::Command::new("cargo")
            .args(["build", "--release", "--target", &target])
            .current_dir(&self.dir)
            .status()
            .await
            .map_err(|e| Error::Compile {
                dir: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(Error::Compile {
                dir: self.dir.display().to_string(),
                reason: format!("cargo build finished with {status}"),
            });
        }
        Ok(())
    }

    /// Newest modification time across the files of the source tree.
    ///
    /// Directories named `.git` are skipped entirely; directory timestamps
    /// themselves never count, only files do.
    fn last_modified(&self) -> Result<DateTime<Utc>> {
        let walk_err = |e: walkdir::Error| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("walking {}: {e}", self.dir.display()),
            ))
        };

        let mut latest: Option<DateTime<Utc>> = None;
        let walker = WalkDir::new(&self.dir)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));
        for entry in walker {
            let entry = entry.map_err(walk_err)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let modified: DateTime<Utc> = entry
                .metadata()
                .map_err(walk_err)?
                .modified()?
                .into();
            if latest.map_or(true, |l| modified > l) {
                latest = Some(modified);
            }
        }
        latest.ok_or_else(|| Error::EmptyCheckDir {
            dir: self.dir.display().to_string(),
        })
    }

    /// Archives the source tree as the image build context.
    fn archive(&self) -> Result<Vec<u8>> {
        let archive_err = |e: std::io::Error| Error::Archive {
            dir: self.dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut builder = tar::Builder::new(Vec::new());
        builder.append_dir_all(".", &self.dir).map_err(archive_err)?;
        builder.into_inner().map_err(archive_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Read;

    use tempfile::TempDir;

    use crate::image::LAST_MODIFIED_LABEL;
    use crate::manifest::MANIFEST_FILE;
    use crate::testutil::FakeEngine;

    const MANIFEST_TEXT: &str = concat!(
        "description = \"checks tls configuration\"\n",
        "options = '{\"port\": 443}'\n",
        "asset_types = [\"Hostname\", \"WebAddress\"]\n",
    );

    /// A `tlsaudit` checktype source with a manifest and a Dockerfile.
    fn fixture() -> (TempDir, CheckSource) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("tlsaudit");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), MANIFEST_TEXT).unwrap();
        fs::write(dir.join("Dockerfile"), "FROM scratch\n").unwrap();
        let source = CheckSource::new(&dir);
        (root, source)
    }

    #[test]
    fn test_name_and_tag() {
        let (_root, source) = fixture();
        assert_eq!(source.name(), "tlsaudit");
        assert_eq!(source.image_tag(), "tlsaudit:local");
    }

    #[tokio::test]
    async fn test_build_produces_descriptor() {
        let (_root, source) = fixture();
        let engine = FakeEngine::new();

        let checktype = source.build(&engine).await.unwrap();
        assert_eq!(checktype.name, "tlsaudit");
        assert_eq!(checktype.image, "tlsaudit:local");
        assert_eq!(checktype.description, "checks tls configuration");
        assert_eq!(checktype.options.get("port"), Some(&serde_json::json!(443)));
        assert_eq!(checktype.assets, vec!["Hostname", "WebAddress"]);
        assert_eq!(engine.build_count(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_source_reuses_image() {
        let (_root, source) = fixture();
        let engine = FakeEngine::new();

        let first = source.build(&engine).await.unwrap();
        let second = source.build(&engine).await.unwrap();
        assert_eq!(engine.build_count(), 1);
        assert_eq!(first.image, second.image);
        assert_eq!(first.options, second.options);
    }

    #[tokio::test]
    async fn test_stale_fingerprint_triggers_rebuild() {
        let (_root, source) = fixture();
        let engine = FakeEngine::new();

        source.build(&engine).await.unwrap();

        // Age the recorded fingerprint instead of touching the tree, so the
        // comparison outcome does not depend on filesystem time resolution.
        let mut labels = engine.labels_of("tlsaudit:local");
        labels.insert(
            LAST_MODIFIED_LABEL.to_string(),
            "2001-01-01T00:00:00Z".to_string(),
        );
        engine.set_labels("tlsaudit:local", labels);

        source.build(&engine).await.unwrap();
        assert_eq!(engine.build_count(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_labels_trigger_rebuild() {
        let (_root, source) = fixture();
        let engine = FakeEngine::new();

        source.build(&engine).await.unwrap();

        let mut labels = engine.labels_of("tlsaudit:local");
        labels.remove(LAST_MODIFIED_LABEL);
        engine.set_labels("tlsaudit:local", labels);

        source.build(&engine).await.unwrap();
        assert_eq!(engine.build_count(), 2);
    }

    #[test]
    fn test_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("hollow");
        fs::create_dir(&dir).unwrap();
        // A .git subtree does not count as content.
        fs::create_dir(dir.join(".git")).unwrap();
        fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let err = CheckSource::new(&dir).last_modified().unwrap_err();
        assert!(matches!(err, Error::EmptyCheckDir { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("bare");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Dockerfile"), "FROM scratch\n").unwrap();
        let engine = FakeEngine::new();

        let err = CheckSource::new(&dir).build(&engine).await.unwrap_err();
        assert!(matches!(err, Error::MissingManifest { .. }), "got {err:?}");
        assert_eq!(engine.build_count(), 0);
    }

    #[test]
    fn test_last_modified_skips_git_dir() {
        let (_root, source) = fixture();
        let git = source.dir().join(".git");
        fs::create_dir(&git).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let before = source.last_modified().unwrap();
        // Push the .git content far into the future; the fingerprint must
        // not move.
        let future = std::time::SystemTime::now() + std::time::Duration::from_secs(86_400 * 30);
        let head = fs::File::options()
            .write(true)
            .open(git.join("HEAD"))
            .unwrap();
        head.set_modified(future).unwrap();
        let after = source.last_modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_archive_contains_tree() {
        let (_root, source) = fixture();

        let bytes = source.archive().unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let mut path = entry.path().unwrap().display().to_string();
            if let Some(stripped) = path.strip_prefix("./") {
                path = stripped.to_string();
            }
            names.push(path);
        }
        assert!(names.iter().any(|n| n == "Dockerfile"), "entries: {names:?}");
        assert!(
            names.iter().any(|n| n == MANIFEST_FILE),
            "entries: {names:?}"
        );

        // Entries must be readable back, the daemon consumes this stream.
        let mut archive = tar::Archive::new(bytes.as_slice());
        for entry in archive.entries().unwrap() {
            let mut content = String::new();
            entry.unwrap().read_to_string(&mut content).unwrap();
        }
    }
}
