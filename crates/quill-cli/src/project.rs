//! Loading a project directory into a document store and writing it back.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use quill_session::{DocumentStore, IdentityStore, QuillConfig};
use tracing::{debug, warn};

use crate::style;

/// File extensions loaded from `src/`.
const SOURCE_EXTENSIONS: &[&str] = &["rs", "py", "toml"];

/// Where the identity is kept when `[identity] store_path` is unset.
const DEFAULT_IDENTITY_FILE: &str = ".quill/identity.json";

pub struct Project {
    pub root: PathBuf,
    pub config: QuillConfig,
    pub store: Arc<DocumentStore>,
}

impl Project {
    pub fn open(project: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = resolve_root(project)?;
        let config = QuillConfig::load(&root);
        let src = root.join("src");
        if !src.is_dir() {
            bail!("no src directory in {}", root.display());
        }
        let mut relative = Vec::new();
        collect_sources(&root, Path::new("src"), &mut relative)?;
        relative.sort();

        let store = DocumentStore::new();
        for path in &relative {
            let contents = fs::read_to_string(root.join(path))
                .with_context(|| format!("failed to read {}", path.display()))?;
            store.insert(path.to_string_lossy(), contents)?;
        }
        debug!("Loaded {} source files from {}", relative.len(), root.display());
        Ok(Self {
            root,
            config,
            store: Arc::new(store),
        })
    }

    /// Writes documents whose content differs from disk. Returns the store
    /// paths that were written.
    pub fn write_back(&self) -> anyhow::Result<Vec<String>> {
        let mut written = Vec::new();
        for (path, content) in self.store.snapshot_files() {
            let target = self.disk_path(&path);
            let on_disk = fs::read_to_string(&target).ok();
            if on_disk.as_deref() == Some(content.as_str()) {
                continue;
            }
            fs::write(&target, content)
                .with_context(|| format!("failed to write {}", target.display()))?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn disk_path(&self, store_path: &str) -> PathBuf {
        self.root.join(store_path.trim_start_matches('/'))
    }

    pub fn load_identities(&self) -> anyhow::Result<IdentityStore> {
        load_identities(&self.root, &self.config)
    }
}

fn resolve_root(project: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match project {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

pub fn identity_file(root: &Path, config: &QuillConfig) -> PathBuf {
    config
        .identity
        .store_path
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_IDENTITY_FILE))
}

/// Reads the persisted identity and applies the configured custom key.
pub fn load_identities(root: &Path, config: &QuillConfig) -> anyhow::Result<IdentityStore> {
    let path = identity_file(root, config);
    let identities = IdentityStore::load(&path)
        .with_context(|| format!("failed to load identity from {}", path.display()))?;
    if let Some(key) = &config.build.public_key {
        identities
            .set_custom_public_key(Some(key.clone()))
            .context("invalid [build] public_key")?;
    }
    Ok(identities)
}

fn collect_sources(root: &Path, relative: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let dir = root.join(relative);
    let entries =
        fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))?;
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name.starts_with('.') {
            continue;
        }
        let next = relative.join(file_name.as_ref());
        let path = entry.path();
        if path.is_dir() {
            collect_sources(root, &next, out)?;
            continue;
        }
        let source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)));
        if source {
            out.push(next);
        }
    }
    Ok(())
}

/// `quill program-id`
pub fn run_program_id(project: Option<PathBuf>) -> anyhow::Result<()> {
    let root = resolve_root(project)?;
    let config = QuillConfig::load(&root);
    let identities = load_identities(&root, &config)?;
    match identities.effective_public_key() {
        Ok(key) => {
            println!("{}", style::accent(key));
            Ok(())
        }
        Err(err) => {
            warn!("No program identity under {}", root.display());
            Err(err.into())
        }
    }
}
