//! Project configuration loaded from `quill.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const CONFIG_FILES: &[&str] = &["quill.toml", ".quill.toml"];

const DEFAULT_AUTOSAVE_MS: u64 = 5_000;
const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
const DEFAULT_BUILD_TIMEOUT_MS: u64 = 60_000;

/// Store path of the file carrying the program identity declaration.
pub const DEFAULT_IDENTITY_PATH: &str = "/src/lib.rs";
/// Token preceding the quoted identity literal.
pub const DEFAULT_MARKER: &str = "declare_id";
/// Quote character delimiting the identity literal.
pub const DEFAULT_QUOTE: char = '\'';
/// Width of `!('` between the marker and the first literal character.
pub const DEFAULT_LITERAL_OFFSET: usize = 3;

/// Resolved project configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuillConfig {
    /// Project root directory.
    pub root: PathBuf,
    /// Config file path (if found).
    pub config_path: Option<PathBuf>,
    /// Editor settings.
    pub editor: EditorConfig,
    /// Identity declaration settings.
    pub identity: IdentityConfig,
    /// Compile service settings.
    pub build: BuildConfig,
}

/// `[editor]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Quiet interval before a buffer is autosaved.
    pub autosave_ms: u64,
}

impl EditorConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_ms: DEFAULT_AUTOSAVE_MS,
        }
    }
}

/// `[identity]` section: where the program id lives and how to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Store path of the identity-bearing file.
    pub path: String,
    /// Marker token preceding the literal.
    pub marker: String,
    /// Quote character delimiting the literal.
    pub quote: char,
    /// Distance from the end of the marker to the literal start.
    pub literal_offset: usize,
    /// Optional JSON file persisting the identity store.
    pub store_path: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_IDENTITY_PATH.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            quote: DEFAULT_QUOTE,
            literal_offset: DEFAULT_LITERAL_OFFSET,
            store_path: None,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Base URL of the compile service.
    pub server_url: String,
    /// Transport timeout for one build round trip.
    pub timeout_ms: u64,
    /// Custom program public key forwarded with every build.
    pub public_key: Option<String>,
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_ms: DEFAULT_BUILD_TIMEOUT_MS,
            public_key: None,
        }
    }
}

impl QuillConfig {
    /// Load configuration for a project root.
    pub fn load(root: &Path) -> Self {
        let config_path = find_config_file(root);
        let Some(path) = config_path.clone() else {
            return QuillConfig::base(root, None);
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            warn!("Failed to read quill config at {}", path.display());
            return QuillConfig::base(root, config_path);
        };
        QuillConfig::from_contents(root, config_path, &contents)
    }

    pub fn from_contents(root: &Path, config_path: Option<PathBuf>, contents: &str) -> Self {
        let mut config = QuillConfig::base(root, config_path);
        let parsed: ConfigFile = match toml::from_str(contents) {
            Ok(parsed) => parsed,
            Err(err) => {
                if let Some(path) = &config.config_path {
                    warn!("Failed to parse quill config at {}: {err}", path.display());
                } else {
                    warn!("Failed to parse quill config: {err}");
                }
                return config;
            }
        };

        config.editor = parsed.editor.into();
        config.identity = IdentityConfig::from_section(root, parsed.identity);
        config.build = parsed.build.into();
        config
    }

    fn base(root: &Path, config_path: Option<PathBuf>) -> Self {
        QuillConfig {
            root: root.to_path_buf(),
            config_path,
            editor: EditorConfig::default(),
            identity: IdentityConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl Default for QuillConfig {
    fn default() -> Self {
        QuillConfig::base(Path::new("."), None)
    }
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    editor: EditorSection,
    #[serde(default)]
    identity: IdentitySection,
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Default, Deserialize)]
struct EditorSection {
    autosave_ms: Option<u64>,
}

impl From<EditorSection> for EditorConfig {
    fn from(section: EditorSection) -> Self {
        let defaults = EditorConfig::default();
        Self {
            autosave_ms: section.autosave_ms.unwrap_or(defaults.autosave_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdentitySection {
    path: Option<String>,
    marker: Option<String>,
    quote: Option<String>,
    literal_offset: Option<usize>,
    store_path: Option<String>,
}

impl IdentityConfig {
    fn from_section(root: &Path, section: IdentitySection) -> Self {
        let defaults = IdentityConfig::default();
        let quote = match section.quote.as_deref() {
            None => defaults.quote,
            Some(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => ch,
                    _ => {
                        warn!("Ignoring identity quote {text:?}: expected a single character");
                        defaults.quote
                    }
                }
            }
        };
        let marker = match section.marker {
            Some(marker) if marker.is_empty() => {
                warn!("Ignoring empty identity marker");
                defaults.marker
            }
            Some(marker) => marker,
            None => defaults.marker,
        };
        Self {
            path: section.path.map_or(defaults.path, normalize_store_path),
            marker,
            quote,
            literal_offset: section.literal_offset.unwrap_or(defaults.literal_offset),
            store_path: section.store_path.map(|path| resolve_path(root, &path)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    server_url: Option<String>,
    timeout_ms: Option<u64>,
    public_key: Option<String>,
}

impl From<BuildSection> for BuildConfig {
    fn from(section: BuildSection) -> Self {
        let defaults = BuildConfig::default();
        Self {
            server_url: section
                .server_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.server_url),
            timeout_ms: section.timeout_ms.unwrap_or(defaults.timeout_ms),
            public_key: section.public_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

/// Store paths are absolute, `/`-separated.
pub fn normalize_store_path(path: impl AsRef<str>) -> String {
    let trimmed = path.as_ref().trim().replace('\\', "/");
    if trimmed.starts_with('/') {
        trimmed
    } else {
        format!("/{trimmed}")
    }
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        root.join(candidate)
    }
}
