//! `quill patch`: rewrite the program id literal in a single file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use quill_session::identity::validate_public_key;
use quill_session::{IdentityPatcher, QuillConfig};

use crate::style;

pub fn run_patch(file: &Path, key: &str, project: Option<PathBuf>) -> anyhow::Result<()> {
    validate_public_key(key).with_context(|| format!("{key} is not a program id"))?;
    let root = match project {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let patcher = IdentityPatcher::from_config(&QuillConfig::load(&root).identity);
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    match patcher.patch_text(&text, key) {
        Ok(patched) if !patched.changed => {
            println!("{} already declares {}", file.display(), style::accent(key));
        }
        Ok(patched) => {
            fs::write(file, patched.text)
                .with_context(|| format!("failed to write {}", file.display()))?;
            let previous = patched.span.value(&text);
            println!(
                "{}",
                style::success(format!("Patched {} ({previous} -> {key})", file.display()))
            );
        }
        Err(skipped) => {
            eprintln!(
                "{}",
                style::warning(format!("Warning: {} left unchanged: {skipped}", file.display()))
            );
        }
    }
    Ok(())
}
