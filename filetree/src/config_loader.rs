use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use log::{debug, warn};
use serde::Deserialize;

use filetree_lib::{EmitTree, ListConfig, StreamOptions, TransformOption};

use crate::Cli;

/// Everything a run needs, merged from config files and the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub list_config: ListConfig,
    pub emit_tree: EmitTree,
    pub emit_files: bool,
    /// Raw transform value; checked when the stream is built.
    pub transform: Option<serde_json::Value>,
}

impl RunSettings {
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            emit_tree: self.emit_tree.clone(),
            emit_files: self.emit_files,
            transform: self.transform.clone().and_then(TransformOption::from_value),
        }
    }
}

pub fn build_run_settings(cli: &Cli, target_path: &Path) -> Result<RunSettings> {
    let mut flags = Flags::default();
    let mut patterns = PatternAccumulator::default();

    if !cli.no_config {
        if let Some(base_dirs) = BaseDirs::new() {
            let global_config_path = base_dirs.config_dir().join("filetree").join("config.toml");
            apply_config_file(&global_config_path, &mut flags, &mut patterns)?;
        } else {
            debug!("No base directories available; skipping global config search");
        }

        let local_config_path = target_path.join(".filetree.toml");
        apply_config_file(&local_config_path, &mut flags, &mut patterns)?;

        if let Some(explicit_path) = cli.config_path.as_ref() {
            if !explicit_path.exists() {
                bail!("Config file {:?} does not exist", explicit_path);
            }
            apply_config_file(explicit_path, &mut flags, &mut patterns)?;
        }
    } else if let Some(explicit_path) = cli.config_path.as_ref() {
        debug!(
            "--no-config specified; skipping explicitly requested config file {:?}",
            explicit_path
        );
    }

    // CLI overrides (highest precedence)
    if cli.emit_files {
        flags.emit_files = true;
    }
    if cli.files_only {
        flags.files_only = true;
    }
    if cli.no_tree {
        flags.emit_tree = EmitTree::Enabled(false);
    }
    if let Some(name) = cli.tree_name.as_ref() {
        if name.trim().is_empty() {
            bail!("--tree-name must not be empty");
        }
        flags.emit_tree = EmitTree::Named(name.clone());
    }
    if let Some(name) = cli.transform.as_ref() {
        flags.transform = Some(serde_json::Value::String(name.clone()));
    }

    if flags.emit_tree.artifact_name().is_none() && !flags.emit_files {
        warn!("Both the tree artifact and file emission are disabled; nothing will be written");
    }

    // CLI excludes support comma-separated patterns (e.g. -e "*.log,target/")
    for raw in &cli.exclude_patterns {
        for part in raw.split(',') {
            patterns.push(part);
        }
    }

    // Never list the artifact we are about to write
    if let Some(output_dir) = cli.output.as_ref() {
        if let Some(name) = flags.emit_tree.artifact_name() {
            if output_dir.starts_with(target_path) || output_dir.is_relative() {
                patterns.push(format!("{}.json", name));
            }
        }
    }

    Ok(RunSettings {
        list_config: ListConfig {
            target_path: target_path.to_path_buf(),
            exclude_patterns: patterns.into_vec(),
            files_only: flags.files_only,
        },
        emit_tree: flags.emit_tree,
        emit_files: flags.emit_files,
        transform: flags.transform,
    })
}

#[derive(Debug, Default)]
struct Flags {
    emit_tree: EmitTree,
    emit_files: bool,
    files_only: bool,
    transform: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
struct PatternAccumulator {
    patterns: Vec<String>,
    seen: HashSet<String>,
}

impl PatternAccumulator {
    fn push<S: AsRef<str>>(&mut self, pattern: S) {
        let candidate = pattern.as_ref().trim();
        if candidate.is_empty() {
            return;
        }
        if self.seen.insert(candidate.to_string()) {
            debug!("Adding exclude pattern: {}", candidate);
            self.patterns.push(candidate.to_string());
        } else {
            debug!("Skipping duplicate exclude pattern: {}", candidate);
        }
    }

    fn merge<I>(&mut self, iter: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for item in iter {
            self.push(item);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.patterns
    }
}

fn apply_config_file(
    path: &Path,
    flags: &mut Flags,
    patterns: &mut PatternAccumulator,
) -> Result<()> {
    if !path.exists() {
        debug!("Config file {:?} not found; skipping", path);
        return Ok(());
    }

    debug!("Loading config from {:?}", path);
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;

    let parsed: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;

    if let Some(section) = parsed.filetree {
        apply_filetree_section(section, flags, patterns)?;
    }

    Ok(())
}

fn apply_filetree_section(
    section: FiletreeSection,
    flags: &mut Flags,
    patterns: &mut PatternAccumulator,
) -> Result<()> {
    if let Some(values) = section.exclude {
        patterns.merge(values);
    }
    if let Some(value) = section.emit_tree {
        flags.emit_tree = value;
    }
    if let Some(value) = section.emit_files {
        flags.emit_files = value;
    }
    if let Some(value) = section.files_only {
        flags.files_only = value;
    }
    if let Some(value) = section.transform {
        // Kept as a raw value: a non-string is reported as a type error when
        // the stream is constructed.
        flags.transform = Some(
            serde_json::to_value(&value).context("Failed to read 'transform' setting")?,
        );
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    filetree: Option<FiletreeSection>,
}

#[derive(Debug, Deserialize)]
struct FiletreeSection {
    exclude: Option<Vec<String>>,
    emit_tree: Option<EmitTree>,
    emit_files: Option<bool>,
    files_only: Option<bool>,
    transform: Option<toml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use anyhow::Result;
    use filetree_lib::{FileTreeStream, TreeError};
    use std::collections::HashSet;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set_path(key: &'static str, path: &Path) -> Self {
            let prev = env::var(key).ok();
            env::set_var(key, path);
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(ref value) = self.prev {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn isolate_env(root: &Path) -> Vec<EnvGuard> {
        let home = root.join("home");
        let xdg = root.join("xdg_config");
        let appdata = root.join("appdata");
        for dir in [&home, &xdg, &appdata] {
            let _ = fs::create_dir_all(dir);
        }

        vec![
            EnvGuard::set_path("HOME", &home),
            EnvGuard::set_path("XDG_CONFIG_HOME", &xdg),
            EnvGuard::set_path("APPDATA", &appdata),
            EnvGuard::set_path("USERPROFILE", &home),
        ]
    }

    #[test]
    fn local_config_merges_with_cli_overrides() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("project");
        fs::create_dir_all(&target)?;

        let _guards = isolate_env(temp.path());

        fs::write(
            target.join(".filetree.toml"),
            r#"
[filetree]
emit_tree = "layout"
emit_files = false
transform = "basename"
exclude = ["node_modules/"]
"#,
        )?;

        let mut cli = Cli::test_default();
        cli.emit_files = true;
        cli.exclude_patterns = vec!["*.log".to_string()];

        let settings = build_run_settings(&cli, &target)?;

        assert_eq!(settings.emit_tree, EmitTree::Named("layout".to_string()));
        assert!(settings.emit_files);
        assert_eq!(
            settings.transform,
            Some(serde_json::Value::String("basename".to_string()))
        );
        let patterns: HashSet<_> = settings.list_config.exclude_patterns.iter().cloned().collect();
        assert!(patterns.contains("node_modules/"));
        assert!(patterns.contains("*.log"));
        assert!(FileTreeStream::new(settings.stream_options()).is_ok());

        Ok(())
    }

    #[test]
    fn no_config_skips_local_file() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("project");
        fs::create_dir_all(&target)?;

        let _guards = isolate_env(temp.path());

        fs::write(target.join(".filetree.toml"), "[filetree]\nemit_tree = false\n")?;

        let mut cli = Cli::test_default();
        cli.no_config = true;

        let settings = build_run_settings(&cli, &target)?;
        assert_eq!(settings.emit_tree, EmitTree::Enabled(true));
        assert!(!settings.emit_files);
        assert!(settings.transform.is_none());

        Ok(())
    }

    #[test]
    fn numeric_transform_in_config_is_a_type_error() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("project");
        fs::create_dir_all(&target)?;

        let _guards = isolate_env(temp.path());

        fs::write(target.join(".filetree.toml"), "[filetree]\ntransform = 1245\n")?;

        let settings = build_run_settings(&Cli::test_default(), &target)?;
        match FileTreeStream::new(settings.stream_options()) {
            Err(TreeError::InvalidTransform { found }) => assert_eq!(found, "number"),
            other => panic!("expected InvalidTransform, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn cli_tree_flags_override_config() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("project");
        fs::create_dir_all(&target)?;

        let _guards = isolate_env(temp.path());

        let explicit = temp.path().join("explicit.toml");
        fs::write(&explicit, "[filetree]\nemit_tree = \"from-file\"\n")?;

        let mut cli = Cli::test_default();
        cli.config_path = Some(explicit);
        let settings = build_run_settings(&cli, &target)?;
        assert_eq!(settings.emit_tree, EmitTree::Named("from-file".to_string()));

        cli.no_tree = true;
        let settings = build_run_settings(&cli, &target)?;
        assert_eq!(settings.emit_tree.artifact_name(), None);

        Ok(())
    }

    #[test]
    fn comma_separated_exclude_patterns_are_split() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("project");
        fs::create_dir_all(&target)?;

        let _guards = isolate_env(temp.path());

        let mut cli = Cli::test_default();
        cli.exclude_patterns = vec!["*.log,target/,*.tmp".to_string(), "*.log".to_string()];
        cli.output = Some(PathBuf::from("out"));

        let settings = build_run_settings(&cli, &target)?;
        assert_eq!(
            settings.list_config.exclude_patterns,
            vec!["*.log", "target/", "*.tmp", "tree.json"]
        );

        Ok(())
    }
}
