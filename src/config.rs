use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Output filename patterns. Each pattern contains a single `%s` that is
/// replaced with the sanitized element name.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Templates {
    pub class: String,
    pub function: String,
    pub constant: String,
    pub namespace: String,
    pub package: String,
    /// Highlighted source code pages
    pub source: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            class: "class-%s.html".to_string(),
            function: "function-%s.html".to_string(),
            constant: "constant-%s.html".to_string(),
            namespace: "namespace-%s.html".to_string(),
            package: "package-%s.html".to_string(),
            source: "source-%s.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep `@todo` block tags in the output
    pub todo: bool,
    /// Render `@internal` documentation
    pub internal: bool,
    /// Link `@package` and `@subpackage` values to package pages
    pub packages: bool,
    /// Maximum nesting of inline tags before the input is rejected
    pub max_inline_depth: usize,
    /// Plugin sources (files or directories), processed in order
    pub plugins: Vec<PathBuf>,
    pub templates: Templates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            todo: false,
            internal: false,
            packages: true,
            max_inline_depth: 32,
            plugins: Vec::new(),
            templates: Templates::default(),
        }
    }
}

#[derive(Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn todo(mut self, todo: bool) -> Self {
        self.config.todo = todo;
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.config.internal = internal;
        self
    }

    pub fn packages(mut self, packages: bool) -> Self {
        self.config.packages = packages;
        self
    }

    pub fn max_inline_depth(mut self, depth: usize) -> Self {
        self.config.max_inline_depth = depth;
        self
    }

    pub fn plugin(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.plugins.push(path.into());
        self
    }

    pub fn templates(mut self, templates: Templates) -> Self {
        self.config.templates = templates;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const CANDIDATE_NAMES: &[&str] = &[".apidoc.toml", "apidoc.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Config> {
    let mut config = toml::from_str::<Config>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })?;

    // Plugin paths are relative to the file that names them
    if let Some(base) = path.parent() {
        for plugin in &mut config.plugins {
            if plugin.is_relative() {
                *plugin = base.join(&*plugin);
            }
        }
    }

    Ok(config)
}

fn read_config(path: &Path) -> io::Result<Config> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let config = parse_config_str(&s, path)?;
    log::info!("Loaded config from: {}", path.display());
    Ok(config)
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CANDIDATE_NAMES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let p = Path::new(&xdg).join("apidoc").join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    if let Ok(home) = env::var("HOME") {
        let p = Path::new(&home)
            .join(".config")
            .join("apidoc")
            .join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    None
}

fn read_discovered(path: &Path) -> io::Result<Config> {
    read_config(path).inspect_err(|e| {
        log::warn!("Failed to load config {}: {e}", path.display());
    })
}

/// Load configuration with precedence:
/// 1) explicit path
/// 2) walk up from start_dir: .apidoc.toml, apidoc.toml
/// 3) XDG: $XDG_CONFIG_HOME/apidoc/config.toml or ~/.config/apidoc/config.toml
/// 4) default config
///
/// The first file found is used; if it cannot be read or parsed that is an
/// error, not a reason to fall through to the next location.
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir) {
        let cfg = read_discovered(&p)?;
        return Ok((cfg, Some(p)));
    }

    if let Some(p) = xdg_config_path() {
        let cfg = read_discovered(&p)?;
        return Ok((cfg, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Config::default(), None))
}
