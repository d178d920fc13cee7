// Author: Dustin Pilgrim
// License: MIT

pub mod rules;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::{debug, error, info};

use crate::error::ConfigError;
use rules::{PrecedenceRule, StateChangeRule};

const SECTION_RECALBOX: &str = "recalbox";
const SECTION_MEDIA: &str = "media";
const SECTION_SLIDESHOW: &str = "slideshow";
const SECTION_CHANGE: &str = "change";

/// `[recalbox]` - broker connection and state-snapshot source.
#[derive(Debug, Clone)]
pub struct RecalboxConfig {
    pub host: String,
    pub port: u16,
    pub keepalive: u64,
    pub topic: String,
    pub is_local: bool,
    pub es_state_local_file: PathBuf,
    pub es_state_remote_url: String,
}

/// `[media]` - media library layout and per-action precedence rules.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_path: PathBuf,
    pub default_image: String,
    pub video_file_extensions: Vec<String>,
    pub arcade_system_enabled: bool,
    pub arcade_systems: Vec<String>,
    pub(crate) precedence: HashMap<String, PrecedenceRule>,
}

impl MediaConfig {
    /// Looks up the precedence rule for `action`, falling back to the
    /// mandatory `default` entry for actions with no specific rule.
    pub fn precedence_for(&self, action: &str) -> &PrecedenceRule {
        self.precedence
            .get(action)
            .unwrap_or_else(|| self.precedence.get("default").expect("validated at load time"))
    }

    pub fn is_video(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_lowercase());
        self.video_file_extensions
            .iter()
            .any(|e| e.to_lowercase() == ext)
    }
}

/// `[slideshow]` - display timings and the three external command+options
/// pairs (viewer, video player, clear).
#[derive(Debug, Clone)]
pub struct SlideshowConfig {
    pub image_display_time: Duration,
    pub max_video_time: Duration,
    pub time_between_slides: Duration,
    pub shuffle: bool,
    pub terminate_viewer: bool,
    pub viewer: String,
    pub viewer_opts: String,
    pub video_player: String,
    pub video_player_opts: String,
    pub clear_cmd: String,
    pub clear_cmd_opts: String,
    pub framebuffer_resolution_cmd: Option<String>,
}

/// `[change]` - per-action state-change rule.
#[derive(Debug, Clone, Default)]
pub struct ChangeConfig(pub(crate) HashMap<String, StateChangeRule>);

impl ChangeConfig {
    pub fn rule_for(&self, action: &str) -> StateChangeRule {
        self.0.get(action).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub recalbox: RecalboxConfig,
    pub media: MediaConfig,
    pub slideshow: SlideshowConfig,
    pub change: ChangeConfig,
}

/// Ordered list of candidate config paths to try when none is given
/// explicitly on the command line: install-relative, then a user config
/// directory, then `/etc`.
pub fn default_search_path() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("dynquee.ini"));
        }
    }

    if let Some(cfg_dir) = dirs::config_dir() {
        candidates.push(cfg_dir.join("dynquee").join("dynquee.ini"));
    }

    candidates.push(PathBuf::from("/etc/dynquee.ini"));

    candidates
}

/// Loads `path` if given, otherwise tries each of [`default_search_path`]
/// in order. The first path that exists and parses wins.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_from_path(path);
    }

    let candidates = default_search_path();
    for candidate in &candidates {
        if candidate.is_file() {
            info!(path = %candidate.display(), "using config file");
            return load_from_path(candidate);
        }
    }

    Err(ConfigError::NotFound(candidates))
}

pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let recalbox = parse_recalbox(&ini)?;
    let media = parse_media(&ini)?;
    let slideshow = parse_slideshow(&ini)?;
    let change = parse_change(&ini);

    debug!(
        actions = media.precedence.len(),
        change_rules = change.0.len(),
        "config parsed"
    );

    Ok(Config {
        recalbox,
        media,
        slideshow,
        change,
    })
}

fn section<'a>(ini: &'a Ini, name: &'static str) -> Result<&'a ini::Properties, ConfigError> {
    ini.section(Some(name)).ok_or(ConfigError::MissingSection(name))
}

fn req(props: &ini::Properties, section: &'static str, key: &'static str) -> Result<String, ConfigError> {
    props
        .get(key)
        .map(str::to_string)
        .ok_or(ConfigError::MissingKey { section, key })
}

fn opt(props: &ini::Properties, key: &str, default: &str) -> String {
    props.get(key).unwrap_or(default).to_string()
}

fn opt_bool(props: &ini::Properties, section: &'static str, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                section,
                key,
                reason: format!("not a boolean: '{other}'"),
            }),
        },
    }
}

fn opt_u64(props: &ini::Properties, section: &'static str, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            section,
            key,
            reason: format!("not an integer: '{v}'"),
        }),
    }
}

fn opt_f64(props: &ini::Properties, section: &'static str, key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            section,
            key,
            reason: format!("not a number: '{v}'"),
        }),
    }
}

fn opt_vec_string(props: &ini::Properties, key: &str) -> Vec<String> {
    props
        .get(key)
        .map(|v| v.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

fn parse_recalbox(ini: &Ini) -> Result<RecalboxConfig, ConfigError> {
    let props = section(ini, SECTION_RECALBOX)?;

    Ok(RecalboxConfig {
        host: req(props, SECTION_RECALBOX, "host")?,
        port: opt_u64(props, SECTION_RECALBOX, "port", 1883)? as u16,
        keepalive: opt_u64(props, SECTION_RECALBOX, "keepalive", 60)?,
        topic: req(props, SECTION_RECALBOX, "topic")?,
        is_local: opt_bool(props, SECTION_RECALBOX, "is_local", true)?,
        es_state_local_file: PathBuf::from(opt(props, "es_state_local_file", "/tmp/es_state.inf")),
        es_state_remote_url: opt(props, "es_state_remote_url", ""),
    })
}

fn parse_media(ini: &Ini) -> Result<MediaConfig, ConfigError> {
    let props = section(ini, SECTION_MEDIA)?;

    let media_path = PathBuf::from(req(props, SECTION_MEDIA, "media_path")?);
    let default_image = req(props, SECTION_MEDIA, "default_image")?;

    let video_file_extensions = {
        let raw = opt(props, "video_file_extensions", ".mp4 .mkv");
        raw.split_whitespace().map(str::to_lowercase).collect()
    };

    let arcade_system_enabled = opt_bool(props, SECTION_MEDIA, "arcade_system_enabled", false)?;
    let arcade_systems = opt_vec_string(props, "arcade_systems");

    let reserved = ["media_path", "default_image", "video_file_extensions", "arcade_system_enabled", "arcade_systems"];

    let mut precedence = HashMap::new();
    for (key, value) in props.iter() {
        if reserved.contains(&key) {
            continue;
        }
        let rule = PrecedenceRule::parse(key, value);
        if rule.is_empty() {
            return Err(ConfigError::EmptyPrecedenceRule { action: key.to_string() });
        }
        precedence.insert(key.to_string(), rule);
    }

    if !precedence.contains_key("default") {
        return Err(ConfigError::MissingKey {
            section: SECTION_MEDIA,
            key: "default",
        });
    }

    Ok(MediaConfig {
        media_path,
        default_image,
        video_file_extensions,
        arcade_system_enabled,
        arcade_systems,
        precedence,
    })
}

fn parse_slideshow(ini: &Ini) -> Result<SlideshowConfig, ConfigError> {
    let props = section(ini, SECTION_SLIDESHOW)?;

    Ok(SlideshowConfig {
        image_display_time: Duration::from_secs_f64(opt_f64(props, SECTION_SLIDESHOW, "image_display_time", 8.0)?),
        max_video_time: Duration::from_secs_f64(opt_f64(props, SECTION_SLIDESHOW, "max_video_time", 120.0)?),
        time_between_slides: Duration::from_secs_f64(opt_f64(props, SECTION_SLIDESHOW, "time_between_slides", 1.0)?),
        shuffle: opt_bool(props, SECTION_SLIDESHOW, "shuffle", true)?,
        terminate_viewer: opt_bool(props, SECTION_SLIDESHOW, "terminate_viewer", false)?,
        viewer: req(props, SECTION_SLIDESHOW, "viewer")?,
        viewer_opts: opt(props, "viewer_opts", "{file}"),
        video_player: req(props, SECTION_SLIDESHOW, "video_player")?,
        video_player_opts: opt(props, "video_player_opts", "{file}"),
        clear_cmd: req(props, SECTION_SLIDESHOW, "clear_cmd")?,
        clear_cmd_opts: opt(props, "clear_cmd_opts", ""),
        framebuffer_resolution_cmd: props.get("framebuffer_resolution_cmd").map(str::to_string),
    })
}

fn parse_change(ini: &Ini) -> ChangeConfig {
    let Some(props) = ini.section(Some(SECTION_CHANGE)) else {
        return ChangeConfig::default();
    };

    let mut rules = HashMap::new();
    for (key, value) in props.iter() {
        let rule = match StateChangeRule::parse(value) {
            Some(rule) => rule,
            None => {
                error!(action = key, value, "unknown state-change rule value; treating as changed");
                StateChangeRule::Always
            }
        };
        rules.insert(key.to_string(), rule);
    }
    ChangeConfig(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &std::path::Path, contents: &str) -> PathBuf {
        let path = dir.join("dynquee.ini");
        std::fs::write(&path, contents).unwrap();
        path
    }

    const MINIMAL: &str = r#"
[recalbox]
host = localhost
port = 1883
topic = Recalbox/EmulationStation/Event

[media]
media_path = /media
default_image = default.png
default = generic
rungame = rom scraped publisher system genre generic

[slideshow]
viewer = fbv
video_player = mplayer
clear_cmd = fbv
"#;

    #[test]
    fn loads_minimal_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), MINIMAL);
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.recalbox.host, "localhost");
        assert_eq!(cfg.media.media_path, PathBuf::from("/media"));
        assert!(!cfg.media.precedence_for("rungame").is_empty());
    }

    #[test]
    fn missing_default_precedence_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let contents = MINIMAL.replace("default = generic\n", "");
        let path = write_fixture(dir.path(), &contents);
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "default", .. }));
    }

    #[test]
    fn unknown_action_falls_back_to_default_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), MINIMAL);
        let cfg = load_from_path(&path).unwrap();
        let fallback = cfg.media.precedence_for("totally_unknown_action");
        assert_eq!(fallback, cfg.media.precedence_for("default"));
    }
}
