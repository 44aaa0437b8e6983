use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::collections::HashSet;
use crate::sys::host::{Layer, WorkspaceId};

const DEFAULT_CONFIG: &str = include_str!("../../hy3.default.toml");

pub fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hy3").join("config.toml"))
}

pub fn default_config_text() -> &'static str { DEFAULT_CONFIG }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub tabs: TabSettings,
    #[serde(default)]
    pub autotile: AutotileSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    /// Wrap the first window of a workspace in a tab group.
    #[serde(default = "no")]
    pub tab_first_window: bool,
    #[serde(default)]
    pub no_gaps_when_only: NoGapsWhenOnly,
    #[serde(default)]
    pub node_collapse_policy: NodeCollapsePolicy,
    /// Extra trailing gap applied to a lone child of a nested group.
    #[serde(default = "default_group_inset")]
    pub group_inset: f64,
    #[serde(default)]
    pub focus_obscured_windows_policy: ObscuredWindowPolicy,
    #[serde(default)]
    pub default_movefocus_layer: MoveFocusLayer,
    /// Pixels a floating window moves per shift.
    #[serde(default = "default_kbd_shift_delta")]
    pub kbd_shift_delta: f64,
    #[serde(default = "no")]
    pub allow_workspace_cycles: bool,
    #[serde(default = "no")]
    pub animate_manual_resizes: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        GeneralSettings {
            tab_first_window: false,
            no_gaps_when_only: NoGapsWhenOnly::default(),
            node_collapse_policy: NodeCollapsePolicy::default(),
            group_inset: default_group_inset(),
            focus_obscured_windows_policy: ObscuredWindowPolicy::default(),
            default_movefocus_layer: MoveFocusLayer::default(),
            kbd_shift_delta: default_kbd_shift_delta(),
            allow_workspace_cycles: false,
            animate_manual_resizes: false,
        }
    }
}

impl GeneralSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.group_inset < 0.0 {
            issues.push(format!("general.group_inset must be non-negative, got {}", self.group_inset));
        }
        if self.kbd_shift_delta <= 0.0 {
            issues.push(format!(
                "general.kbd_shift_delta must be positive, got {}",
                self.kbd_shift_delta
            ));
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoGapsWhenOnly {
    #[default]
    Off,
    On,
    /// Drop the gaps but keep the border.
    KeepBorder,
}

/// When a group left with a single group child is merged into its parent.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeCollapsePolicy {
    Never,
    Always,
    #[default]
    UnlessParentTabbed,
}

/// Whether directional focus may land on a window fully covered by a floating one.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObscuredWindowPolicy {
    Allow,
    Skip,
    /// Skip only while focus may move between both tiled and floating windows.
    #[default]
    SkipWhenMixed,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum MoveFocusLayer {
    /// The layer of the window focus starts from.
    #[default]
    Same,
    Tiled,
    Floating,
    All,
}

impl MoveFocusLayer {
    /// Empty means "same as the source window".
    pub fn layers(self) -> Layer {
        match self {
            MoveFocusLayer::Same => Layer::empty(),
            MoveFocusLayer::Tiled => Layer::TILED,
            MoveFocusLayer::Floating => Layer::FLOATING,
            MoveFocusLayer::All => Layer::all(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    pub const fn uniform(value: f64) -> Self {
        Sides {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    fn validate(&self, name: &str) -> Vec<String> {
        [("top", self.top), ("right", self.right), ("bottom", self.bottom), ("left", self.left)]
            .into_iter()
            .filter(|(_, value)| *value < 0.0)
            .map(|(side, value)| format!("{name}.{side} must be non-negative, got {value}"))
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    #[serde(default = "default_inner_gaps")]
    pub inner: Sides,
    #[serde(default = "default_outer_gaps")]
    pub outer: Sides,
}

impl Default for GapSettings {
    fn default() -> Self {
        GapSettings {
            inner: default_inner_gaps(),
            outer: default_outer_gaps(),
        }
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.inner.validate("gaps.inner");
        issues.extend(self.outer.validate("gaps.outer"));
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TabSettings {
    #[serde(default = "default_tab_height")]
    pub height: f64,
    /// Space between the tab bar and the windows below it.
    #[serde(default = "default_tab_padding")]
    pub padding: f64,
}

impl Default for TabSettings {
    fn default() -> Self {
        TabSettings {
            height: default_tab_height(),
            padding: default_tab_padding(),
        }
    }
}

impl TabSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.height < 0.0 {
            issues.push(format!("tabs.height must be non-negative, got {}", self.height));
        }
        if self.padding < 0.0 {
            issues.push(format!("tabs.padding must be non-negative, got {}", self.padding));
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct AutotileSettings {
    #[serde(default = "no")]
    pub enable: bool,
    #[serde(default = "yes")]
    pub ephemeral_groups: bool,
    /// Split a horizontal group once children would get narrower than
    /// this. Zero always splits, negative never does.
    #[serde(default)]
    pub trigger_width: i32,
    #[serde(default)]
    pub trigger_height: i32,
    /// `all`, a list of workspace ids, or `not:` followed by a list.
    #[serde(default = "default_autotile_workspaces")]
    pub workspaces: String,
}

impl Default for AutotileSettings {
    fn default() -> Self {
        AutotileSettings {
            enable: false,
            ephemeral_groups: true,
            trigger_width: 0,
            trigger_height: 0,
            workspaces: default_autotile_workspaces(),
        }
    }
}

impl AutotileSettings {
    pub fn validate(&self) -> Vec<String> {
        match WorkspaceFilter::parse(&self.workspaces) {
            Ok((_, invalid)) => invalid
                .into_iter()
                .map(|token| format!("autotile.workspaces: invalid workspace id: {token}"))
                .collect(),
            Err(e) => vec![format!("autotile.workspaces could not be parsed: {e}")],
        }
    }
}

/// Workspaces autotiling applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkspaceFilter {
    #[default]
    All,
    Only(HashSet<WorkspaceId>),
    AllExcept(HashSet<WorkspaceId>),
}

impl WorkspaceFilter {
    /// Parses a filter, returning it together with the tokens that were not
    /// workspace ids.
    pub fn parse(raw: &str) -> Result<(WorkspaceFilter, Vec<String>), regex::Error> {
        let raw = raw.trim();
        if raw == "all" {
            return Ok((WorkspaceFilter::All, Vec::new()));
        }
        let (blacklist, list) = match raw.strip_prefix("not:") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let separator = Regex::new(r"[\s,]+")?;
        let mut ids = HashSet::default();
        let mut invalid = Vec::new();
        for token in separator.split(list).filter(|token| !token.is_empty()) {
            match token.parse::<i64>() {
                Ok(id) => {
                    ids.insert(WorkspaceId(id));
                }
                Err(_) => invalid.push(token.to_owned()),
            }
        }
        let filter =
            if blacklist { WorkspaceFilter::AllExcept(ids) } else { WorkspaceFilter::Only(ids) };
        Ok((filter, invalid))
    }

    pub fn allows(&self, workspace: WorkspaceId) -> bool {
        match self {
            WorkspaceFilter::All => true,
            WorkspaceFilter::Only(ids) => ids.is_empty() || ids.contains(&workspace),
            WorkspaceFilter::AllExcept(ids) => !ids.contains(&workspace),
        }
    }
}

/// A [`WorkspaceFilter`] cached on the raw string it was parsed from.
#[derive(Debug, Default)]
pub struct CachedWorkspaceFilter {
    raw: Option<String>,
    filter: WorkspaceFilter,
}

impl CachedWorkspaceFilter {
    pub fn get(&mut self, raw: &str) -> &WorkspaceFilter {
        if self.raw.as_deref() != Some(raw) {
            self.filter = match WorkspaceFilter::parse(raw) {
                Ok((filter, invalid)) => {
                    for token in invalid {
                        error!("autotile:workspaces: invalid workspace id: {token}");
                    }
                    filter
                }
                Err(e) => {
                    error!("autotile:workspaces: {e}");
                    WorkspaceFilter::All
                }
            };
            self.raw = Some(raw.to_owned());
        }
        &self.filter
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_group_inset() -> f64 { 10.0 }

fn default_kbd_shift_delta() -> f64 { 20.0 }

fn default_inner_gaps() -> Sides { Sides::uniform(5.0) }

fn default_outer_gaps() -> Sides { Sides::uniform(20.0) }

fn default_tab_height() -> f64 { 15.0 }

fn default_tab_padding() -> f64 { 5.0 }

fn default_autotile_workspaces() -> String { "all".to_owned() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    /// Reads the user's config file, or the defaults when there is none.
    pub fn load() -> anyhow::Result<Config> {
        match config_file() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, text.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.general.validate());
        issues.extend(self.gaps.validate());
        issues.extend(self.tabs.validate());
        issues.extend(self.autotile.validate());
        issues
    }
}

/// Source of the configuration in effect for the next operation.
pub trait ConfigProvider: Send + Sync {
    fn current(&self) -> Arc<Config>;
}

/// Configuration shared with whoever reloads it.
#[derive(Debug)]
pub struct SharedConfig(RwLock<Arc<Config>>);

impl SharedConfig {
    pub fn new(config: Config) -> Self { SharedConfig(RwLock::new(Arc::new(config))) }

    pub fn replace(&self, config: Config) { *self.0.write() = Arc::new(config); }

    /// Re-reads `path`; the old configuration stays in effect on error.
    pub fn reload(&self, path: &Path) -> anyhow::Result<()> {
        let config = Config::read(path)?;
        self.replace(config);
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self { SharedConfig::new(Config::default()) }
}

impl ConfigProvider for SharedConfig {
    fn current(&self) -> Arc<Config> { self.0.read().clone() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn shipped_defaults_match_builtin_defaults() {
        let parsed = Config::parse(default_config_text()).expect("default config parses");
        assert_eq!(Config::default(), parsed);
        assert!(parsed.validate().is_empty());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::default(), Config::parse("").unwrap());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[tabs]\nwidth = 3\n").is_err());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = Config::parse(
            "[general]\nno_gaps_when_only = \"keep_border\"\n[autotile]\nenable = true\ntrigger_width = 800\n",
        )
        .unwrap();
        assert_eq!(NoGapsWhenOnly::KeepBorder, config.general.no_gaps_when_only);
        assert_eq!(10.0, config.general.group_inset);
        assert!(config.autotile.enable);
        assert!(config.autotile.ephemeral_groups);
        assert_eq!(800, config.autotile.trigger_width);
    }

    #[test]
    fn validate_reports_bad_values() {
        let mut config = Config::default();
        config.gaps.outer.left = -1.0;
        config.tabs.height = -2.0;
        config.autotile.workspaces = "1, two".to_owned();
        assert_eq!(
            vec![
                "gaps.outer.left must be non-negative, got -1".to_owned(),
                "tabs.height must be non-negative, got -2".to_owned(),
                "autotile.workspaces: invalid workspace id: two".to_owned(),
            ],
            config.validate()
        );
    }

    #[test]
    fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.general.tab_first_window = true;
        config.save(&path).unwrap();
        assert_eq!(config, Config::read(&path).unwrap());
    }

    #[test]
    fn shared_config_reload_keeps_old_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tabs]\nheight = 30\n").unwrap();
        let shared = SharedConfig::default();
        shared.reload(&path).unwrap();
        assert_eq!(30.0, shared.current().tabs.height);
        std::fs::write(&path, "[tabs]\nheight = \"tall\"\n").unwrap();
        assert!(shared.reload(&path).is_err());
        assert_eq!(30.0, shared.current().tabs.height);
    }

    mod workspace_filter {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn all() {
            let (filter, invalid) = WorkspaceFilter::parse("all").unwrap();
            assert!(filter.allows(WorkspaceId(7)));
            assert!(invalid.is_empty());
        }

        #[test]
        fn whitelist_with_mixed_separators() {
            let (filter, _) = WorkspaceFilter::parse("1, 2 3,,4").unwrap();
            for id in 1..=4 {
                assert!(filter.allows(WorkspaceId(id)));
            }
            assert!(!filter.allows(WorkspaceId(5)));
        }

        #[test]
        fn blacklist() {
            let (filter, _) = WorkspaceFilter::parse("not:2,3").unwrap();
            assert!(filter.allows(WorkspaceId(1)));
            assert!(!filter.allows(WorkspaceId(2)));
            assert!(!filter.allows(WorkspaceId(3)));
        }

        #[test]
        fn invalid_tokens_are_skipped() {
            let (filter, invalid) = WorkspaceFilter::parse("1 x 2").unwrap();
            assert_eq!(vec!["x".to_owned()], invalid);
            assert!(filter.allows(WorkspaceId(2)));
            assert!(!filter.allows(WorkspaceId(3)));
        }

        #[test]
        fn cache_reparses_on_change() {
            let mut cache = CachedWorkspaceFilter::default();
            assert!(!cache.get("1").allows(WorkspaceId(2)));
            assert!(cache.get("1").allows(WorkspaceId(1)));
            assert!(cache.get("not:1").allows(WorkspaceId(2)));
        }
    }
}
