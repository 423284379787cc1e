//! Appearance configuration for HUDs.
//!
//! Loads configuration from ${HUD_HOME}/config.toml with sensible defaults.
//! Changes apply to HUDs created afterwards; a HUD snapshots the appearance
//! when it is constructed.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::animation::AnimationStyle;
use crate::content::ContentStyle;
use crate::ids::HudId;
use crate::surface::SurfaceSpec;

/// RGBA color, written as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            anyhow::bail!("Invalid color '{s}': expected #rrggbb or #rrggbbaa");
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("Invalid color '{s}': bad hex digits"))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Linear blend towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn mix(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Color::rgba(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
            lerp(self.a, other.a),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Color::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Translucent effect drawn behind the HUD content.
///
/// Written as `none`, `dim` or `blur:<style>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Backing {
    #[default]
    None,
    Dim,
    Blur(String),
}

impl Backing {
    pub fn is_backed(&self) -> bool {
        !matches!(self, Backing::None)
    }
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backing::None => f.write_str("none"),
            Backing::Dim => f.write_str("dim"),
            Backing::Blur(style) => write!(f, "blur:{style}"),
        }
    }
}

impl TryFrom<String> for Backing {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        match value.trim() {
            "none" | "" => Ok(Backing::None),
            "dim" => Ok(Backing::Dim),
            "blur" => Ok(Backing::Blur("regular".to_string())),
            other => match other.strip_prefix("blur:") {
                Some(style) if !style.trim().is_empty() => {
                    Ok(Backing::Blur(style.trim().to_string()))
                }
                _ => anyhow::bail!("Invalid backing '{other}': expected none, dim or blur:<style>"),
            },
        }
    }
}

impl From<Backing> for String {
    fn from(backing: Backing) -> Self {
        backing.to_string()
    }
}

/// Status-bar appearance requested while a HUD is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBar {
    #[default]
    Default,
    Light,
    Dark,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "system".to_string(),
            size: 17.0,
        }
    }
}

/// Global HUD appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Tint of the cover drawn over the host screen
    pub cover_color: Option<Color>,

    /// Tint of spinners, labels and buttons
    pub tint_color: Option<Color>,

    /// Dim/blur effect behind the content
    pub backing: Backing,

    /// Primary font
    pub font: Option<FontSpec>,

    /// Button font (falls back to the primary font)
    pub button_font: Option<FontSpec>,

    /// Spacing between buttons
    pub horizontal_spacing: f32,

    /// Spacing between the label and the button row
    pub vertical_spacing: f32,

    /// Status-bar appearance while a HUD is shown
    pub status_bar: StatusBar,

    /// Duration of entrance, exit and content swap animations in milliseconds
    pub animation_ms: u64,

    /// Default entrance/exit animation
    pub animation: AnimationStyle,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            cover_color: None,
            tint_color: None,
            backing: Backing::None,
            font: None,
            button_font: None,
            horizontal_spacing: Self::DEFAULT_HORIZONTAL_SPACING,
            vertical_spacing: Self::DEFAULT_VERTICAL_SPACING,
            status_bar: StatusBar::Default,
            animation_ms: Self::DEFAULT_ANIMATION_MS,
            animation: AnimationStyle::default(),
        }
    }
}

impl HudConfig {
    const DEFAULT_HORIZONTAL_SPACING: f32 = 40.0;
    const DEFAULT_VERTICAL_SPACING: f32 = 10.0;
    const DEFAULT_ANIMATION_MS: u64 = 300;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(HudConfig::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        write_config(path, default_config_template())
    }

    /// Renders the commented template with values from `HudConfig::default()`.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&HudConfig::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    /// Snapshot of what content factories need for one HUD.
    pub fn content_style(&self) -> ContentStyle {
        ContentStyle {
            tint: self.tint_color,
            font: self.font.clone(),
            button_font: self.button_font.clone().or_else(|| self.font.clone()),
            horizontal_spacing: self.horizontal_spacing,
            vertical_spacing: self.vertical_spacing,
        }
    }

    /// Snapshot of what the surface provider needs for one HUD.
    pub fn surface_spec(&self, hud: HudId, backing: Backing) -> SurfaceSpec {
        SurfaceSpec {
            hud,
            cover_color: self.cover_color,
            backing,
            status_bar: self.status_bar,
        }
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

/// Writes config content to a file, creating parent directories as needed.
/// Uses atomic write (temp file + rename) to prevent corruption.
fn write_config(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

pub mod paths {
    //! Path resolution for HUD configuration and log directories.
    //!
    //! HUD_HOME resolution order:
    //! 1. HUD_HOME environment variable (if set)
    //! 2. ~/.config/hud (default)
    //! 3. ./.hud when no home directory can be determined

    use std::env;
    use std::path::PathBuf;

    pub fn hud_home() -> PathBuf {
        if let Ok(home) = env::var("HUD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".hud"),
            |h| h.join(".config").join("hud"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        hud_home().join("config.toml")
    }

    /// Returns the directory interactive sessions log into.
    pub fn logs_dir() -> PathBuf {
        hud_home().join("logs")
    }
}
