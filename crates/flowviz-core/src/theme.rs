//! Simulator appearance: theme colours and the layout sliders.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::render::Element;
use crate::{CoreError, DEFAULT_ANIMATION_MS};

/// Theme colours, keyed the way `POST /api/theme` expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Theme {
    pub accent_color: String,
    pub primary_bg: String,
    pub secondary_bg: String,
    pub text_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent_color: "#6366f1".to_string(),
            primary_bg: "#0f172a".to_string(),
            secondary_bg: "#1e293b".to_string(),
            text_color: "#f8fafc".to_string(),
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Theme {
    /// Set one colour by its property key.
    pub fn set(&mut self, property: &str, value: &str) -> Result<(), CoreError> {
        if !is_hex_color(value) {
            return Err(CoreError::Validation(format!(
                "\"{value}\" is not a #rrggbb colour"
            )));
        }
        let slot = match property {
            "accent_color" => &mut self.accent_color,
            "primary_bg" => &mut self.primary_bg,
            "secondary_bg" => &mut self.secondary_bg,
            "text_color" => &mut self.text_color,
            other => {
                return Err(CoreError::Validation(format!(
                    "unknown theme property \"{other}\""
                )))
            }
        };
        *slot = value.to_string();
        Ok(())
    }

    /// CSS custom properties to apply on the document root.
    pub fn css_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--accent-color", self.accent_color.clone()),
            (
                "--accent-gradient",
                format!(
                    "linear-gradient(45deg, {0}, {0}aa)",
                    self.accent_color
                ),
            ),
            ("--primary-bg", self.primary_bg.clone()),
            ("--secondary-bg", self.secondary_bg.clone()),
            ("--text-color-light", self.text_color.clone()),
        ]
    }
}

pub const ANIMATION_RANGE: RangeInclusive<u64> = 300..=3000;
pub const GAP_RANGE: RangeInclusive<u32> = 10..=120;
pub const SIZE_RANGE: RangeInclusive<u32> = 50..=150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutControls {
    pub animation_ms: u64,
    pub block_gap_px: u32,
    pub block_size_pct: u32,
}

impl Default for LayoutControls {
    fn default() -> Self {
        Self {
            animation_ms: DEFAULT_ANIMATION_MS,
            block_gap_px: 40,
            block_size_pct: 100,
        }
    }
}

fn out_of_range<T: std::fmt::Display>(what: &str, range: &RangeInclusive<T>) -> CoreError {
    CoreError::Validation(format!(
        "{what} must be between {} and {}",
        range.start(),
        range.end()
    ))
}

impl LayoutControls {
    pub fn set_animation_ms(&mut self, ms: u64) -> Result<(), CoreError> {
        if !ANIMATION_RANGE.contains(&ms) {
            return Err(out_of_range("animation speed", &ANIMATION_RANGE));
        }
        self.animation_ms = ms;
        Ok(())
    }

    pub fn set_block_gap(&mut self, px: u32) -> Result<(), CoreError> {
        if !GAP_RANGE.contains(&px) {
            return Err(out_of_range("block gap", &GAP_RANGE));
        }
        self.block_gap_px = px;
        Ok(())
    }

    pub fn set_block_size(&mut self, pct: u32) -> Result<(), CoreError> {
        if !SIZE_RANGE.contains(&pct) {
            return Err(out_of_range("block size", &SIZE_RANGE));
        }
        self.block_size_pct = pct;
        Ok(())
    }

    /// `1200` → `"1.2 s"`.
    pub fn speed_label(&self) -> String {
        format!("{:.1} s", self.animation_ms as f64 / 1000.0)
    }

    pub fn gap_label(&self) -> String {
        format!("{}px", self.block_gap_px)
    }

    pub fn size_label(&self) -> String {
        format!("{}%", self.block_size_pct)
    }

    pub fn css_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--block-gap", self.gap_label()),
            ("--block-scale", (self.block_size_pct as f64 / 100.0).to_string()),
        ]
    }
}

/// A `<style>` element declaring the given variables on `:root`.
pub fn root_style(vars: &[(&'static str, String)]) -> Element {
    let body: String = vars
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ");
    Element::new("style").text(format!(":root {{ {body} }}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_sets_gradient() {
        let mut theme = Theme::default();
        theme.set("accent_color", "#ff0000").unwrap();
        let vars = theme.css_vars();
        assert!(vars.contains(&("--accent-color", "#ff0000".to_string())));
        assert!(vars.contains(&(
            "--accent-gradient",
            "linear-gradient(45deg, #ff0000, #ff0000aa)".to_string()
        )));
    }

    #[test]
    fn text_color_maps_to_light_variable() {
        let mut theme = Theme::default();
        theme.set("text_color", "#000000").unwrap();
        assert!(theme.css_vars().contains(&("--text-color-light", "#000000".to_string())));
    }

    #[test]
    fn rejects_unknown_property_and_bad_colour() {
        let mut theme = Theme::default();
        assert!(theme.set("border", "#000000").is_err());
        assert!(theme.set("primary_bg", "red").is_err());
        assert_eq!(theme, Theme::default());
    }

    #[test]
    fn theme_serialises_as_flat_map() {
        let json = serde_json::to_value(Theme::default()).unwrap();
        assert_eq!(json["accent_color"], "#6366f1");
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn layout_labels_and_vars() {
        let mut layout = LayoutControls::default();
        assert_eq!(layout.speed_label(), "1.2 s");
        layout.set_block_gap(24).unwrap();
        layout.set_block_size(80).unwrap();
        assert_eq!(
            layout.css_vars(),
            vec![
                ("--block-gap", "24px".to_string()),
                ("--block-scale", "0.8".to_string()),
            ]
        );
        assert_eq!(layout.size_label(), "80%");
    }

    #[test]
    fn layout_rejects_out_of_range() {
        let mut layout = LayoutControls::default();
        assert!(layout.set_animation_ms(50).is_err());
        assert!(layout.set_block_size(400).is_err());
        assert_eq!(layout, LayoutControls::default());
    }

    #[test]
    fn root_style_lists_vars() {
        let style = root_style(&LayoutControls::default().css_vars());
        assert_eq!(style.text_content(), ":root { --block-gap: 40px; --block-scale: 1; }");
    }
}
