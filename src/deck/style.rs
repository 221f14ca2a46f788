use crate::foundation::core::Canvas;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Lower bound for `StyleConfig::seconds_per_slide`.
pub const MIN_SECONDS_PER_SLIDE: f64 = 1.0;
/// Upper bound for `StyleConfig::seconds_per_slide`.
pub const MAX_SECONDS_PER_SLIDE: f64 = 8.0;

/// Output aspect preset. Each preset maps to one fixed surface size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectPreset {
    /// 9:16 vertical, 1080x1920.
    #[default]
    Portrait,
    /// 1:1, 1080x1080.
    Square,
    /// 16:9 horizontal, 1920x1080.
    Landscape,
}

impl AspectPreset {
    /// Surface dimensions for this preset.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Portrait => Canvas {
                width: 1080,
                height: 1920,
            },
            Self::Square => Canvas {
                width: 1080,
                height: 1080,
            },
            Self::Landscape => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }
}

/// Opaque sRGB brand color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BrandColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl BrandColor {
    /// Parse `#rrggbb` or `#rgb`; the leading `#` is optional.
    pub fn parse_hex(s: &str) -> SlidecastResult<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || SlidecastError::validation(format!("invalid brand color '{s}'"));
        // from_str_radix alone would let a leading '+' through.
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Self {
                    r: short(0)?,
                    g: short(1)?,
                    b: short(2)?,
                })
            }
            _ => Err(bad()),
        }
    }

    /// Color as straight RGBA8 with the given alpha.
    pub fn rgba(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }
}

/// Style parameters for one render, produced by the editor surface.
///
/// Immutable for the duration of a session: the workspace clones it when a render starts.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Headline drawn at the top of every slide.
    pub title: String,
    /// Secondary line under the title.
    pub subtitle: String,
    /// Newline-delimited benefit lines, one slide per non-empty line.
    pub benefits: String,
    /// Call-to-action button label.
    pub call_to_action: String,
    /// Brand color as a hex string.
    pub brand_color: String,
    /// Output aspect preset.
    pub aspect: AspectPreset,
    /// Duration of each slide, in seconds.
    pub seconds_per_slide: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            title: "Your Product".to_owned(),
            subtitle: "Made for busy teams".to_owned(),
            benefits: "Save hours every week\nWorks on any device\nLoved by 10,000+ users"
                .to_owned(),
            call_to_action: "Try it free".to_owned(),
            brand_color: "#6366f1".to_owned(),
            aspect: AspectPreset::Portrait,
            seconds_per_slide: 2.5,
        }
    }
}

impl StyleConfig {
    /// Validate editor-provided fields.
    pub fn validate(&self) -> SlidecastResult<()> {
        let sps = self.seconds_per_slide;
        if !sps.is_finite() || !(MIN_SECONDS_PER_SLIDE..=MAX_SECONDS_PER_SLIDE).contains(&sps) {
            return Err(SlidecastError::validation(format!(
                "seconds_per_slide must be within {MIN_SECONDS_PER_SLIDE}..={MAX_SECONDS_PER_SLIDE}, got {sps}"
            )));
        }
        self.brand()?;
        Ok(())
    }

    /// Parsed brand color.
    pub fn brand(&self) -> SlidecastResult<BrandColor> {
        BrandColor::parse_hex(&self.brand_color)
    }

    /// Surface dimensions implied by the aspect preset.
    pub fn canvas(&self) -> Canvas {
        self.aspect.canvas()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deck/style.rs"]
mod tests;
