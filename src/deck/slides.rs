use crate::resources::ResourceId;

/// One slide of the deck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideSpec {
    /// 1-based ordinal position in the deck.
    pub ordinal: usize,
    /// Benefit text drawn in the slide card. Empty only for the placeholder slide.
    pub text: String,
    /// Image paired with this slide by upload order, if any.
    pub image: Option<ResourceId>,
}

/// Ordered slide list derived from the editor's benefit text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideDeck {
    slides: Vec<SlideSpec>,
}

/// Split newline-delimited benefit text into trimmed, non-empty lines.
pub fn parse_benefit_lines(benefits: &str) -> Vec<&str> {
    benefits
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

impl SlideDeck {
    /// Build a deck with one slide per non-empty benefit line (minimum one slide).
    ///
    /// `images` are paired 1:1 with slides in upload order; surplus images are ignored and slides
    /// past the end of `images` have no image.
    pub fn build(benefits: &str, images: &[ResourceId]) -> Self {
        let mut lines = parse_benefit_lines(benefits);
        if lines.is_empty() {
            lines.push("");
        }

        let slides = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| SlideSpec {
                ordinal: i + 1,
                text: text.to_owned(),
                image: images.get(i).copied(),
            })
            .collect();
        Self { slides }
    }

    /// Number of slides, always at least one.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slides in display order.
    pub fn slides(&self) -> &[SlideSpec] {
        &self.slides
    }

    /// Slide at 0-based position `idx`.
    pub fn get(&self, idx: usize) -> Option<&SlideSpec> {
        self.slides.get(idx)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deck/slides.rs"]
mod tests;
