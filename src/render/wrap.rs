use crate::assets::text::TextMeasure;

/// Greedy word wrap.
///
/// Words are appended to the current line while the running line width stays within `max_width`;
/// otherwise a new line starts with the word. A single word wider than `max_width` gets a line of
/// its own and is never split. Empty input yields one empty line.
pub fn wrap_greedy(
    text: &str,
    max_width: f32,
    size_px: f32,
    measure: &mut dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure.measure(&candidate, size_px) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }

    lines.push(line);
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/render/wrap.rs"]
mod tests;
