use super::font::{FontMetrics, is_cjk, measure_text_width_px};

pub(crate) struct WrapMetrics<'a> {
    pub(crate) font_size: f32,
    pub(crate) letter_spacing: f32,
    pub(crate) font: Option<&'a FontMetrics>,
}

impl WrapMetrics<'_> {
    fn width(&self, text: &str) -> f32 {
        measure_text_width_px(text, self.font_size, self.letter_spacing, self.font)
    }
}

/// Greedy line breaking at word boundaries (and between CJK characters).
/// Explicit newlines always break. A single token wider than `max_width`
/// stays on its own line.
pub(crate) fn wrap_text(text: &str, max_width: f32, metrics: &WrapMetrics<'_>) -> Vec<String> {
    let tokens = tokenize_text(text);
    let mut result = Vec::new();
    let mut current = String::new();
    let mut width = 0.0;
    let space_width = metrics.width(" ");

    for token in &tokens {
        if token == "\n" {
            result.push(current.trim_end().to_string());
            current.clear();
            width = 0.0;
            continue;
        }
        if token == " " {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
                width += space_width;
            }
            continue;
        }
        let token_width = metrics.width(token);
        if width + token_width > max_width && !current.trim().is_empty() {
            result.push(current.trim_end().to_string());
            current.clear();
            width = 0.0;
        }
        current.push_str(token);
        width += token_width;
    }

    if !current.trim().is_empty() {
        result.push(current.trim_end().to_string());
    }
    while result.last().is_some_and(|line| line.is_empty()) {
        result.pop();
    }
    result
}

fn tokenize_text(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch == '\n' || ch.is_whitespace() || is_cjk(ch) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            let token = if ch == '\n' {
                "\n".to_string()
            } else if ch.is_whitespace() {
                " ".to_string()
            } else {
                ch.to_string()
            };
            tokens.push(token);
            continue;
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
