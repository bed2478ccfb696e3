//! Text utilities for TUI rendering.
//!
//! Widths are terminal columns: Hangul and CJK ideographs take two.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal columns taken by `text`.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Wrap text to fit within a given width, handling unicode safely.
///
/// Breaks between characters, so unspaced Chinese text wraps too.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }

    let mut lines = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_width = 0;

        for ch in line.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);

            if current_width + ch_width > width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
                current_width = 0;
            }

            current_line.push(ch);
            current_width += ch_width;
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Wrap text and prefix every line with `indent`.
pub fn wrap_text_indented(text: &str, width: usize, indent: &str) -> Vec<String> {
    let effective_width = width.saturating_sub(display_width(indent));
    if effective_width == 0 {
        return vec![format!("{}{}", indent, text)];
    }

    wrap_text(text, effective_width)
        .into_iter()
        .map(|line| format!("{}{}", indent, line))
        .collect()
}

/// Truncate a string to fit within a given width, adding ellipsis if needed.
pub fn truncate(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width < 3 {
        return text.chars().take(max_width).collect();
    }

    let mut width = 0;
    let mut result = String::new();

    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result.push_str("...");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("Hello world", 5);
        assert_eq!(wrapped, vec!["Hello", " worl", "d"]);
    }

    #[test]
    fn test_wrap_text_wide_characters() {
        // Each syllable is two columns wide.
        let wrapped = wrap_text("안녕하세요", 4);
        assert_eq!(wrapped, vec!["안녕", "하세", "요"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_text_indented() {
        let wrapped = wrap_text_indented("您好世界", 6, "  ");
        assert_eq!(wrapped, vec!["  您好", "  世界"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello world", 8), "Hello...");
        assert_eq!(truncate("Hi", 10), "Hi");
        assert_eq!(truncate("검품 일정 문의", 7), "검품...");
    }
}
