//! Script-count heuristic for labelling a message Korean or Chinese.

use crate::message::Language;

fn is_korean(ch: char) -> bool {
    // Compatibility jamo (ㄱ-ㅎ, ㅏ-ㅣ) and precomposed syllables.
    matches!(ch, '\u{3131}'..='\u{3163}' | '\u{AC00}'..='\u{D7A3}')
}

fn is_chinese(ch: char) -> bool {
    matches!(ch, '\u{4E00}'..='\u{9FA5}')
}

/// Label text `zh` when it has more Chinese than Korean characters.
///
/// Ties, and text with neither script, are `ko`.
pub fn detect_language(text: &str) -> Language {
    let (korean, chinese) = text.chars().fold((0usize, 0usize), |(ko, zh), ch| {
        if is_korean(ch) {
            (ko + 1, zh)
        } else if is_chinese(ch) {
            (ko, zh + 1)
        } else {
            (ko, zh)
        }
    });

    if chinese > korean {
        Language::Zh
    } else {
        Language::Ko
    }
}
