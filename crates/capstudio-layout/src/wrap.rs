//! Greedy word wrapping for caption text.

/// Wrap caption text at `max_chars_per_line`, joining lines with `\n`.
///
/// Words are split on single spaces and packed greedily: a word moves to
/// the next line once appending it would push the current line past the
/// limit. A single word longer than the limit is never split mid-word;
/// it becomes its own over-long line.
pub fn wrap_caption(text: &str, max_chars_per_line: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split(' ') {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= max_chars_per_line {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(wrap_caption("hello world", 50), "hello world");
        assert_eq!(wrap_caption("hello world", 50).lines().count(), 1);
    }

    #[test]
    fn test_greedy_pack_example() {
        let wrapped = wrap_caption("a b c d e f g h i j", 5);
        let lines: Vec<&str> = wrapped.split('\n').collect();
        assert_eq!(lines, vec!["a b c", "d e f", "g h i", "j"]);
        assert!(lines.iter().all(|l| l.len() <= 5));
    }

    #[test]
    fn test_long_word_not_split() {
        let wrapped = wrap_caption("hi supercalifragilistic yo", 10);
        let lines: Vec<&str> = wrapped.split('\n').collect();
        assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
    }

    #[test]
    fn test_words_never_reordered() {
        let text = "the quick brown fox jumps over the lazy dog";
        let wrapped = wrap_caption(text, 12);
        let rejoined: Vec<&str> = wrapped.split(['\n', ' ']).collect();
        let original: Vec<&str> = text.split(' ').collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_deterministic() {
        let a = wrap_caption("one two three four five six", 9);
        let b = wrap_caption("one two three four five six", 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_fit_boundary() {
        // "ab cd" is exactly 5 chars: fits on one line at limit 5
        assert_eq!(wrap_caption("ab cd", 5), "ab cd");
        // at limit 4 it must break
        assert_eq!(wrap_caption("ab cd", 4), "ab\ncd");
    }
}
