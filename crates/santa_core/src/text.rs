//! Plain-text helpers for notification bodies.

/// Column width used for free text in plaintext notifications.
pub const PLAINTEXT_WRAP_WIDTH: usize = 75;

/// Line ending expected by the notification templates.
pub const TEMPLATE_LINE_ENDING: &str = "\r\n";

/// Greedily word-wraps `text` to at most `width` characters per line.
///
/// Existing line breaks (`\n` or `\r\n`) are kept, blank lines included.
/// Whitespace runs inside a line collapse to one space. A word longer than
/// `width` sits alone on its own line rather than being split.
pub fn wrap_line(text: &str, width: usize, line_ending: &str) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();

    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_chars = 0usize;

        for word in source_line.split_whitespace() {
            let word_chars = word.chars().count();
            if current_chars > 0 && current_chars + 1 + word_chars > width {
                lines.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            if current_chars > 0 {
                current.push(' ');
                current_chars += 1;
            }
            current.push_str(word);
            current_chars += word_chars;
        }

        lines.push(current);
    }

    lines.join(line_ending)
}

#[cfg(test)]
mod tests {
    use super::{wrap_line, PLAINTEXT_WRAP_WIDTH, TEMPLATE_LINE_ENDING};

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(wrap_line("Bring snacks.", 75, "\r\n"), "Bring snacks.");
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let wrapped = wrap_line("aaa bbb ccc ddd", 7, "\n");
        assert_eq!(wrapped, "aaa bbb\nccc ddd");
    }

    #[test]
    fn keeps_paragraph_breaks_and_normalizes_endings() {
        let wrapped = wrap_line("first\r\n\r\nsecond", 75, TEMPLATE_LINE_ENDING);
        assert_eq!(wrapped, "first\r\n\r\nsecond");
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let wrapped = wrap_line("a abcdefghij b", 5, "\n");
        assert_eq!(wrapped, "a\nabcdefghij\nb");
    }

    #[test]
    fn no_line_exceeds_width() {
        let text = "Please remember that the gift exchange happens right after dinner, \
                    so bring your wrapped present to the living room before dessert is served.";
        let wrapped = wrap_line(text, PLAINTEXT_WRAP_WIDTH, TEMPLATE_LINE_ENDING);

        assert!(wrapped.contains(TEMPLATE_LINE_ENDING));
        assert!(wrapped
            .split(TEMPLATE_LINE_ENDING)
            .all(|line| line.chars().count() <= PLAINTEXT_WRAP_WIDTH));
        assert_eq!(wrapped.split_whitespace().count(), text.split_whitespace().count());
    }
}
