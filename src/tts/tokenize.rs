//! Text chunking for providers with a per-request length limit.

/// Punctuation that always ends a piece, even without trailing whitespace.
fn is_cjk_break(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '，' | '、' | '；' | '：' | '…' | '।' | '॥')
}

/// Punctuation that ends a piece when followed by whitespace or end of text.
fn is_latin_break(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ',' | ';' | ':' | '¿' | '¡')
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Breaks at sentence and clause punctuation first, greedily merging
/// neighbouring pieces back together while they fit, then falls back to
/// the last whitespace (or a hard cut) for pieces that are still too long.
/// Chunks made only of punctuation and whitespace are dropped.
pub fn split_for_synthesis(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let cleaned = join_hyphenated_lines(text);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in split_at_punctuation(&cleaned) {
        for part in fit_to_limit(&piece, max_chars) {
            let part_len = part.chars().count();
            if current_len == 0 {
                current = part;
                current_len = part_len;
            } else if current_len + 1 + part_len <= max_chars {
                current.push(' ');
                current.push_str(&part);
                current_len += 1 + part_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current = part;
                current_len = part_len;
            }
        }
    }
    if current_len > 0 {
        chunks.push(current);
    }

    chunks
}

/// Remove end-of-line hyphenation ("synthe-\nsis" → "synthesis").
fn join_hyphenated_lines(text: &str) -> String {
    text.replace("-\r\n", "").replace("-\n", "")
}

/// Split at punctuation and line breaks, keeping the punctuation with the
/// piece it ends. Pieces are trimmed and punctuation-only pieces dropped.
fn split_at_punctuation(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' || c == '\r' {
            push_piece(&mut pieces, &mut current);
            continue;
        }
        current.push(c);
        let at_boundary = chars.get(i + 1).map_or(true, |next| next.is_whitespace());
        if is_cjk_break(c) || (is_latin_break(c) && at_boundary) {
            push_piece(&mut pieces, &mut current);
        }
    }
    push_piece(&mut pieces, &mut current);

    pieces
}

fn push_piece(pieces: &mut Vec<String>, current: &mut String) {
    let piece = current.trim();
    if piece.chars().any(char::is_alphanumeric) {
        pieces.push(piece.to_string());
    }
    current.clear();
}

/// Cut a piece into parts of at most `max_chars`, preferring whitespace.
fn fit_to_limit(piece: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest: Vec<char> = piece.chars().collect();

    while rest.len() > max_chars {
        let cut = rest[..=max_chars]
            .iter()
            .rposition(|c| c.is_whitespace())
            .filter(|&pos| pos > 0)
            .unwrap_or(max_chars);
        let head: String = rest[..cut].iter().collect();
        push_part(&mut parts, &head);
        rest = rest[cut..]
            .iter()
            .copied()
            .skip_while(|c| c.is_whitespace())
            .collect();
    }

    let tail: String = rest.into_iter().collect();
    push_part(&mut parts, &tail);
    parts
}

fn push_part(parts: &mut Vec<String>, part: &str) {
    let part = part.trim();
    if part.chars().any(char::is_alphanumeric) {
        parts.push(part.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(split_for_synthesis("", 100).is_empty());
        assert!(split_for_synthesis("   \n ", 100).is_empty());
        assert!(split_for_synthesis("... !? ,", 100).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_for_synthesis("Hello world", 100), vec!["Hello world"]);
        assert_eq!(
            split_for_synthesis("Hello, world. How are you?", 100),
            vec!["Hello, world. How are you?"]
        );
    }

    #[test]
    fn test_chunks_respect_limit_and_keep_words() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu \
                    nu xi omicron pi rho sigma tau upsilon phi chi psi omega and then \
                    some more words to push this well past the hundred character limit";
        let chunks = split_for_synthesis(text, 100);
        assert!(chunks.len() >= 2, "{:?}", chunks);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "{:?}", chunk);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_sentences_break_before_limit() {
        let text = "This is the first sentence and it is fairly long indeed. \
                    This is the second sentence, also fairly long for the test.";
        let chunks = split_for_synthesis(text, 70);
        assert_eq!(chunks.len(), 2, "{:?}", chunks);
        assert!(chunks[0].ends_with("indeed."));
        assert!(chunks[1].starts_with("This is the second"));
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "a".repeat(250);
        let chunks = split_for_synthesis(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_multibyte_counts_characters() {
        let text = "नमस्ते दुनिया। ".repeat(20);
        let chunks = split_for_synthesis(&text, 100);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_cjk_punctuation_without_spaces() {
        let text = "你好。今天天气很好，我们去公园吧！";
        let chunks = split_for_synthesis(text, 8);
        assert_eq!(chunks, vec!["你好。", "今天天气很好，", "我们去公园吧！"]);
    }

    #[test]
    fn test_hyphenated_line_is_joined() {
        let chunks = split_for_synthesis("speech synthe-\nsis works", 100);
        assert_eq!(chunks, vec!["speech synthesis works"]);
    }

    #[test]
    fn test_decimal_point_does_not_split() {
        let pieces = split_at_punctuation("Pi is 3.14 roughly. Yes");
        assert_eq!(pieces, vec!["Pi is 3.14 roughly.", "Yes"]);
    }
}
