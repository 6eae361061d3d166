/// Truncate a string to at most `max_bytes`, respecting char boundaries.
pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_is_identity() {
        assert_eq!(truncate_string("abc", 10), "abc");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting mid-char must back off
        assert_eq!(truncate_string("aéb", 2), "a");
        assert_eq!(truncate_string("aéb", 3), "aé");
    }
}
