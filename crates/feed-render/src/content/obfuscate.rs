//! Letter rotation pass
//!
//! Makes message text unreadable at a glance while working on the viewer.

/// Rotate every ASCII letter by 13 places, preserving case
pub fn rot13(text: &str) -> String {
    text.chars().map(rotate).collect()
}

fn rotate(c: char) -> char {
    let base = match c {
        'a'..='z' => b'a',
        'A'..='Z' => b'A',
        _ => return c,
    };
    // c is ASCII here
    char::from((c as u8 - base + 13) % 26 + base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rot13_letters() {
        assert_eq!(rot13("Hello, World!"), "Uryyb, Jbeyq!");
        assert_eq!(rot13("abcxyzABCXYZ"), "nopklmNOPKLM");
    }

    #[test]
    fn test_rot13_leaves_other_characters() {
        assert_eq!(rot13("123 <:_:> é ✓"), "123 <:_:> é ✓");
    }

    #[test]
    fn test_rot13_twice_is_identity() {
        let samples = [
            "",
            "The quick brown fox jumps over the lazy dog",
            "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
            "MiXeD cAsE wItH 42 digits",
        ];
        for sample in samples {
            assert_eq!(rot13(&rot13(sample)), sample);
        }
    }
}
