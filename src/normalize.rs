//! Text normalization shared by the matcher, the guardrail and the
//! calculator's bank keys.
//!
//! Croatian users type both "sigurna" and "sigurna banka" with or without
//! diacritics ("hoće li propasti" vs "hoce li propasti"). Folding both the
//! rule tables and the input means one pattern covers every variant.

/// Lowercase the text and fold Croatian diacritics to ASCII.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            'č' | 'ć' | 'Č' | 'Ć' => out.push('c'),
            'đ' | 'Đ' => out.push('d'),
            'š' | 'Š' => out.push('s'),
            'ž' | 'Ž' => out.push('z'),
            _ => out.extend(c.to_lowercase()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_croatian_diacritics() {
        assert_eq!(fold("Hoće li propasti?"), "hoce li propasti?");
        assert_eq!(fold("ŽIRO račun"), "ziro racun");
        assert_eq!(fold("Što znači đ?"), "sto znaci d?");
    }

    #[test]
    fn folded_and_ascii_input_agree() {
        assert_eq!(fold("preporučujem"), fold("preporucujem"));
        assert_eq!(fold("Trebao bih prebaciti novac"), "trebao bih prebaciti novac");
    }
}
