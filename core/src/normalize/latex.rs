use super::Normalizer;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // {\'{a}} and {\'a}: the outer group is consumed only when it opens before the command.
    static ref BRACED_ACCENT: Regex =
        Regex::new(r#"\{\\(['`^"~=.])\s?(?:\{(\\i|[A-Za-z])\}|(\\i|[A-Za-z]))\}"#).expect("valid regex");
    // \'{a} and \'a.
    static ref ACCENT: Regex =
        Regex::new(r#"\\(['`^"~=.])\s?(?:\{(\\i|[A-Za-z])\}|(\\i|[A-Za-z]))"#).expect("valid regex");
    static ref BRACED_CEDILLA: Regex =
        Regex::new(r"\{\\c(?:\{([A-Za-z])\}|\s([A-Za-z]))\}").expect("valid regex");
    static ref CEDILLA: Regex = Regex::new(r"\\c(?:\{([A-Za-z])\}|\s([A-Za-z]))").expect("valid regex");
    static ref DOTLESS_I: Regex = Regex::new(r"\{\\i\}|\\i\b").expect("valid regex");
}

/// Decodes LaTeX accent escapes into composed Unicode characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatexAccentDecoder;

fn combining_mark(command: &str) -> Option<char> {
    let mark = match command {
        "'" => '\u{0301}',
        "`" => '\u{0300}',
        "^" => '\u{0302}',
        "\"" => '\u{0308}',
        "~" => '\u{0303}',
        "=" => '\u{0304}',
        "." => '\u{0307}',
        _ => return None,
    };
    Some(mark)
}

fn compose(base: &str, mark: char) -> String {
    let base = if base == "\\i" { "i" } else { base };
    format!("{base}{mark}").nfc().collect()
}

fn decode_accents(regex: &Regex, text: &str) -> String {
    regex
        .replace_all(text, |caps: &Captures| {
            let base = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match combining_mark(&caps[1]) {
                Some(mark) => compose(base, mark),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn decode_cedillas(regex: &Regex, text: &str) -> String {
    regex
        .replace_all(text, |caps: &Captures| {
            let base = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            compose(base, '\u{0327}')
        })
        .into_owned()
}

impl Normalizer for LatexAccentDecoder {
    fn apply_to(&self, text: &str) -> String {
        if !text.contains('\\') {
            return text.to_string();
        }
        let accented = decode_accents(&ACCENT, &decode_accents(&BRACED_ACCENT, text));
        let cedilla = decode_cedillas(&CEDILLA, &decode_cedillas(&BRACED_CEDILLA, &accented));
        DOTLESS_I.replace_all(&cedilla, "i").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_vowels() {
        assert_eq!(LatexAccentDecoder.apply_to(r"\'a\'e\'i\'o\'u"), "áéíóú");
    }

    #[test]
    fn decodes_braced_forms() {
        let latex = LatexAccentDecoder;
        assert_eq!(latex.apply_to(r"{\'a}{\'e}{\'i}{\'o}{\'u}"), "áéíóú");
        assert_eq!(latex.apply_to(r"{\'{a}}{\'{e}}{\'{i}}{\'{o}}{\'{u}}"), "áéíóú");
        assert_eq!(latex.apply_to(r"\'{a}\'{e}\'{i}\'{o}\'{u}"), "áéíóú");
    }

    #[test]
    fn decodes_other_accents_and_keeps_case() {
        let latex = LatexAccentDecoder;
        assert_eq!(latex.apply_to(r"\~n"), "ñ");
        assert_eq!(latex.apply_to(r"\~N"), "Ñ");
        assert_eq!(latex.apply_to(r#"G\"{o}del"#), "Gödel");
        assert_eq!(latex.apply_to(r"gar\c{c}on"), "garçon");
        assert_eq!(latex.apply_to(r"Mar{\'{\i}}a"), "María");
    }

    #[test]
    fn decodes_inside_words() {
        assert_eq!(LatexAccentDecoder.apply_to(r"did{\'{a}}ctica"), "didáctica");
    }

    #[test]
    fn enclosing_groups_keep_their_braces() {
        let latex = LatexAccentDecoder;
        assert_eq!(latex.apply_to(r"\textbf{caf\'{e}}"), r"\textbf{café}");
        assert_eq!(latex.apply_to(r"\textit{\'a}"), r"\textitá");
        assert_eq!(latex.apply_to(r"\textsc{gar\c{c}}"), r"\textsc{garç}");
        assert_eq!(latex.apply_to(r"{\c c}a"), "ça");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(LatexAccentDecoder.apply_to("plain text"), "plain text");
        assert_eq!(LatexAccentDecoder.apply_to(""), "");
    }
}
