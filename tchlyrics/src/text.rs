//! Nettoyage des chaînes de recherche et des paroles

use once_cell::sync::Lazy;
use regex::Regex;

static DECORATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("decoration pattern is valid"));

static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*$").expect("section header pattern is valid"));

static EMBED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d*\s*Embed\s*$").expect("embed pattern is valid"));

/// Chaîne de recherche à partir d'un titre de vidéo
///
/// `Artist - Song (Official Video) [HD]` devient `Artist - Song`.
pub fn search_query(title: &str) -> String {
    let stripped = DECORATION_RE.replace_all(title, " ");
    stripped
        .replace('"', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Paroles sans en-têtes de section, artefacts `Embed` ni lignes vides répétées
pub fn clean_lyrics(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        if SECTION_HEADER_RE.is_match(line) {
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let text = lines.join("\n");
    EMBED_RE.replace(&text, "").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_strips_decorations() {
        assert_eq!(
            search_query("Daft Punk - Around the World (Official Video) [HD]"),
            "Daft Punk - Around the World"
        );
        assert_eq!(search_query("\"Quoted\"   title"), "Quoted title");
    }

    #[test]
    fn test_clean_lyrics() {
        let raw = "[Intro]\nLine one\n\n\n[Chorus]\nLine two\nLine three\n\n42Embed";
        assert_eq!(clean_lyrics(raw), "Line one\n\nLine two\nLine three");
    }

    #[test]
    fn test_clean_lyrics_plain_text_unchanged() {
        assert_eq!(clean_lyrics("a\nb"), "a\nb");
    }
}
