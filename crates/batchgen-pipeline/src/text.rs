use regex::{Regex, RegexBuilder};

fn link_token() -> String {
    let md_link = r"\[[^\]]+\]\([^\)]+\)";
    let raw_url = r"https?://[^\s)]+";
    format!("(?:{md_link}|{raw_url})")
}

fn sources_pattern() -> Regex {
    let token = link_token();
    let pattern = format!(
        r"(?:[ \t]*[\r\n]+|[ \t]{{2,}}|[—–-]\s*)?(?:sources?|references?)\s*:\s*{token}(?:\s*[,·|]\s*{token})*\s*$"
    );
    RegexBuilder::new(&pattern).case_insensitive(true).dot_matches_new_line(true).build().expect("static pattern is valid")
}

fn paren_links_pattern() -> Regex {
    let token = link_token();
    let pattern = format!(r"\s*\(\s*{token}(?:\s*,\s*{token})*\s*\)\s*$");
    Regex::new(&pattern).expect("static pattern is valid")
}

const TRAILING_PUNCTUATION: [char; 8] = [' ', '\t', '\r', '\n', '—', '–', '-', '|'];

fn trim_trailing(s: &str) -> String {
    s.trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c == '·' || c == ',').to_string()
}

/// Strips a trailing citation/link block from the end of a generated bio.
///
/// Removes either a final parenthetical containing only links/URLs, or a
/// trailing "Sources:"/"References:" line whose content is only
/// links/URLs. Mid-text links and non-citation parentheses are left alone.
/// Idempotent: applying this twice gives the same result as applying it
/// once.
pub fn strip_trailing_citations(text: &str) -> String {
    if text.is_empty() {
        return text.to_string();
    }

    let sources = sources_pattern();
    let paren = paren_links_pattern();

    let mut current = text.trim_end().to_string();
    loop {
        let stripped = sources.replace(&current, "");
        let stripped = paren.replace(&stripped, "");
        let stripped = trim_trailing(&stripped);
        if stripped == current {
            return stripped;
        }
        current = stripped;
    }
}
