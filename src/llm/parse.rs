//! Extraction and repair helpers for model output.
//!
//! Models wrap JSON in prose, leave raw newlines inside strings, add trailing
//! commas and prefix HTML with chatter. Each helper fixes one of these.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::de::DeserializeOwned;

static CONTROL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("valid regex"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static MULTILINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<code>([^<]*\n[^<]*)</code>").expect("valid regex"));
static PRE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<pre><code>(.*?)</code></pre>").expect("valid regex"));
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("valid regex"));
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](\s+|$)").expect("valid regex"));

/// Chatter that models put in front of generated HTML.
const KNOWN_PREFIXES: &[&str] = &[
    "Here is the educational content:",
    "Here's the educational content:",
    "Educational content:",
    "Content:",
    "Here is the content:",
    "Here's the content:",
    "``` Here is the HTML-formatted educational content:",
    "Here is the HTML-formatted educational content:",
    "Do not include any instructions or comments.",
    "Do not include any course, module, or section headings.",
    "Just the HTML content.",
    "Do not include a title or any introductory sentences.",
    "Do not include any unnecessary information.",
    "Do not include any references or citations.",
    "-->",
    "```html",
    "```",
];

/// Slice from the first `[` to the last `]`.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Slice from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Removes ASCII control characters other than tab, newline and carriage return.
pub fn strip_control_chars(text: &str) -> String {
    CONTROL_CHARS_RE.replace_all(text, "").into_owned()
}

/// Escapes raw newlines, carriage returns and tabs that sit inside JSON strings.
///
/// Whitespace between tokens is left alone so pretty-printed JSON still parses.
pub fn escape_inner_newlines(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    out.push(c);
                }
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}

pub fn strip_trailing_commas(json: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json, "$1").into_owned()
}

/// Parses `json` as-is, then again after every repair step.
pub fn parse_lenient<T: DeserializeOwned>(json: &str) -> Option<T> {
    if let Ok(value) = serde_json::from_str(json) {
        return Some(value);
    }

    let repaired = strip_trailing_commas(&escape_inner_newlines(&strip_control_chars(
        json.trim_start_matches('\u{feff}'),
    )));
    serde_json::from_str(&repaired).ok()
}

/// Extracts the first array in `text` and parses it leniently.
pub fn parse_json_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    parse_lenient(extract_json_array(text)?)
}

/// Pulls `"field": "value"` out of broken JSON.
pub fn regex_field(json: &str, field: &str) -> Option<String> {
    let pattern = format!(r#"(?s)"{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    let raw = re.captures(json)?.get(1)?.as_str();
    Some(
        raw.replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\\"", "\"")
            .replace("\\\\", "\\"),
    )
}

/// Repeatedly removes known chatter from the start of generated content.
pub fn strip_known_prefixes(text: &str) -> String {
    let mut current = text.trim();
    loop {
        let stripped = KNOWN_PREFIXES
            .iter()
            .find_map(|prefix| current.strip_prefix(prefix));
        match stripped {
            Some(rest) => current = rest.trim_start(),
            None => break,
        }
    }
    current.trim_end().trim_end_matches("```").trim_end().to_string()
}

/// Normalizes code markup in generated HTML.
///
/// Multi-line `<code>` becomes `<pre><code>`, doubled `<pre>` wrappers are
/// collapsed, and runs of blank lines inside code blocks are squeezed.
pub fn fix_code_blocks(html: &str) -> String {
    let wrapped = MULTILINE_CODE_RE.replace_all(html, "<pre><code>$1</code></pre>");
    let collapsed = wrapped
        .replace("<pre><pre><code>", "<pre><code>")
        .replace("</code></pre></pre>", "</code></pre>");

    PRE_BLOCK_RE
        .replace_all(&collapsed, |caps: &Captures| {
            let cleaned = BLANK_RUN_RE.replace_all(&caps[1], "\n\n");
            format!("<pre><code>{}</code></pre>", cleaned.trim())
        })
        .into_owned()
}

/// The first `n` sentences of `text`, joined by single spaces.
pub fn first_sentences(text: &str, n: usize) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END_RE.find_iter(text) {
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
        if sentences.len() == n {
            return sentences.join(" ");
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() && sentences.len() < n {
        sentences.push(rest);
    }
    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Module {
        title: String,
        description: String,
    }

    #[test]
    fn test_extract_json_array_from_prose() {
        let text = "Sure! Here you go:\n[{\"title\": \"A\"}]\nHope that helps.";
        assert_eq!(extract_json_array(text), Some("[{\"title\": \"A\"}]"));
        assert_eq!(extract_json_array("no json"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn test_extract_json_object() {
        let text = "Result: {\"grade\": 80, \"feedback\": \"ok\"} done";
        assert_eq!(
            extract_json_object(text),
            Some("{\"grade\": 80, \"feedback\": \"ok\"}")
        );
    }

    #[test]
    fn test_escape_inner_newlines_keeps_structure() {
        let raw = "{\n  \"instructions\": \"line one\nline two\"\n}";
        let fixed = escape_inner_newlines(raw);
        let value: serde_json::Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["instructions"], "line one\nline two");
    }

    #[test]
    fn test_parse_lenient_repairs_common_damage() {
        let raw = "[{\"title\": \"Intro\", \"description\": \"Covers\nbasics\",},]";
        let modules: Vec<Module> = parse_lenient(raw).unwrap();
        assert_eq!(modules[0].description, "Covers\nbasics");

        let with_control = "[\"a\u{0007}\", \"b\"]";
        let strings: Vec<String> = parse_lenient(with_control).unwrap();
        assert_eq!(strings, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_json_array_from_chatter() {
        let text = "Here are the topics: [\"One\", \"Two\", \"Three\"] - enjoy";
        let topics: Vec<String> = parse_json_array(text).unwrap();
        assert_eq!(topics.len(), 3);
        assert!(parse_json_array::<String>("nothing here").is_none());
    }

    #[test]
    fn test_regex_field_fallback() {
        let broken = r#"{"title": "Market \"Study\"", "instructions": "Step 1\nStep 2", oops}"#;
        assert_eq!(regex_field(broken, "title").as_deref(), Some("Market \"Study\""));
        assert_eq!(
            regex_field(broken, "instructions").as_deref(),
            Some("Step 1\nStep 2")
        );
        assert_eq!(regex_field(broken, "missing"), None);
    }

    #[test]
    fn test_strip_known_prefixes() {
        let text = "Here is the content:\n```html\n<p>Body</p>\n```";
        assert_eq!(strip_known_prefixes(text), "<p>Body</p>");
        assert_eq!(strip_known_prefixes("<p>Clean</p>"), "<p>Clean</p>");
    }

    #[test]
    fn test_fix_code_blocks() {
        let html = "<p>x</p><code>fn main() {\n\n\n\n}</code>";
        assert_eq!(
            fix_code_blocks(html),
            "<p>x</p><pre><code>fn main() {\n\n}</code></pre>"
        );

        let single = "<code>let x = 1;</code>";
        assert_eq!(fix_code_blocks(single), single);

        let nested = "<pre><code>a\nb</code></pre>";
        assert_eq!(fix_code_blocks(nested), nested);
    }

    #[test]
    fn test_first_sentences() {
        let text = "One. Two! Three? Four. Five.";
        assert_eq!(first_sentences(text, 4), "One. Two! Three? Four.");
        assert_eq!(first_sentences("No terminator here", 2), "No terminator here");
        assert_eq!(first_sentences("Version 1.5 is out. Next.", 1), "Version 1.5 is out.");
    }
}
