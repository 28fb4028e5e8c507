//! Text helpers shared by the content, enrollment and user modules.
//!
//! Module bodies are stored as HTML fragments shaped like:
//!
//! ```html
//! <div class="module-content">
//! <h2>Title</h2>
//! <div class="module-description">
//! <p>Description</p>
//! </div>
//! ...
//! </div>
//! ```
//!
//! The helpers here read and rewrite the title and description parts of that
//! fragment without a full HTML parser.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SCRIPTISH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(script|on\w+)").expect("valid regex"));
static NAME_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s\-'.]").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").expect("valid regex"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div class="module-description">\s*<p>(.*?)</p>\s*</div>"#)
        .expect("valid regex")
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

const MAX_NAME_LEN: usize = 100;

/// Cleans a person's display name.
///
/// Tags and script-like fragments are removed, the result is capped at 100
/// characters and only letters, whitespace, `-`, `'` and `.` survive.
pub fn sanitize_full_name(name: &str) -> String {
    let without_tags = TAG_RE.replace_all(name, "");
    let without_scripts = SCRIPTISH_RE.replace_all(&without_tags, "");
    let capped: String = without_scripts.chars().take(MAX_NAME_LEN).collect();
    NAME_CHARS_RE.replace_all(&capped, "").trim().to_string()
}

/// Removes all tags and collapses runs of whitespace into single spaces.
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    collapse_whitespace(&decode_basic_entities(&text))
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

fn decode_basic_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escapes text for insertion into an HTML fragment.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Checks password strength, returning the first failed rule as a message.
pub fn check_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password needs an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password needs a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password needs a digit");
    }
    if !password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        return Err("Password needs a special character");
    }
    Ok(())
}

/// Title of a module: the `<h2>` text, else the first non-empty text line.
pub fn module_title(content_html: &str) -> Option<String> {
    if let Some(caps) = H2_RE.captures(content_html) {
        let title = strip_html(&caps[1]);
        if !title.is_empty() {
            return Some(title);
        }
    }

    let text = TAG_RE.replace_all(content_html, "\n");
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| collapse_whitespace(&decode_basic_entities(line)))
}

/// Title of a module with the positional fallback used in listings.
pub fn module_title_or_default(content_html: Option<&str>, position: i32) -> String {
    content_html
        .and_then(module_title)
        .unwrap_or_else(|| format!("Module {}", position))
}

pub fn module_description(content_html: &str) -> Option<String> {
    DESCRIPTION_RE
        .captures(content_html)
        .map(|caps| strip_html(&caps[1]))
        .filter(|d| !d.is_empty())
}

/// HTML shell for a freshly generated module.
pub fn module_shell_html(title: &str, description: &str) -> String {
    format!(
        "<div class=\"module-content\">\n<h2>{}</h2>\n<div class=\"module-description\">\n<p>{}</p>\n</div>\n<div class=\"module-body\">\n<p>Module content will be added here...</p>\n</div>\n</div>",
        escape_html(title),
        escape_html(description)
    )
}

/// HTML for a module inserted by hand at the given position.
pub fn default_module_html(position: i32) -> String {
    format!(
        "<h2>New Module {}</h2>\n<div class=\"module-description\">\n    <p>Module description...</p>\n</div>",
        position
    )
}

/// Replaces the title and description inside a module fragment.
///
/// A missing description block is inserted right after the `<h2>`. A missing
/// `<h2>` is prepended.
pub fn rewrite_module_html(content_html: &str, title: &str, description: &str) -> String {
    let title_html = format!("<h2>{}</h2>", escape_html(title));
    let description_html = format!(
        "<div class=\"module-description\"><p>{}</p></div>",
        escape_html(description)
    );

    let with_title = if H2_RE.is_match(content_html) {
        H2_RE
            .replace(content_html, regex::NoExpand(&title_html))
            .into_owned()
    } else {
        format!("{}\n{}", title_html, content_html)
    };

    if DESCRIPTION_RE.is_match(&with_title) {
        DESCRIPTION_RE
            .replace(&with_title, regex::NoExpand(&description_html))
            .into_owned()
    } else {
        match H2_RE.find(&with_title) {
            Some(m) => format!(
                "{}\n{}{}",
                &with_title[..m.end()],
                description_html,
                &with_title[m.end()..]
            ),
            None => format!("{}\n{}", description_html, with_title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_full_name() {
        assert_eq!(sanitize_full_name("Ana <b>Cruz</b>"), "Ana Cruz");
        assert_eq!(sanitize_full_name("O'Neil-Smith Jr."), "O'Neil-Smith Jr.");
        assert_eq!(sanitize_full_name("Bob<script>alert(1)</script>"), "Bobalert");
        assert_eq!(sanitize_full_name("Jo onclick"), "Jo");
        assert_eq!(sanitize_full_name(&"a".repeat(150)).len(), 100);
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        let html = "<p>Hello&nbsp;<b>world</b></p>\n\n<ul><li>one</li></ul>";
        assert_eq!(strip_html(html), "Hello world one");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("student@school.edu"));
        assert!(!is_valid_email("student@school"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[test]
    fn test_password_strength_rules() {
        assert_eq!(check_password_strength("short"), Err("Password must be at least 8 characters"));
        assert_eq!(check_password_strength("alllower1!"), Err("Password needs an uppercase letter"));
        assert_eq!(check_password_strength("NoDigits!!"), Err("Password needs a digit"));
        assert_eq!(check_password_strength("NoSpecial1"), Err("Password needs a special character"));
        assert!(check_password_strength("Str0ng!pass").is_ok());
    }

    #[test]
    fn test_module_title_from_h2_or_text() {
        let html = module_shell_html("Intro to Rust", "Basics");
        assert_eq!(module_title(&html).as_deref(), Some("Intro to Rust"));
        assert_eq!(module_title("<p>First line</p><p>Second</p>").as_deref(), Some("First line"));
        assert_eq!(module_title(""), None);
        assert_eq!(module_title_or_default(None, 3), "Module 3");
    }

    #[test]
    fn test_module_description() {
        let html = module_shell_html("Title", "Covers ownership & borrowing");
        assert_eq!(
            module_description(&html).as_deref(),
            Some("Covers ownership & borrowing")
        );
        assert_eq!(module_description("<h2>x</h2>"), None);
    }

    #[test]
    fn test_rewrite_module_replaces_existing_parts() {
        let html = default_module_html(2);
        let updated = rewrite_module_html(&html, "Traits", "Shared behaviour");
        assert_eq!(module_title(&updated).as_deref(), Some("Traits"));
        assert_eq!(module_description(&updated).as_deref(), Some("Shared behaviour"));
        assert!(!updated.contains("New Module 2"));
    }

    #[test]
    fn test_rewrite_module_inserts_missing_description() {
        let updated = rewrite_module_html("<h2>Old</h2>\n<p>body</p>", "New", "Desc");
        let h2_end = updated.find("</h2>").unwrap();
        let desc_start = updated.find("module-description").unwrap();
        assert!(desc_start > h2_end);
        assert!(updated.contains("<p>body</p>"));
    }

    #[test]
    fn test_rewrite_module_prepends_missing_title() {
        let updated = rewrite_module_html("<p>body</p>", "Fresh $1 title", "Desc");
        assert!(updated.starts_with("<h2>Fresh $1 title</h2>"));
        assert_eq!(module_description(&updated).as_deref(), Some("Desc"));
    }
}
