//! Output sanitizer: turns markdown-flavoured model output into the
//! HTML-ish text the document templates expect.
//!
//! Pipeline, in order:
//! 1. drop code-fence markers (```` ``` ```` and ```` ```html ````) and `'''`
//! 2. `**X**` → `<strong>X</strong>`
//! 3. `*X*` → `<em>X</em>`, unless the opening `*` starts the text or a line
//! 4. trim
//!
//! The result never contains anything steps 1–3 would rewrite again, so
//! `sanitize(sanitize(x)) == sanitize(x)`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)```(html)?").ok());
static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());

/// Sanitize raw generated text. Pure; never fails.
pub fn sanitize(text: &str) -> String {
    let text = strip_markers(text);
    let text = match BOLD.as_ref() {
        Some(re) => re.replace_all(&text, "<strong>$1</strong>"),
        None => Cow::Borrowed(text.as_str()),
    };
    convert_italic(&text).trim().to_string()
}

/// Remove fence and triple-quote markers until none are left.
///
/// Removing one marker can splice its neighbours into a new one
/// (`` `` ``` ` `` → `` ``` ``), so this runs to a fixpoint.
fn strip_markers(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("```") || out.contains("'''") {
        if let Some(re) = FENCE.as_ref() {
            out = re.replace_all(&out, "").into_owned();
        }
        out = out.replace("```", "").replace("'''", "");
    }
    out
}

/// Pair single asterisks on the same line into `<em>` spans.
///
/// An asterisk at the start of the text or right after a newline is a list
/// bullet and is kept verbatim, as is any asterisk with no partner later on
/// its line.
fn convert_italic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '*' || i == 0 || chars[i - 1] == '\n' {
            out.push(c);
            i += 1;
            continue;
        }

        let close = chars[i + 1..]
            .iter()
            .take_while(|&&ch| ch != '\n')
            .position(|&ch| ch == '*')
            .map(|offset| i + 1 + offset);

        match close {
            Some(end) => {
                out.push_str("<em>");
                out.extend(&chars[i + 1..end]);
                out.push_str("</em>");
                i = end + 1;
            }
            None => {
                out.push('*');
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_html_with_emphasis() {
        assert_eq!(
            sanitize("```html\n**Bold** and *italic*\n```"),
            "<strong>Bold</strong> and <em>italic</em>"
        );
    }

    #[test]
    fn test_fence_tag_case_insensitive() {
        assert_eq!(sanitize("```HTML\n<p>x</p>\n```"), "<p>x</p>");
        assert_eq!(sanitize("```\nplain\n```"), "plain");
    }

    #[test]
    fn test_triple_quotes_removed() {
        assert_eq!(sanitize("'''<div>Hi</div>'''"), "<div>Hi</div>");
    }

    #[test]
    fn test_multiple_bold_per_line() {
        assert_eq!(
            sanitize("**Rust** and **Go** experience"),
            "<strong>Rust</strong> and <strong>Go</strong> experience"
        );
    }

    #[test]
    fn test_bullets_untouched() {
        let input = "Skills:\n* Rust\n* SQL";
        assert_eq!(sanitize(input), input);
        assert_eq!(sanitize("* first item"), "* first item");
    }

    #[test]
    fn test_bullet_line_with_italic() {
        assert_eq!(
            sanitize("Intro\n* led *three* teams"),
            "Intro\n* led <em>three</em> teams"
        );
    }

    #[test]
    fn test_unpaired_asterisk_kept() {
        assert_eq!(sanitize("5 * 3 = 15"), "5 * 3 = 15");
    }

    #[test]
    fn test_italic_does_not_cross_lines() {
        assert_eq!(sanitize("a *b\nc* d"), "a *b\nc* d");
    }

    #[test]
    fn test_spliced_fence_removed() {
        assert_eq!(sanitize("``'''`x"), "x");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("  \n\t "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "```html\n**Bold** and *italic*\n```",
            "Intro\n* led *three* teams\n* **owned** roadmap",
            "***triple*** stars",
            "** lonely",
            "a ** b",
            "x\n**a*",
            "\n*a*",
            "*a *b* c*",
            "  *x",
            "``'''`' '' ```html html",
            "'''```html\n<ul>\n<li>*A*</li>\n</ul>\n```'''",
            "5 * 3 * 2",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
