//! Markup stripping for model replies
//!
//! Converts markdown/HTML-flavoured model output into plain text. Bullets are
//! normalized to `- ` and every ordered-list marker becomes `1. `, so
//! original item numbers are not kept.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static HTML_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static HTML_BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div|li|ul|ol|h[1-6]|blockquote|pre)\s*>").unwrap());
static HTML_LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li(\s[^>]*)?>").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(```|~~~).*(\n|$)").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").unwrap());
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());
static HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*([-*_])([ \t]*[-*_]){2,}[ \t]*$").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]\n]*)\]\([^)\n]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\n]*\)").unwrap());

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[-*+][ \t]+").unwrap());
static ORDERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*)\d+[.)][ \t]+").unwrap());

static STRONG_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static STRONG_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());
static STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~\n]+?)~~").unwrap());
static EM_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").unwrap());
static EM_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\s](?:[^_\n]*[^_\s])?)_([^\w]|$)").unwrap());

static TRAILING_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip markup from `text`. Idempotent.
pub fn sanitize(text: &str) -> String {
    let mut current = text.replace("\r\n", "\n");
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

// Every step either removes characters or rewrites a list marker into its
// canonical form, so repeated passes reach a fixpoint.
fn sanitize_pass(text: &str) -> String {
    let s = HTML_COMMENT.replace_all(text, "");
    let s = HTML_BREAK.replace_all(&s, "\n");
    let s = HTML_BLOCK_END.replace_all(&s, "\n");
    let s = HTML_LIST_ITEM.replace_all(&s, "- ");
    let s = HTML_TAG.replace_all(&s, "");

    let s = CODE_FENCE.replace_all(&s, "");
    let s = s.replace('`', "");
    let s = HEADING.replace_all(&s, "");
    let s = BLOCKQUOTE.replace_all(&s, "");
    let s = HORIZONTAL_RULE.replace_all(&s, "");
    let s = IMAGE.replace_all(&s, "$1");
    let s = LINK.replace_all(&s, "$1");

    // List markers before emphasis so `* item` is not read as emphasis
    let s = BULLET.replace_all(&s, "${1}- ");
    let s = ORDERED.replace_all(&s, "${1}1. ");

    let s = STRONG_STAR.replace_all(&s, "$1");
    let s = STRONG_UNDERSCORE.replace_all(&s, "$1");
    let s = STRIKE.replace_all(&s, "$1");
    let s = EM_STAR.replace_all(&s, "$1");
    let s = EM_UNDERSCORE.replace_all(&s, "$1$2$3");

    let s = TRAILING_SPACE.replace_all(&s, "");
    let s = BLANK_RUN.replace_all(&s, "\n\n");

    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "plain text",
        "# Offer and Acceptance\n\nAn **offer** is a *definite* promise.",
        "1. Offer\n2. Acceptance\n3. Consideration",
        "* first\n+ second\n- third\n  * nested",
        "<p>Hello <strong>world</strong></p><ul><li>one</li><li>two</li></ul>",
        "> quoted __text__ and ~~gone~~",
        "```rust\nlet x = 1;\n```\nuse `code` here",
        "See [the statute](https://example.com) and ![img](a.png)",
        "---\n\n\n\n\nafter rule",
        "<<b>b>nested tags</b>",
        "**- bold bullet**",
        "snake_case_name stays",
        "a < b > c",
        "10) tenth\n11) eleventh",
        "***triple***",
    ];

    #[test]
    fn test_strips_emphasis_and_headings() {
        let out = sanitize("## Contract Law\n\nA **contract** is an _agreement_.");
        assert_eq!(out, "Contract Law\n\nA contract is an agreement.");
    }

    #[test]
    fn test_ordered_lists_flatten_to_one() {
        let out = sanitize("1. Offer\n2. Acceptance\n10) Consideration");
        assert_eq!(out, "1. Offer\n1. Acceptance\n1. Consideration");
    }

    #[test]
    fn test_bullets_are_normalized() {
        let out = sanitize("* first\n+ second\n- third\n  * nested");
        assert_eq!(out, "- first\n- second\n- third\n  - nested");
    }

    #[test]
    fn test_html_is_removed() {
        let out = sanitize("<p>Hello <strong>world</strong></p><ul><li>one</li><li>two</li></ul>");
        assert_eq!(out, "Hello world\n- one\n- two");
    }

    #[test]
    fn test_links_and_code() {
        assert_eq!(
            sanitize("See [the statute](https://example.com) and use `code`."),
            "See the statute and use code."
        );
        assert_eq!(sanitize("```\nlet x = 1;\n```"), "let x = 1;");
    }

    #[test]
    fn test_identifiers_and_comparisons_survive() {
        assert_eq!(sanitize("snake_case_name stays"), "snake_case_name stays");
        assert_eq!(sanitize("a < b > c"), "a < b > c");
    }

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(sanitize("one\n\n\n\n\ntwo  \n"), "one\n\ntwo");
    }

    #[test]
    fn test_is_idempotent() {
        for sample in SAMPLES {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
