//! Trac wiki markup to Markdown conversion
//!
//! Conversion is a fixed sequence of whole-document regex rewrites. Code is
//! handled first: every fenced or inline code region is swapped for an
//! opaque placeholder, the remaining passes run on what is left, and the
//! code regions are restored at the end. Text inside code is therefore never
//! rewritten.

use regex::{Captures, Regex};
use std::sync::OnceLock;

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Compiled rewrite rules, built once per process
struct Rules {
    markdown_fence: Regex,
    trac_block: Regex,
    markdown_inline: Regex,
    trac_inline: Regex,
    placeholder: Regex,
    heading: Regex,
    /// Ordered `(pattern, replacement)` pairs applied after headings
    passes: Vec<(Regex, &'static str)>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(Rules::compile)
}

impl Rules {
    fn compile() -> Self {
        let re = |pattern: &str| {
            Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid markup pattern {pattern:?}: {e}"))
        };

        let passes = vec![
            // emphasis, longest marker first
            (re(r"'''''(.+?)'''''"), "***$1***"),
            (re(r"'''(.+?)'''"), "**$1**"),
            (re(r"''(.+?)''"), "*$1*"),
            (re(r"__([^_\n]+)__"), "<u>$1</u>"),
            (re(r"\^([^\^\n]+)\^"), "<sup>$1</sup>"),
            (re(r",,([^,\n]+),,"), "<sub>$1</sub>"),
            (re(r"\[\[[Bb][Rr]\]\]"), "  \n"),
            (re(r"(?m)^----+[ \t]*$"), "---"),
            (re(r"\[(https?://[^\s\]]+)[ \t]+([^\]]+)\]"), "[$2]($1)"),
            (re(r"\[wiki:([^\s\]]+)[ \t]+([^\]]+)\]"), "[$2]($1.md)"),
            (re(r"(?m)^[ \t]*[*\-][ \t]+(.*)$"), "* $1"),
            // letter and roman markers only count as list items when indented
            (
                re(r"(?m)^(?:[ \t]*\d+|[ \t]+(?:[a-zA-Z]|[ivxIVX]+))\.[ \t]+(.*)$"),
                "1. $1",
            ),
            (re(r"(?m)^(.+?)::[ \t]+(.+)$"), "$1\n: $2"),
            (re(r"(?m)^ {2,}(\S.*)$"), "> $1"),
        ];

        Self {
            markdown_fence: re(r"(?s)```.*?```"),
            // leading indentation belongs to the block
            trac_block: re(
                r"(?ms)(?:^([ \t]*))?\{\{\{[ \t]*\n?[ \t]*(?:#!([\w+-]+))?[ \t]*\n(.*?)\n?[ \t]*\}\}\}",
            ),
            markdown_inline: re(r"`[^`\n]+`"),
            trac_inline: re(r"\{\{\{([^\n]+?)\}\}\}"),
            placeholder: re("\u{E000}(\\d+)\u{E001}"),
            // trailing '=' run is stripped
            heading: re(r"(?m)^(={1,6})[ \t]+(.+?)[ \t]*(?:=+[ \t]*)?$"),
            passes,
        }
    }
}

/// Stores protected regions and hands out placeholders for them
#[derive(Default)]
struct Protected {
    regions: Vec<String>,
}

impl Protected {
    fn stash(&mut self, region: String) -> String {
        self.regions.push(region);
        format!(
            "{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}",
            self.regions.len() - 1
        )
    }

    fn restore(&self, text: &str, placeholder: &Regex) -> String {
        placeholder
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.regions.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Converts Trac wiki markup into Markdown
///
/// The conversion is total: unknown markup is passed through unchanged.
/// Running it on its own output yields the same output.
///
/// # Example
///
/// ```
/// use trac2gitlab::core::transform::markup::convert;
///
/// let md = convert("= Title =\n'''bold''' and {{{code}}}");
/// assert_eq!(md, "# Title\n**bold** and `code`");
/// ```
pub fn convert(text: &str) -> String {
    let rules = rules();
    let mut protected = Protected::default();

    let text = text.replace("\r\n", "\n");

    let text = rules
        .markdown_fence
        .replace_all(&text, |caps: &Captures| protected.stash(caps[0].to_string()))
        .into_owned();

    let text = rules
        .trac_block
        .replace_all(&text, |caps: &Captures| {
            let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let lang = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let body = dedent(&caps[3], indent);
            protected.stash(format!("```{lang}\n{body}\n```"))
        })
        .into_owned();

    let text = rules
        .markdown_inline
        .replace_all(&text, |caps: &Captures| protected.stash(caps[0].to_string()))
        .into_owned();

    let text = rules
        .trac_inline
        .replace_all(&text, |caps: &Captures| {
            protected.stash(format!("`{}`", &caps[1]))
        })
        .into_owned();

    let mut text = rewrite_headings(&rules.heading, &text);
    for (pattern, replacement) in &rules.passes {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    protected.restore(&text, &rules.placeholder)
}

/// Removes `indent` from every line of a code block that starts with it
fn dedent(body: &str, indent: &str) -> String {
    if indent.is_empty() {
        return body.to_string();
    }
    body.lines()
        .map(|line| line.strip_prefix(indent).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rewrite_headings(pattern: &Regex, text: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            format!("{} {}", "#".repeat(caps[1].len()), &caps[2])
        })
        .into_owned()
}
