use super::markup::MarkupDialect;

const NBSP: &str = "&nbsp;";

/// Escape renderer output so it can sit inside a text node of the target dialect.
///
/// HTML-significant characters are escaped first, then the MDX expression
/// braces, and finally spaces become `&nbsp;` so that terminal alignment
/// survives whitespace collapsing.
pub(crate) fn escape_text(text: &str, dialect: MarkupDialect) -> String {
    let html = escape_html(text);
    let braced = match dialect {
        MarkupDialect::Mdx => escape_braces(&html),
        MarkupDialect::Html => html,
    };
    braced.replace(' ', NBSP)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// `{'{'}` is an inert JSX expression that evaluates to the literal brace.
fn escape_braces(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '{' => escaped.push_str("{'{'}"),
            '}' => escaped.push_str("{'}'}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
