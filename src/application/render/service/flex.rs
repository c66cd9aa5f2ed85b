use super::ansi::AnsiConverter;
use super::markup::MarkupWriter;

/// Marker the prompt renderer emits in place of fill whitespace. Private-use
/// code points survive escaping untouched and never appear in SGR sequences.
pub(crate) const FLEXIBLE_SPACE_SENTINEL: &str = "\u{e000}kitsch-flex\u{e000}";

const FLEX_CONTAINER_CLASS: &str = "kitsch-flex";
const FLEX_ITEM_CLASS: &str = "kitsch-flex-item";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedLine {
    pub(crate) markup: String,
    /// The line is a block-level flex row and already ends the visual line.
    pub(crate) is_flex_row: bool,
}

/// Demo-file directive asking the renderer to emit the sentinel for flexible spaces.
pub(crate) fn flexible_space_directive() -> String {
    let mut quoted = String::new();
    for ch in FLEXIBLE_SPACE_SENTINEL.chars() {
        if ch.is_ascii() {
            quoted.push(ch);
        } else {
            quoted.push_str(&format!("\\u{:04X}", u32::from(ch)));
        }
    }
    format!("flexibleSpaceReplacement: \"{quoted}\"")
}

/// Convert one escaped output line into markup, splitting it into flex items
/// wherever the sentinel appears.
pub(crate) fn render_line(
    line: &str,
    converter: &mut AnsiConverter,
    writer: &MarkupWriter,
) -> RenderedLine {
    if !line.contains(FLEXIBLE_SPACE_SENTINEL) {
        return RenderedLine {
            markup: writer.spans(&converter.convert(line)),
            is_flex_row: false,
        };
    }

    let item_class = writer.class_attribute(FLEX_ITEM_CLASS);
    let mut markup = format!("<div {}>", writer.class_attribute(FLEX_CONTAINER_CLASS));
    for segment in line.split(FLEXIBLE_SPACE_SENTINEL) {
        let runs = converter.convert(segment);
        markup.push_str(&format!("<div {item_class}>{}</div>", writer.spans(&runs)));
    }
    markup.push_str("</div>");

    RenderedLine {
        markup,
        is_flex_row: true,
    }
}
