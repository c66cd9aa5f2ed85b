use super::ansi::StyledRun;

/// Trailing glyph standing in for the terminal cursor.
pub(crate) const CURSOR: &str = "\u{258c}";
pub(crate) const LINE_BREAK: &str = "<br/>";

const MDX_CONTAINER: &str = "ExamplePrompt";
const HTML_CONTAINER_CLASS: &str = "example-prompt";

/// Target syntax for generated markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkupDialect {
    /// JSX embedded in MDX: object-literal `style`, `className`, escaped braces.
    Mdx,
    /// Plain HTML: CSS-string `style` and `class` attributes.
    Html,
}

/// Serialises styled runs and wrapper elements in one dialect.
#[derive(Debug, Clone)]
pub(crate) struct MarkupWriter {
    dialect: MarkupDialect,
    default_foreground: String,
}

impl MarkupWriter {
    pub(crate) fn new(dialect: MarkupDialect, default_foreground: impl Into<String>) -> Self {
        Self {
            dialect,
            default_foreground: default_foreground.into(),
        }
    }

    pub(crate) fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    pub(crate) fn spans(&self, runs: &[StyledRun]) -> String {
        let mut html = String::new();
        for run in runs {
            let declarations = run.style.declarations(&self.default_foreground);
            html.push_str("<span ");
            html.push_str(&self.style_attribute(&declarations));
            html.push('>');
            html.push_str(&run.text);
            html.push_str("</span>");
        }
        html
    }

    pub(crate) fn style_attribute(&self, declarations: &[(&'static str, String)]) -> String {
        match self.dialect {
            MarkupDialect::Mdx => {
                let entries = declarations
                    .iter()
                    .map(|(property, value)| format!("{}: \"{value}\"", camel_case(property)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("style={{{{{entries}}}}}")
            }
            MarkupDialect::Html => {
                let css = declarations
                    .iter()
                    .map(|(property, value)| format!("{property}:{value}"))
                    .collect::<Vec<_>>()
                    .join(";");
                format!("style=\"{css}\"")
            }
        }
    }

    pub(crate) fn class_attribute(&self, class: &str) -> String {
        match self.dialect {
            MarkupDialect::Mdx => format!("className=\"{class}\""),
            MarkupDialect::Html => format!("class=\"{class}\""),
        }
    }

    /// Wrap a rendered example body in the prompt container and append the cursor.
    pub(crate) fn container(&self, body: &str) -> String {
        match self.dialect {
            MarkupDialect::Mdx => {
                format!("<{MDX_CONTAINER}>\n{body}{CURSOR}</{MDX_CONTAINER}>")
            }
            MarkupDialect::Html => format!(
                "<div {}>\n{body}{CURSOR}</div>",
                self.class_attribute(HTML_CONTAINER_CLASS)
            ),
        }
    }
}

fn camel_case(property: &str) -> String {
    let mut result = String::with_capacity(property.len());
    let mut upper = false;
    for ch in property.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            result.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            result.push(ch);
        }
    }
    result
}
