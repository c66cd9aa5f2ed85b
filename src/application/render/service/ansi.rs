//! ANSI SGR parsing into structured, styled text runs.
//!
//! The converter keeps its style state between calls so that a colour opened on
//! one line (or flex segment) carries over to the next, the same way a terminal
//! would paint it.

use anstyle_parse::{DefaultCharAccumulator, Params, Parser, Perform};

// Standard 16-colour palette (VGA-ish), indexed by SGR colour number.
const PALETTE: [&str; 16] = [
    "#000000", "#aa0000", "#00aa00", "#aa5500", "#0000aa", "#aa00aa", "#00aaaa", "#aaaaaa",
    "#555555", "#ff5555", "#55ff55", "#ffff55", "#5555ff", "#ff55ff", "#55ffff", "#ffffff",
];

pub(crate) const DEFAULT_BACKGROUND: &str = "#000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub(crate) fn css(self) -> String {
        match self {
            Color::Indexed(index) if index < 16 => PALETTE[usize::from(index)].to_string(),
            Color::Indexed(index) if index < 232 => {
                let cube = index - 16;
                let level = |value: u8| if value == 0 { 0 } else { 55 + value * 40 };
                hex(level(cube / 36), level((cube / 6) % 6), level(cube % 6))
            }
            Color::Indexed(index) => {
                let grey = 8 + (index - 232) * 10;
                hex(grey, grey, grey)
            }
            Color::Rgb(r, g, b) => hex(r, g, b),
        }
    }
}

fn hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Text attributes in effect for a run of characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Style {
    pub(crate) foreground: Option<Color>,
    pub(crate) background: Option<Color>,
    pub(crate) bold: bool,
    pub(crate) dim: bool,
    pub(crate) italic: bool,
    pub(crate) underline: bool,
    pub(crate) strikethrough: bool,
    pub(crate) inverse: bool,
    pub(crate) hidden: bool,
}

impl Style {
    /// CSS declarations for this style as `(property, value)` pairs. Unstyled text
    /// still receives `default_foreground` so every run is explicitly coloured.
    pub(crate) fn declarations(&self, default_foreground: &str) -> Vec<(&'static str, String)> {
        let mut foreground = self
            .foreground
            .map(Color::css)
            .unwrap_or_else(|| default_foreground.to_string());
        let mut background = self.background.map(Color::css);

        if self.inverse {
            let swapped = background.unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());
            background = Some(foreground);
            foreground = swapped;
        }

        let mut declarations = vec![("color", foreground)];
        if let Some(background) = background {
            declarations.push(("background-color", background));
        }
        if self.bold {
            declarations.push(("font-weight", "bold".to_string()));
        }
        if self.dim {
            declarations.push(("opacity", "0.5".to_string()));
        }
        if self.italic {
            declarations.push(("font-style", "italic".to_string()));
        }
        match (self.underline, self.strikethrough) {
            (true, true) => {
                declarations.push(("text-decoration", "underline line-through".to_string()))
            }
            (true, false) => declarations.push(("text-decoration", "underline".to_string())),
            (false, true) => declarations.push(("text-decoration", "line-through".to_string())),
            (false, false) => {}
        }
        if self.hidden {
            declarations.push(("visibility", "hidden".to_string()));
        }
        declarations
    }

    fn apply_sgr(&mut self, params: &Params) {
        if params.is_empty() {
            *self = Style::default();
            return;
        }

        let mut params = params.iter();
        while let Some(param) = params.next() {
            let Some(&code) = param.first() else {
                continue;
            };

            match code {
                0 => *self = Style::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 | 21 => self.underline = true,
                7 => self.inverse = true,
                8 => self.hidden = true,
                9 => self.strikethrough = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                27 => self.inverse = false,
                28 => self.hidden = false,
                29 => self.strikethrough = false,
                30..=37 => self.foreground = Some(Color::Indexed(narrow(code - 30))),
                38 | 48 => {
                    // `38:5:n` arrives as one param with sub-params, `38;5;n` as three.
                    let color = if param.len() > 1 {
                        extended_from_subparams(&param[1..])
                    } else {
                        extended_from_params(&mut params)
                    };
                    if let Some(color) = color {
                        if code == 38 {
                            self.foreground = Some(color);
                        } else {
                            self.background = Some(color);
                        }
                    }
                }
                39 => self.foreground = None,
                40..=47 => self.background = Some(Color::Indexed(narrow(code - 40))),
                49 => self.background = None,
                90..=97 => self.foreground = Some(Color::Indexed(narrow(code - 90 + 8))),
                100..=107 => self.background = Some(Color::Indexed(narrow(code - 100 + 8))),
                _ => {}
            }
        }
    }
}

fn narrow(value: u16) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn extended_from_params<'p>(params: &mut impl Iterator<Item = &'p [u16]>) -> Option<Color> {
    let mut next = || params.next().and_then(|param| param.first().copied());
    match next()? {
        5 => next().map(|index| Color::Indexed(narrow(index))),
        2 => {
            let (r, g, b) = (next()?, next()?, next()?);
            Some(Color::Rgb(narrow(r), narrow(g), narrow(b)))
        }
        _ => None,
    }
}

// `2::r:g:b` carries an optional colour-space id before the channels.
fn extended_from_subparams(sub: &[u16]) -> Option<Color> {
    match sub {
        [5, index, ..] => Some(Color::Indexed(narrow(*index))),
        [2, .., r, g, b] => Some(Color::Rgb(narrow(*r), narrow(*g), narrow(*b))),
        _ => None,
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyledRun {
    pub(crate) text: String,
    pub(crate) style: Style,
}

#[derive(Debug, Default)]
pub(crate) struct AnsiConverter {
    style: Style,
}

impl AnsiConverter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Split `input` into styled runs, consuming SGR sequences. Every other
    /// escape (cursor movement, charset designation, OSC titles and hyperlinks)
    /// is dropped along with its parameters.
    pub(crate) fn convert(&mut self, input: &str) -> Vec<StyledRun> {
        let mut parser = Parser::<DefaultCharAccumulator>::new();
        let mut performer = RunCollector {
            style: &mut self.style,
            runs: Vec::new(),
            text: String::new(),
        };
        for byte in input.bytes() {
            parser.advance(&mut performer, byte);
        }
        performer.flush();
        performer.runs
    }
}

/// Remove every escape sequence from `text`, keeping line breaks.
pub(crate) fn strip_ansi(text: &str) -> String {
    let mut converter = AnsiConverter::new();
    text.split('\n')
        .map(|line| {
            converter
                .convert(line)
                .into_iter()
                .map(|run| run.text)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct RunCollector<'a> {
    style: &'a mut Style,
    runs: Vec<StyledRun>,
    text: String,
}

impl RunCollector<'_> {
    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        match self.runs.last_mut() {
            Some(last) if last.style == *self.style => last.text.push_str(&text),
            _ => self.runs.push(StyledRun {
                text,
                style: self.style.clone(),
            }),
        }
    }
}

impl Perform for RunCollector<'_> {
    fn print(&mut self, c: char) {
        self.text.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\t' {
            self.text.push('\t');
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: u8) {
        if ignore || action != b'm' || !intermediates.is_empty() {
            return;
        }
        let mut next = self.style.clone();
        next.apply_sgr(params);
        if next != *self.style {
            self.flush();
            *self.style = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(input: &str) -> Vec<StyledRun> {
        AnsiConverter::new().convert(input)
    }

    #[test]
    fn plain_text_is_a_single_default_run() {
        let runs = convert("hello");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "hello");
        assert_eq!(runs[0].style, Style::default());
    }

    #[test]
    fn bold_red_wraps_only_the_styled_word() {
        let runs = convert("\u{1b}[1;31mERROR\u{1b}[0m done");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "ERROR");
        assert!(runs[0].style.bold);
        assert_eq!(runs[0].style.foreground, Some(Color::Indexed(1)));
        assert_eq!(runs[1].text, " done");
        assert_eq!(runs[1].style, Style::default());
    }

    #[test]
    fn truecolor_and_256_colour_forms() {
        let runs = convert("\u{1b}[38;2;255;128;0ma\u{1b}[48;5;196mb");
        assert_eq!(runs[0].style.foreground, Some(Color::Rgb(255, 128, 0)));
        assert_eq!(runs[1].style.background, Some(Color::Indexed(196)));
        assert_eq!(Color::Indexed(196).css(), "#ff0000");
        assert_eq!(Color::Indexed(244).css(), "#808080");
    }

    #[test]
    fn colon_separated_truecolor() {
        let runs = convert("\u{1b}[38:2::10:20:30mx");
        assert_eq!(runs[0].style.foreground, Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn style_carries_across_calls() {
        let mut converter = AnsiConverter::new();
        converter.convert("\u{1b}[32mgreen");
        let runs = converter.convert("still green");
        assert_eq!(runs[0].style.foreground, Some(Color::Indexed(2)));
    }

    #[test]
    fn non_sgr_sequences_are_dropped() {
        let runs = convert("a\u{1b}[2Kb\u{1b}]8;;https://x.test\u{7}c\u{1b}]0;title\u{1b}\\d");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "abcd");
    }

    #[test]
    fn escape_sequences_without_csi_leave_no_text() {
        let runs = convert("\u{1b}[1mA\u{1b}(B\u{1b}[mB");
        let text: String = runs.iter().map(|run| run.text.as_str()).collect();
        assert_eq!(text, "AB");
        assert!(runs[0].style.bold);
        assert_eq!(runs[1].style, Style::default());

        let runs = convert("\u{1b}7one\u{1b}8two\u{1b}=three");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "onetwothree");
    }

    #[test]
    fn strip_ansi_keeps_text_and_newlines() {
        assert_eq!(
            strip_ansi("\u{1b}[31mfailed\u{1b}[0m\n\u{1b}]0;t\u{7}line two"),
            "failed\nline two"
        );
    }

    #[test]
    fn tabs_are_kept_and_other_controls_dropped() {
        let runs = convert("a\tb\u{7}c");
        assert_eq!(runs[0].text, "a\tbc");
    }

    #[test]
    fn truncated_sequences_do_not_panic() {
        assert!(convert("\u{1b}[38;2;1").is_empty());
        assert_eq!(convert("x\u{1b}").len(), 1);
    }

    #[test]
    fn inverse_swaps_colours() {
        let style = Style {
            foreground: Some(Color::Indexed(1)),
            inverse: true,
            ..Style::default()
        };
        let declarations = style.declarations("#cccccc");
        assert_eq!(declarations[0], ("color", DEFAULT_BACKGROUND.to_string()));
        assert_eq!(
            declarations[1],
            ("background-color", "#aa0000".to_string())
        );
    }
}
