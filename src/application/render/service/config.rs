use comrak::options::{ListStyleType, Options};

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

// Extensions are limited to what docs pages use, so round-tripping a document
// back to CommonMark leaves untouched content readable by the MDX compiler.
fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = false;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.front_matter_delimiter = Some("---".to_string());

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.full_info_string = true;
    render.list_style = ListStyleType::Dash;
    render.r#unsafe = true;
    render.sourcepos = false;
}

#[cfg(test)]
mod tests {
    use super::default_options;
    use comrak::{Arena, format_commonmark, format_html, parse_document};

    #[test]
    fn front_matter_survives_round_trip() {
        let options = default_options();
        let arena = Arena::new();
        let markdown = "---\nid: modules\n---\n\n# Modules\n";
        let root = parse_document(&arena, markdown, &options);

        let mut rendered = String::new();
        format_commonmark(root, &options, &mut rendered).expect("commonmark");
        assert!(rendered.starts_with("---\nid: modules\n---"), "{rendered}");
    }

    #[test]
    fn raw_html_is_not_omitted() {
        let options = default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, "<div class=\"x\">hi</div>\n", &options);

        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        assert!(html.contains("<div class=\"x\">hi</div>"));
    }
}
