//! Markdown rendering

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

/// Markdown renderer
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        // Metadata blocks are stripped before rendering
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION;
        Self { options }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }

    /// Text of the first paragraph, used for index excerpts
    pub fn first_paragraph(&self, markdown: &str) -> Option<String> {
        let mut text = String::new();
        let mut in_paragraph = false;
        let mut in_image = false;
        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::Paragraph) => in_paragraph = true,
                Event::End(TagEnd::Paragraph) if in_paragraph => {
                    if !text.trim().is_empty() {
                        return Some(text.trim().to_string());
                    }
                    in_paragraph = false;
                    text.clear();
                }
                Event::Start(Tag::Image { .. }) => in_image = true,
                Event::End(TagEnd::Image) => in_image = false,
                Event::Text(t) | Event::Code(t) if in_paragraph && !in_image => {
                    text.push_str(&t)
                }
                Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Title\n\nSome ~~old~~ text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_code_block_language_class() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="language-rust">"#));
    }

    #[test]
    fn test_first_paragraph_skips_images() {
        let renderer = MarkdownRenderer::new();
        let md = "![cover](imgs/a.png)\n\nFirst `real`\nparagraph.\n\nSecond.";
        assert_eq!(
            renderer.first_paragraph(md).as_deref(),
            Some("First real paragraph.")
        );
    }
}
