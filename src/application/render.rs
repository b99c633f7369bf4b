//! Markdown rendering shared by posts, pages and live entries.

use comrak::{
    Arena, Options, format_html,
    nodes::{AstNode, NodeHtmlBlock, NodeValue},
    parse_document,
};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};
use thiserror::Error;
use tracing::warn;

/// Public prefix under which post images are served.
pub const IMAGES_PREFIX: &str = "/images/";

const ABSOLUTE_SRC_PREFIXES: [&str; 4] = ["http://", "https://", "/", "data:"];

/// Wrapper class on highlighted code blocks; token spans use `syntax-*`.
pub const HIGHLIGHT_CLASS: &str = "highlight";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document processing failed: {message}")]
    Document { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
}

/// Comrak-based renderer with tables, strikethrough, heading anchors and
/// syntect-highlighted fenced code.
pub struct MarkdownRenderer {
    options: Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        }
    }

    /// Render markdown to HTML. Code blocks are highlighted; a block that
    /// fails to highlight is emitted as plain escaped code.
    pub fn render(&self, markdown: &str) -> String {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);
        self.highlight_code_blocks(root);

        let mut html = String::new();
        if let Err(err) = format_html(root, &self.options, &mut html) {
            warn!(target: "driftlog::render", error = %err, "Failed to format markdown");
        }
        html
    }

    /// Render a content document: markdown to HTML, then relative `src`
    /// attributes rewritten under [`IMAGES_PREFIX`].
    pub fn render_document(&self, markdown: &str) -> Result<String, RenderError> {
        let html = self.render(markdown);
        rewrite_image_paths(&html)
    }

    fn highlight_code_blocks<'a>(&self, root: &'a AstNode<'a>) {
        for node in root.descendants() {
            let Some((info, literal)) = code_block(node) else {
                continue;
            };
            let language = info.split_whitespace().next();
            match highlight_code(language, &literal, &self.syntax_set, &self.class_style) {
                Ok(html) => {
                    node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
                        block_type: 0,
                        literal: html,
                    });
                }
                Err(err) => {
                    warn!(target: "driftlog::render", error = %err, "Leaving code block unhighlighted");
                }
            }
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.table = true;
    ext.strikethrough = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.header_ids = Some(String::new());

    let render = &mut options.render;
    render.r#unsafe = true;

    options
}

fn code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::CodeBlock(block) => Some((block.info.trim().to_string(), block.literal.clone())),
        _ => None,
    }
}

fn highlight_code(
    language: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let lang_token = language.unwrap_or("text").to_ascii_lowercase();
    let syntax =
        find_syntax(syntax_set, &lang_token).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code = code.to_string();
    if !code.ends_with('\n') {
        code.push('\n');
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);
    for line in LinesWithEndings::from(code.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.clone(),
                message: err.to_string(),
            })?;
    }

    let lang_attr: String = lang_token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect();
    Ok(format!(
        "<pre class=\"{HIGHLIGHT_CLASS}\" data-language=\"{lang_attr}\"><code class=\"language-{lang_attr}\">{}</code></pre>\n",
        generator.finalize()
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    syntax_set
        .find_syntax_by_token(token)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(token))
}

/// Rewrite every relative `src` attribute, on any element, to
/// `/images/<filename>`.
pub fn rewrite_image_paths(html: &str) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("[src]", |el| {
                if let Some(src) = el.get_attribute("src")
                    && let Some(rewritten) = rewrite_image_src(&src)
                {
                    el.set_attribute("src", &rewritten)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}

/// Compute the rewritten source for a relative image reference.
///
/// Returns `None` when the source is already absolute and must be kept.
pub fn rewrite_image_src(src: &str) -> Option<String> {
    if ABSOLUTE_SRC_PREFIXES
        .iter()
        .any(|prefix| src.starts_with(prefix))
    {
        return None;
    }

    let relative = src.trim_start_matches(['.', '/']);
    let filename = relative.rsplit('/').next().unwrap_or(relative);
    Some(format!("{IMAGES_PREFIX}{filename}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sources_are_moved_under_images() {
        assert_eq!(rewrite_image_src("face.jpg").as_deref(), Some("/images/face.jpg"));
        assert_eq!(rewrite_image_src("./face.jpg").as_deref(), Some("/images/face.jpg"));
        assert_eq!(
            rewrite_image_src("../assets/img/face.jpg").as_deref(),
            Some("/images/face.jpg")
        );
    }

    #[test]
    fn absolute_sources_are_left_alone() {
        for src in [
            "http://example.com/a.png",
            "https://example.com/a.png",
            "/images/a.png",
            "data:image/png;base64,AAAA",
        ] {
            assert_eq!(rewrite_image_src(src), None, "{src}");
        }
    }

    #[test]
    fn rendered_markdown_images_are_rewritten() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render_document("![face](./pics/face.jpg)\n\n![logo](https://cdn.example.com/logo.svg)\n")
            .expect("render");
        assert!(html.contains(r#"src="/images/face.jpg""#), "{html}");
        assert!(html.contains(r#"src="https://cdn.example.com/logo.svg""#), "{html}");
    }

    #[test]
    fn raw_html_images_are_rewritten() {
        let html = rewrite_image_paths(r#"<p><img src="diagram.png" alt="d"></p>"#).expect("rewrite");
        assert_eq!(html, r#"<p><img src="/images/diagram.png" alt="d"></p>"#);
    }

    #[test]
    fn any_element_with_a_relative_src_is_rewritten() {
        let html = rewrite_image_paths(
            r#"<video src="clip.mp4"><source src="./media/clip.webm"></video><iframe src="https://example.com/embed"></iframe>"#,
        )
        .expect("rewrite");
        assert!(html.contains(r#"<video src="/images/clip.mp4">"#), "{html}");
        assert!(html.contains(r#"<source src="/images/clip.webm">"#), "{html}");
        assert!(html.contains(r#"<iframe src="https://example.com/embed">"#), "{html}");
    }

    #[test]
    fn renders_tables_and_heading_anchors() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Hello\n\nSome `inline code`.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains(r#"id="hello""#), "{html}");
        assert!(html.contains("Hello</h2>"), "{html}");
        assert!(html.contains("<code>inline code</code>"), "{html}");
        assert!(html.contains("<table>"), "{html}");
    }

    #[test]
    fn fenced_code_is_highlighted() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```\n");
        assert!(
            html.contains(r#"<pre class="highlight" data-language="rust"><code class="language-rust">"#),
            "{html}"
        );
        assert!(html.contains("syntax-"), "{html}");
        assert!(html.contains("main"), "{html}");
    }

    #[test]
    fn unknown_languages_fall_back_to_plain_text() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\n<b>&</b>\n```\n");
        assert!(html.contains(r#"data-language="nosuchlang""#), "{html}");
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"), "{html}");
        assert!(!html.contains("<b>&</b>"), "{html}");
    }
}
