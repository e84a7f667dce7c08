//! HTML rendering of [`RichText`].
//!
//! All text, including code, is escaped; nothing from the reply is ever
//! emitted as raw markup.

use super::{Block, ListMarker, RichText, Span};

impl RichText {
    /// Render to an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for block in &self.blocks {
            render_block(block, &mut html);
        }
        html
    }
}

fn render_block(block: &Block, html: &mut String) {
    match block {
        Block::Heading { level, content } => {
            html.push_str(&format!("<h{level}>"));
            render_spans(content, html);
            html.push_str(&format!("</h{level}>"));
        }
        Block::Paragraph(content) => {
            html.push_str("<p>");
            render_spans(content, html);
            html.push_str("</p>");
        }
        Block::ListItem { marker, content } => {
            match marker {
                ListMarker::Bullet => html.push_str("<li class=\"bullet\">"),
                ListMarker::Ordered(n) => {
                    html.push_str(&format!("<li class=\"ordered\" value=\"{n}\">"));
                }
            }
            render_spans(content, html);
            html.push_str("</li>");
        }
        Block::Blockquote(content) => {
            html.push_str("<blockquote>");
            render_spans(content, html);
            html.push_str("</blockquote>");
        }
        Block::CodeBlock { language, code } => {
            match language {
                Some(lang) => html.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    html_escape(lang)
                )),
                None => html.push_str("<pre><code>"),
            }
            html.push_str(&html_escape(code));
            html.push_str("</code></pre>");
        }
    }
}

fn render_spans(spans: &[Span], html: &mut String) {
    for span in spans {
        match span {
            Span::Text(text) => html.push_str(&html_escape(text)),
            Span::Code(code) => {
                html.push_str("<code>");
                html.push_str(&html_escape(code));
                html.push_str("</code>");
            }
            Span::Strong(children) => {
                html.push_str("<strong>");
                render_spans(children, html);
                html.push_str("</strong>");
            }
            Span::Emphasis(children) => {
                html.push_str("<em>");
                render_spans(children, html);
                html.push_str("</em>");
            }
            Span::LineBreak => html.push_str("<br>"),
        }
    }
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
