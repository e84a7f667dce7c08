//! Markup formatter: assistant reply text → structured rich text.
//!
//! Fenced code blocks and inline code spans are protected: their content is
//! reproduced byte-identical in the output no matter what characters it
//! contains. Everything else goes through a fixed sequence of structural
//! passes (see `block.rs`).
//!
//! # Examples
//!
//! ```
//! use confab::markup::{self, Block};
//!
//! let rich = markup::format("Here is code:\n```python\nprint(1)\n```");
//! assert_eq!(
//!     rich.blocks[1],
//!     Block::CodeBlock { language: Some("python".into()), code: "print(1)\n".into() }
//! );
//! ```

mod block;
mod html;
mod inline;
pub(crate) mod protect;

use serde::{Deserialize, Serialize};

/// Inline content of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Span {
    Text(String),
    /// Inline code, verbatim.
    Code(String),
    Strong(Vec<Span>),
    Emphasis(Vec<Span>),
    LineBreak,
}

/// Marker of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMarker {
    Bullet,
    Ordered(u64),
}

/// A block-level element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, content: Vec<Span> },
    Paragraph(Vec<Span>),
    /// A self-contained list item; items never share a container.
    ListItem { marker: ListMarker, content: Vec<Span> },
    Blockquote(Vec<Span>),
    /// Fenced code, verbatim.
    CodeBlock { language: Option<String>, code: String },
}

/// Structured rendering of one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub blocks: Vec<Block>,
}

impl RichText {
    /// Concatenated textual content, blocks separated by blank lines.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { content, .. }
                | Block::Paragraph(content)
                | Block::ListItem { content, .. }
                | Block::Blockquote(content) => spans_plain_text(content),
                Block::CodeBlock { code, .. } => code.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn spans_plain_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(text) | Span::Code(text) => out.push_str(text),
            Span::Strong(children) | Span::Emphasis(children) => {
                out.push_str(&spans_plain_text(children));
            }
            Span::LineBreak => out.push('\n'),
        }
    }
    out
}

/// Format reply text into structured rich text.
///
/// Pure and deterministic: the same input always yields the same output.
#[must_use]
pub fn format(text: &str) -> RichText {
    RichText {
        blocks: block::build(text),
    }
}
