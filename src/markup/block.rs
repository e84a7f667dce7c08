//! Structural passes over the protected token stream.
//!
//! Pass order is fixed: headings → emphasis → list items → blockquotes →
//! paragraphs, then inline code is restored, then fenced blocks, then empty
//! elements are collapsed.

use super::inline::{self, Inline};
use super::protect::{self, Piece, ProtectedSpans, Token};
use super::{Block, ListMarker, Span};

/// Line-level draft, generic over the body representation of each stage.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Draft<B> {
    Heading { level: u8, body: B },
    Text(B),
    ListItem { marker: ListMarker, body: B },
    Quote(B),
    Blank,
    Fence(usize),
}

/// Lines grouped into blocks; bodies still reference the code-span table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Grouped {
    Heading { level: u8, body: Vec<Inline> },
    Paragraph(Vec<Vec<Inline>>),
    ListItem { marker: ListMarker, body: Vec<Inline> },
    Quote(Vec<Inline>),
    Fence(usize),
}

/// Blocks with inline code restored; fenced blocks still pending.
enum Restored {
    Block(Block),
    Fence(usize),
}

/// Run the whole pipeline.
pub(crate) fn build(text: &str) -> Vec<Block> {
    let mut spans = ProtectedSpans::default();
    let pieces = protect::extract_fences(text, &mut spans);
    let lines = split_lines(pieces, &mut spans);

    let lines = mark_headings(lines);
    let lines = apply_emphasis(lines);
    let lines = mark_list_items(lines);
    let lines = mark_quotes(lines);
    let grouped = group_paragraphs(lines);

    let restored = restore_code_spans(grouped, &spans.code_spans);
    let blocks = restore_fences(restored, spans.fences);
    collapse_empty(blocks)
}

fn split_lines(pieces: Vec<Piece>, spans: &mut ProtectedSpans) -> Vec<Draft<Vec<Token>>> {
    let mut lines = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Fence(idx) => lines.push(Draft::Fence(idx)),
            Piece::Text(text) => {
                for tokens in protect::tokenize_lines(&text, spans) {
                    if is_blank_line(&tokens) {
                        lines.push(Draft::Blank);
                    } else {
                        lines.push(Draft::Text(tokens));
                    }
                }
            }
        }
    }
    lines
}

fn is_blank_line(tokens: &[Token]) -> bool {
    tokens.iter().all(|t| match t {
        Token::Text(s) => s.trim().is_empty(),
        Token::Code(_) => false,
    })
}

// ── Pass 1: headings ──────────────────────────────────────────

fn mark_headings(lines: Vec<Draft<Vec<Token>>>) -> Vec<Draft<Vec<Token>>> {
    lines
        .into_iter()
        .map(|line| match line {
            Draft::Text(mut tokens) => match heading_level(&mut tokens) {
                Some(level) => Draft::Heading {
                    level,
                    body: tokens,
                },
                None => Draft::Text(tokens),
            },
            other => other,
        })
        .collect()
}

/// Detect `#`, `##` or `###` followed by a space; strips the marker on match.
fn heading_level(tokens: &mut Vec<Token>) -> Option<u8> {
    let Some(Token::Text(first)) = tokens.first() else {
        return None;
    };
    let trimmed = first.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = trimmed[hashes..].strip_prefix(' ')?;
    let rest = rest.trim_start().to_owned();
    replace_first_text(tokens, rest);
    Some(hashes as u8)
}

fn replace_first_text(tokens: &mut Vec<Token>, rest: String) {
    if rest.is_empty() {
        tokens.remove(0);
    } else {
        tokens[0] = Token::Text(rest);
    }
}

// ── Pass 2: emphasis ──────────────────────────────────────────

fn apply_emphasis(lines: Vec<Draft<Vec<Token>>>) -> Vec<Draft<Vec<Inline>>> {
    lines
        .into_iter()
        .map(|line| match line {
            Draft::Heading { level, body } => Draft::Heading {
                level,
                body: inline::emphasize(&body),
            },
            Draft::Text(body) => Draft::Text(inline::emphasize(&body)),
            Draft::ListItem { marker, body } => Draft::ListItem {
                marker,
                body: inline::emphasize(&body),
            },
            Draft::Quote(body) => Draft::Quote(inline::emphasize(&body)),
            Draft::Blank => Draft::Blank,
            Draft::Fence(idx) => Draft::Fence(idx),
        })
        .collect()
}

// ── Pass 3: list items ────────────────────────────────────────

fn mark_list_items(lines: Vec<Draft<Vec<Inline>>>) -> Vec<Draft<Vec<Inline>>> {
    lines
        .into_iter()
        .map(|line| match line {
            Draft::Text(mut body) => match strip_list_marker(&mut body) {
                Some(marker) => Draft::ListItem { marker, body },
                None => Draft::Text(body),
            },
            other => other,
        })
        .collect()
}

fn strip_list_marker(body: &mut Vec<Inline>) -> Option<ListMarker> {
    let Some(Inline::Text(first)) = body.first() else {
        return None;
    };
    let trimmed = first.trim_start();

    let (marker, rest) = if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        (ListMarker::Bullet, rest)
    } else {
        let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let rest = trimmed[digits..].strip_prefix(". ")?;
        let number = trimmed[..digits].parse::<u64>().ok()?;
        (ListMarker::Ordered(number), rest)
    };

    let rest = rest.trim_start().to_owned();
    replace_first_inline(body, rest);
    Some(marker)
}

fn replace_first_inline(body: &mut Vec<Inline>, rest: String) {
    if rest.is_empty() {
        body.remove(0);
    } else {
        body[0] = Inline::Text(rest);
    }
}

// ── Pass 4: blockquotes ───────────────────────────────────────

fn mark_quotes(lines: Vec<Draft<Vec<Inline>>>) -> Vec<Draft<Vec<Inline>>> {
    lines
        .into_iter()
        .map(|line| match line {
            Draft::Text(mut body) => {
                if strip_quote_marker(&mut body) {
                    Draft::Quote(body)
                } else {
                    Draft::Text(body)
                }
            }
            other => other,
        })
        .collect()
}

fn strip_quote_marker(body: &mut Vec<Inline>) -> bool {
    let Some(Inline::Text(first)) = body.first() else {
        return false;
    };
    let trimmed = first.trim_start();
    let rest = if let Some(rest) = trimmed.strip_prefix("> ") {
        rest
    } else if trimmed == ">" {
        ""
    } else {
        return false;
    };
    let rest = rest.trim_start().to_owned();
    replace_first_inline(body, rest);
    true
}

// ── Pass 5: paragraphs ────────────────────────────────────────

fn group_paragraphs(lines: Vec<Draft<Vec<Inline>>>) -> Vec<Grouped> {
    let mut grouped = Vec::new();
    let mut paragraph: Vec<Vec<Inline>> = Vec::new();

    for line in lines {
        let node = match line {
            Draft::Text(body) => {
                paragraph.push(body);
                continue;
            }
            Draft::Heading { level, body } => Some(Grouped::Heading { level, body }),
            Draft::ListItem { marker, body } => Some(Grouped::ListItem { marker, body }),
            Draft::Quote(body) => Some(Grouped::Quote(body)),
            Draft::Fence(idx) => Some(Grouped::Fence(idx)),
            Draft::Blank => None,
        };
        if !paragraph.is_empty() {
            grouped.push(Grouped::Paragraph(std::mem::take(&mut paragraph)));
        }
        grouped.extend(node);
    }
    if !paragraph.is_empty() {
        grouped.push(Grouped::Paragraph(paragraph));
    }
    grouped
}

// ── Restoration ───────────────────────────────────────────────

fn restore_code_spans(grouped: Vec<Grouped>, code_spans: &[String]) -> Vec<Restored> {
    grouped
        .into_iter()
        .map(|node| match node {
            Grouped::Heading { level, body } => Restored::Block(Block::Heading {
                level,
                content: restore_line(body, code_spans),
            }),
            Grouped::Paragraph(lines) => {
                let mut content = Vec::new();
                for (i, line) in lines.into_iter().enumerate() {
                    if i > 0 {
                        content.push(Span::LineBreak);
                    }
                    content.extend(restore_line(line, code_spans));
                }
                Restored::Block(Block::Paragraph(content))
            }
            Grouped::ListItem { marker, body } => Restored::Block(Block::ListItem {
                marker,
                content: restore_line(body, code_spans),
            }),
            Grouped::Quote(body) => Restored::Block(Block::Blockquote(restore_line(body, code_spans))),
            Grouped::Fence(idx) => Restored::Fence(idx),
        })
        .collect()
}

fn restore_line(body: Vec<Inline>, code_spans: &[String]) -> Vec<Span> {
    let mut spans: Vec<Span> = body
        .into_iter()
        .map(|node| restore_inline(node, code_spans))
        .collect();
    trim_edges(&mut spans);
    spans
}

fn restore_inline(node: Inline, code_spans: &[String]) -> Span {
    match node {
        Inline::Text(text) => Span::Text(text),
        Inline::Code(idx) => Span::Code(code_spans.get(idx).cloned().unwrap_or_default()),
        Inline::Strong(children) => Span::Strong(
            children
                .into_iter()
                .map(|c| restore_inline(c, code_spans))
                .collect(),
        ),
        Inline::Emphasis(children) => Span::Emphasis(
            children
                .into_iter()
                .map(|c| restore_inline(c, code_spans))
                .collect(),
        ),
    }
}

/// Trim surrounding whitespace of a line. Code spans are never touched.
fn trim_edges(spans: &mut Vec<Span>) {
    if let Some(Span::Text(text)) = spans.first_mut() {
        *text = text.trim_start().to_owned();
    }
    if let Some(Span::Text(text)) = spans.last_mut() {
        *text = text.trim_end().to_owned();
    }
    spans.retain(|s| !matches!(s, Span::Text(t) if t.is_empty()));
}

fn restore_fences(restored: Vec<Restored>, fences: Vec<protect::FencedBlock>) -> Vec<Block> {
    let mut fences: Vec<Option<protect::FencedBlock>> = fences.into_iter().map(Some).collect();
    restored
        .into_iter()
        .filter_map(|node| match node {
            Restored::Block(block) => Some(block),
            Restored::Fence(idx) => fences.get_mut(idx).and_then(Option::take).map(|fence| {
                Block::CodeBlock {
                    language: fence.language,
                    code: fence.code,
                }
            }),
        })
        .collect()
}

// ── Collapse ──────────────────────────────────────────────────

/// Drop blocks with nothing to show. A code block counts as empty only when
/// its code is the empty string; whitespace-only code is kept verbatim.
fn collapse_empty(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .filter(|block| match block {
            Block::Heading { content, .. }
            | Block::Paragraph(content)
            | Block::ListItem { content, .. }
            | Block::Blockquote(content) => !is_blank(content),
            Block::CodeBlock { code, .. } => !code.is_empty(),
        })
        .collect()
}

fn is_blank(spans: &[Span]) -> bool {
    spans.iter().all(|span| match span {
        Span::Text(text) => text.trim().is_empty(),
        Span::LineBreak => true,
        Span::Code(_) => false,
        Span::Strong(children) | Span::Emphasis(children) => is_blank(children),
    })
}
