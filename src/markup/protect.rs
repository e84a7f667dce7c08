//! Protected span extraction.
//!
//! Fenced code blocks and inline code spans are lifted out of the reply text
//! into ordered tables before any structural rewrite runs. What remains is a
//! token stream in which protected regions are opaque indices, so no later
//! pass can see (or rewrite) their contents.

const FENCE: &str = "```";

/// A fenced code block lifted out of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FencedBlock {
    pub language: Option<String>,
    /// Inner content, byte-identical to the source.
    pub code: String,
}

/// Source text split around fenced blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(String),
    Fence(usize),
}

/// One element of a line after inline-code extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Code(usize),
}

/// Tables of protected content, indexed by extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProtectedSpans {
    pub fences: Vec<FencedBlock>,
    pub code_spans: Vec<String>,
}

/// Step 1: extract fenced code blocks, left to right.
///
/// An opening fence followed by a tag word and a newline records the tag as
/// the block language; otherwise the content starts right after the opening
/// ticks. A fence with no closing delimiter is left as literal text.
pub(crate) fn extract_fences(text: &str, spans: &mut ProtectedSpans) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let (language, body_start) = parse_info_line(after_open);
        let body = &after_open[body_start..];

        let Some(close) = body.find(FENCE) else {
            break;
        };

        if open > 0 {
            pieces.push(Piece::Text(rest[..open].to_owned()));
        }
        spans.fences.push(FencedBlock {
            language,
            code: body[..close].to_owned(),
        });
        pieces.push(Piece::Fence(spans.fences.len() - 1));
        rest = &body[close + FENCE.len()..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Text(rest.to_owned()));
    }
    pieces
}

/// Returns the language tag (if any) and the byte offset where content starts.
fn parse_info_line(after_open: &str) -> (Option<String>, usize) {
    let Some(newline) = after_open.find('\n') else {
        return (None, 0);
    };
    let info = after_open[..newline].trim_end_matches('\r');
    let is_tag = info
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '#' | '.'));
    if !is_tag {
        return (None, 0);
    }
    let language = (!info.is_empty()).then(|| info.to_owned());
    (language, newline + 1)
}

/// Step 2: split a text piece into lines and lift inline code spans.
///
/// A span is a single backtick, non-empty content without backticks, and a
/// closing backtick on the same line. Unmatched backticks stay literal.
pub(crate) fn tokenize_lines(text: &str, spans: &mut ProtectedSpans) -> Vec<Vec<Token>> {
    text.split('\n')
        .map(|line| tokenize_line(line.strip_suffix('\r').unwrap_or(line), spans))
        .collect()
}

fn tokenize_line(line: &str, spans: &mut ProtectedSpans) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = line;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        match after.find('`') {
            Some(close) if close > 0 => {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut literal)));
                }
                spans.code_spans.push(after[..close].to_owned());
                tokens.push(Token::Code(spans.code_spans.len() - 1));
                rest = &after[close + 1..];
            }
            _ => {
                literal.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}
