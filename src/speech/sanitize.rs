//! Text normalisation before speech synthesis.
//!
//! Reuses the formatter's protected-span extraction so fenced code is
//! recognised exactly as it is on screen.

use crate::markup::protect::{Piece, ProtectedSpans, Token, extract_fences, tokenize_lines};

/// Prepare reply text for speaking.
///
/// Fenced code blocks become `code_block_phrase`, inline code keeps its
/// content without the backticks, `*` markers and leading `#` heading
/// markers are dropped, and all line breaks collapse to single spaces.
#[must_use]
pub fn sanitize_for_speech(text: &str, code_block_phrase: &str) -> String {
    let mut spans = ProtectedSpans::default();
    let mut spoken = String::with_capacity(text.len());

    for piece in extract_fences(text, &mut spans) {
        match piece {
            Piece::Fence(_) => {
                spoken.push(' ');
                spoken.push_str(code_block_phrase);
                spoken.push(' ');
            }
            Piece::Text(text) => {
                for line in tokenize_lines(&text, &mut spans) {
                    push_line(&line, &spans, &mut spoken);
                    spoken.push(' ');
                }
            }
        }
    }

    spoken.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_line(tokens: &[Token], spans: &ProtectedSpans, out: &mut String) {
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(text) => {
                let text = if i == 0 { strip_heading(text) } else { text };
                out.extend(text.chars().filter(|&c| c != '*'));
            }
            Token::Code(idx) => {
                if let Some(code) = spans.code_spans.get(*idx) {
                    out.push_str(code);
                }
            }
        }
    }
}

fn strip_heading(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        trimmed.trim_start_matches('#').trim_start()
    } else {
        line
    }
}
