//! Formatter properties over a spread of realistic replies.

use confab::markup::{self, Block, RichText, Span};

const REPLIES: &[&str] = &[
    "Here is code:\n```python\nprint(1)\n```",
    "## Steps\n1. Install\n2. Run `cargo test -- --nocapture`\n\n> Note: **always** read the docs",
    "```bash\n# comment, not a heading\nrm -rf **/target\n- not a list\n```\nThen *relax*.",
    "Mixed `a*b*c` and **bold `x`** text\n```\nunlabelled ``` inside? no\n```",
    "* bullet one\n* bullet two with a*star\n\n### Done",
    "Unclosed fence:\n```js\nconsole.log('x')",
    "",
];

fn fenced_bodies(text: &str) -> Vec<String> {
    // Independent scan: content between the info line and the next fence.
    let mut bodies = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let start = match after.find('\n') {
            Some(nl) if after[..nl].chars().all(|c| c.is_alphanumeric()) => nl + 1,
            _ => 0,
        };
        let Some(close) = after[start..].find("```") else {
            break;
        };
        bodies.push(after[start..start + close].to_owned());
        rest = &after[start + close + 3..];
    }
    bodies
}

fn code_blocks(rich: &RichText) -> Vec<String> {
    rich.blocks
        .iter()
        .filter_map(|b| match b {
            Block::CodeBlock { code, .. } => Some(code.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn fenced_content_is_verbatim() {
    for reply in REPLIES {
        let rich = markup::format(reply);
        assert_eq!(code_blocks(&rich), fenced_bodies(reply), "reply: {reply:?}");
    }
}

#[test]
fn format_is_deterministic() {
    for reply in REPLIES {
        let first = markup::format(reply);
        assert_eq!(markup::format(reply), first);
        assert_eq!(markup::format(reply).to_html(), first.to_html());
    }
}

#[test]
fn prose_around_code_is_still_formatted() {
    let rich = markup::format(REPLIES[2]);
    assert_eq!(
        rich.blocks.last(),
        Some(&Block::Paragraph(vec![
            Span::Text("Then ".into()),
            Span::Emphasis(vec![Span::Text("relax".into())]),
            Span::Text(".".into()),
        ]))
    );
}

#[test]
fn unclosed_fence_stays_text() {
    let rich = markup::format(REPLIES[5]);
    assert!(code_blocks(&rich).is_empty());
    assert!(rich.plain_text().contains("```js"));
}

#[test]
fn no_empty_blocks_survive() {
    for reply in REPLIES {
        for block in markup::format(reply).blocks {
            match block {
                Block::Heading { content, .. }
                | Block::Paragraph(content)
                | Block::ListItem { content, .. }
                | Block::Blockquote(content) => assert!(!content.is_empty(), "reply: {reply:?}"),
                Block::CodeBlock { .. } => {}
            }
        }
    }
}

#[test]
fn html_never_leaks_raw_tags() {
    let rich = markup::format("<img src=x onerror=alert(1)>\n```html\n<script>x</script>\n```");
    let html = rich.to_html();
    assert!(!html.contains("<img"));
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
}
