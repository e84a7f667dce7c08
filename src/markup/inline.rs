//! Emphasis pass: `**strong**` first, then `*emphasis*`.
//!
//! Bold runs first because its delimiter contains the italic one. Inline code
//! tokens are opaque atoms here; they can sit inside emphasis but their
//! content is never inspected.

use super::protect::Token;

/// Inline node produced by the emphasis pass. Code is still a table index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline {
    Text(String),
    Code(usize),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Char(char),
    Code(usize),
}

impl Atom {
    fn is(self, c: char) -> bool {
        self == Atom::Char(c)
    }

    fn is_space(self) -> bool {
        matches!(self, Atom::Char(c) if c.is_whitespace())
    }
}

/// Apply the emphasis pass to one line of tokens.
pub(crate) fn emphasize(tokens: &[Token]) -> Vec<Inline> {
    let atoms = to_atoms(tokens);
    let mut out = Vec::new();
    let mut plain: Vec<Atom> = Vec::new();
    let mut i = 0;

    while i < atoms.len() {
        if let Some(close) = find_strong_close(&atoms, i) {
            out.extend(italicize(&std::mem::take(&mut plain)));
            out.push(Inline::Strong(italicize(&atoms[i + 2..close])));
            i = close + 2;
        } else {
            plain.push(atoms[i]);
            i += 1;
        }
    }
    out.extend(italicize(&plain));
    out
}

fn to_atoms(tokens: &[Token]) -> Vec<Atom> {
    let mut atoms = Vec::new();
    for token in tokens {
        match token {
            Token::Text(text) => atoms.extend(text.chars().map(Atom::Char)),
            Token::Code(idx) => atoms.push(Atom::Code(*idx)),
        }
    }
    atoms
}

/// An opening delimiter at `at` of width `width` must be followed by a
/// non-space atom.
fn can_open(atoms: &[Atom], at: usize, width: usize) -> bool {
    atoms.get(at + width).is_some_and(|a| !a.is_space())
}

/// A closing delimiter at `at` must be preceded by a non-space atom.
fn can_close(atoms: &[Atom], at: usize) -> bool {
    at > 0 && !atoms[at - 1].is_space()
}

fn find_strong_close(atoms: &[Atom], open: usize) -> Option<usize> {
    let opens = atoms.get(open).is_some_and(|a| a.is('*'))
        && atoms.get(open + 1).is_some_and(|a| a.is('*'))
        && can_open(atoms, open, 2);
    if !opens {
        return None;
    }
    // The closing pair is the last two stars of its run, so `***x***` reads
    // as strong around emphasis.
    (open + 3..atoms.len().saturating_sub(1)).find(|&j| {
        atoms[j].is('*')
            && atoms[j + 1].is('*')
            && !atoms.get(j + 2).is_some_and(|a| a.is('*'))
            && can_close(atoms, j)
    })
}

/// A lone `*` (not part of a `**` run) at `at`.
fn is_single_star(atoms: &[Atom], at: usize) -> bool {
    atoms[at].is('*')
        && !(at > 0 && atoms[at - 1].is('*'))
        && !atoms.get(at + 1).is_some_and(|a| a.is('*'))
}

fn find_emphasis_close(atoms: &[Atom], open: usize) -> Option<usize> {
    if !is_single_star(atoms, open) || !can_open(atoms, open, 1) {
        return None;
    }
    (open + 2..atoms.len()).find(|&j| is_single_star(atoms, j) && can_close(atoms, j))
}

fn italicize(atoms: &[Atom]) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut plain: Vec<Atom> = Vec::new();
    let mut i = 0;

    while i < atoms.len() {
        if let Some(close) = find_emphasis_close(atoms, i) {
            out.extend(collect(&std::mem::take(&mut plain)));
            out.push(Inline::Emphasis(collect(&atoms[i + 1..close])));
            i = close + 1;
        } else {
            plain.push(atoms[i]);
            i += 1;
        }
    }
    out.extend(collect(&plain));
    out
}

/// Merge consecutive characters back into text nodes.
fn collect(atoms: &[Atom]) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut text = String::new();
    for atom in atoms {
        match atom {
            Atom::Char(c) => text.push(*c),
            Atom::Code(idx) => {
                if !text.is_empty() {
                    out.push(Inline::Text(std::mem::take(&mut text)));
                }
                out.push(Inline::Code(*idx));
            }
        }
    }
    if !text.is_empty() {
        out.push(Inline::Text(text));
    }
    out
}
