//! DFA content model
//!
//! Position automaton built from the content-spec tree: every leaf is a
//! numbered position, an end marker follows the root, and the states of the
//! automaton are sets of positions computed from first/last/follow sets.
//! The tree is walked with explicit stacks so deep minimal trees are safe.

use std::collections::HashMap;

use log::debug;

use super::{Child, ContentOutcome, Wildcard};
use crate::grammar::decl::{ContentSpecIndex, ContentSpecKind, ContentSpecNode};
use crate::grammar::store::DeclStore;

/// Fixed-width bit set over leaf positions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PositionSet {
    words: Vec<u64>,
}

impl PositionSet {
    fn new(positions: usize) -> Self {
        PositionSet { words: vec![0; positions.div_ceil(64)] }
    }

    fn insert(&mut self, p: usize) {
        self.words[p / 64] |= 1u64 << (p % 64);
    }

    fn contains(&self, p: usize) -> bool {
        self.words.get(p / 64).is_some_and(|&w| w & (1u64 << (p % 64)) != 0)
    }

    fn union_with(&mut self, other: &PositionSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(i * 64 + bit)
            })
        })
    }
}

/// Input symbol of the automaton
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Symbol {
    Name(String),
    PcData,
    Wildcard(Wildcard),
}

/// Linearized syntax node; operands refer to earlier entries
#[derive(Debug, Clone, Copy)]
enum SyntaxNode {
    Leaf(usize),
    Unary(ContentSpecKind, usize),
    Binary(ContentSpecKind, usize, usize),
}

#[derive(Debug, Clone)]
pub struct DfaContentModel {
    symbols: Vec<Symbol>,
    /// Symbol lookup for element names when no wildcard is present
    name_index: HashMap<String, usize>,
    has_wildcards: bool,
    /// Per state, `(symbol, next state)` sorted by symbol
    transitions: Vec<Vec<(usize, usize)>>,
    accepting: Vec<bool>,
}

impl DfaContentModel {
    pub fn build(store: &DeclStore, root: ContentSpecIndex) -> Self {
        let (nodes, position_symbols, symbols) = linearize(store, root);
        let positions = position_symbols.len();
        let end = positions;
        let width = positions + 1;

        let mut nullable = Vec::with_capacity(nodes.len());
        let mut first: Vec<PositionSet> = Vec::with_capacity(nodes.len());
        let mut last: Vec<PositionSet> = Vec::with_capacity(nodes.len());
        let mut follow = vec![PositionSet::new(width); width];

        for node in &nodes {
            match *node {
                SyntaxNode::Leaf(p) => {
                    let mut set = PositionSet::new(width);
                    set.insert(p);
                    nullable.push(false);
                    first.push(set.clone());
                    last.push(set);
                }
                SyntaxNode::Unary(kind, c) => {
                    if kind != ContentSpecKind::ZeroOrOne {
                        for p in last[c].iter() {
                            follow[p].union_with(&first[c]);
                        }
                    }
                    nullable.push(kind != ContentSpecKind::OneOrMore || nullable[c]);
                    first.push(first[c].clone());
                    last.push(last[c].clone());
                }
                SyntaxNode::Binary(ContentSpecKind::Choice, l, r) => {
                    nullable.push(nullable[l] || nullable[r]);
                    let mut f = first[l].clone();
                    f.union_with(&first[r]);
                    let mut s = last[l].clone();
                    s.union_with(&last[r]);
                    first.push(f);
                    last.push(s);
                }
                SyntaxNode::Binary(_, l, r) => {
                    for p in last[l].iter() {
                        follow[p].union_with(&first[r]);
                    }
                    nullable.push(nullable[l] && nullable[r]);
                    let mut f = first[l].clone();
                    if nullable[l] {
                        f.union_with(&first[r]);
                    }
                    let mut s = last[r].clone();
                    if nullable[r] {
                        s.union_with(&last[l]);
                    }
                    first.push(f);
                    last.push(s);
                }
            }
        }

        let top = nodes.len() - 1;
        for p in last[top].iter() {
            follow[p].insert(end);
        }
        let mut start = first[top].clone();
        if nullable[top] {
            start.insert(end);
        }

        // Subset construction
        let mut states = vec![start.clone()];
        let mut state_ids = HashMap::from([(start, 0usize)]);
        let mut transitions: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut accepting = Vec::new();
        let mut cursor = 0;
        while cursor < states.len() {
            let current = states[cursor].clone();
            accepting.push(current.contains(end));

            let mut targets: HashMap<usize, PositionSet> = HashMap::new();
            for p in current.iter().filter(|&p| p != end) {
                targets
                    .entry(position_symbols[p])
                    .or_insert_with(|| PositionSet::new(width))
                    .union_with(&follow[p]);
            }
            let mut targets: Vec<(usize, PositionSet)> = targets.into_iter().collect();
            targets.sort_unstable_by_key(|(symbol, _)| *symbol);

            let mut row = Vec::with_capacity(targets.len());
            for (symbol, target) in targets {
                if target.is_empty() {
                    continue;
                }
                let id = match state_ids.get(&target) {
                    Some(&id) => id,
                    None => {
                        let id = states.len();
                        states.push(target.clone());
                        state_ids.insert(target, id);
                        id
                    }
                };
                row.push((symbol, id));
            }
            transitions.push(row);
            cursor += 1;
        }

        debug!("built content DFA: {} positions, {} states", positions, states.len());

        let has_wildcards = symbols.iter().any(|s| matches!(s, Symbol::Wildcard(_)));
        let name_index = symbols
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Symbol::Name(n) => Some((n.clone(), i)),
                _ => None,
            })
            .collect();

        DfaContentModel {
            symbols,
            name_index,
            has_wildcards,
            transitions,
            accepting,
        }
    }

    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// First symbol accepting the child, in leaf order
    fn symbol_for(&self, child: &Child) -> Option<usize> {
        match child {
            Child::PcData => self.symbols.iter().position(|s| *s == Symbol::PcData),
            Child::Element(name) if !self.has_wildcards => self.name_index.get(&name.raw).copied(),
            Child::Element(name) => self.symbols.iter().position(|s| match s {
                Symbol::Name(n) => n == &name.raw,
                Symbol::Wildcard(w) => w.matches(name),
                Symbol::PcData => false,
            }),
        }
    }

    pub fn validate(&self, children: &[Child]) -> ContentOutcome {
        let mut state = 0;
        for (i, child) in children.iter().enumerate() {
            let Some(symbol) = self.symbol_for(child) else {
                return ContentOutcome::Invalid(i);
            };
            let row = &self.transitions[state];
            match row.binary_search_by_key(&symbol, |(s, _)| *s) {
                Ok(at) => state = row[at].1,
                Err(_) => return ContentOutcome::Invalid(i),
            }
        }
        if self.accepting[state] {
            ContentOutcome::Valid
        } else {
            ContentOutcome::Incomplete
        }
    }
}

/// Post-order the tree into `SyntaxNode`s, numbering leaves left to right.
/// Returns the nodes (root last), the symbol of each position, and the symbols.
fn linearize(store: &DeclStore, root: ContentSpecIndex) -> (Vec<SyntaxNode>, Vec<usize>, Vec<Symbol>) {
    let mut nodes = Vec::new();
    let mut position_symbols = Vec::new();
    let mut symbols: Vec<Symbol> = Vec::new();
    let mut symbol_ids: HashMap<Symbol, usize> = HashMap::new();

    // (node index, children already pushed)
    let mut stack = vec![(root, false)];
    // Local ids of finished subtrees
    let mut done: Vec<usize> = Vec::new();

    while let Some((index, expanded)) = stack.pop() {
        let node = store.content_spec(index);
        match node {
            Some(ContentSpecNode::Unary(kind, child)) => {
                if expanded {
                    let c = done.pop().unwrap_or_default();
                    nodes.push(SyntaxNode::Unary(*kind, c));
                    done.push(nodes.len() - 1);
                } else {
                    stack.push((index, true));
                    stack.push((*child, false));
                }
            }
            Some(ContentSpecNode::Binary(kind, left, right)) => {
                if expanded {
                    let r = done.pop().unwrap_or_default();
                    let l = done.pop().unwrap_or_default();
                    nodes.push(SyntaxNode::Binary(*kind, l, r));
                    done.push(nodes.len() - 1);
                } else {
                    stack.push((index, true));
                    stack.push((*right, false));
                    stack.push((*left, false));
                }
            }
            _ => {
                let symbol = match node {
                    Some(ContentSpecNode::Leaf(Some(name))) => Symbol::Name(name.clone()),
                    Some(ContentSpecNode::Any(uri)) => Symbol::Wildcard(Wildcard::Any(uri.clone())),
                    Some(ContentSpecNode::AnyOther(uri)) => Symbol::Wildcard(Wildcard::Other(uri.clone())),
                    Some(ContentSpecNode::AnyLocal) => Symbol::Wildcard(Wildcard::Local),
                    _ => Symbol::PcData,
                };
                // Wildcards get one symbol per position; names share one per name
                let id = match &symbol {
                    Symbol::Wildcard(_) => {
                        symbols.push(symbol);
                        symbols.len() - 1
                    }
                    _ => *symbol_ids.entry(symbol.clone()).or_insert_with(|| {
                        symbols.push(symbol);
                        symbols.len() - 1
                    }),
                };
                position_symbols.push(id);
                nodes.push(SyntaxNode::Leaf(position_symbols.len() - 1));
                done.push(nodes.len() - 1);
            }
        }
    }

    (nodes, position_symbols, symbols)
}
