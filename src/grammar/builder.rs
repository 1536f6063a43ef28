//! Content-spec tree builders
//!
//! Two strategies turn the event stream of a content model into a binary
//! tree in the declaration store:
//!
//! - Minimal: folds operands left to right, so `(a|b|c)` becomes
//!   `CHOICE(CHOICE(a,b),c)` and tree depth is linear in group width
//! - Balanced: collects the whole group and bisects it, so depth is
//!   logarithmic in group width
//!
//! Both produce trees that accept the same languages.

use super::decl::{ContentSpecIndex, ContentSpecKind};
use super::store::DeclStore;

const INITIAL_STACK_DEPTH: usize = 8;

/// Group separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Choice,
    Sequence,
}

impl Separator {
    pub fn kind(self) -> ContentSpecKind {
        match self {
            Separator::Choice => ContentSpecKind::Choice,
            Separator::Sequence => ContentSpecKind::Sequence,
        }
    }
}

/// Occurrence indicator applied to the preceding particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Occurrence {
    pub fn kind(self) -> ContentSpecKind {
        match self {
            Occurrence::ZeroOrOne => ContentSpecKind::ZeroOrOne,
            Occurrence::ZeroOrMore => ContentSpecKind::ZeroOrMore,
            Occurrence::OneOrMore => ContentSpecKind::OneOrMore,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Occurrence::ZeroOrOne),
            '*' => Some(Occurrence::ZeroOrMore),
            '+' => Some(Occurrence::OneOrMore),
            _ => None,
        }
    }
}

/// Which tree shape the loader builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeShape {
    #[default]
    Minimal,
    Balanced,
}

/// Grow a depth-indexed stack so `depth` is addressable, doubling capacity
fn ensure_depth<T: Clone>(stack: &mut Vec<T>, depth: usize, fill: T) {
    if depth < stack.len() {
        return;
    }
    let mut size = stack.len().max(INITIAL_STACK_DEPTH);
    while size <= depth {
        size *= 2;
    }
    stack.resize(size, fill);
}

/// Left-folding builder
#[derive(Debug, Default)]
pub struct MinimalBuilder {
    depth: usize,
    mixed: bool,
    op_stack: Vec<Option<Separator>>,
    node_stack: Vec<Option<ContentSpecIndex>>,
    prev_stack: Vec<Option<ContentSpecIndex>>,
}

impl MinimalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn init_level(&mut self) {
        ensure_depth(&mut self.op_stack, self.depth, None);
        ensure_depth(&mut self.node_stack, self.depth, None);
        ensure_depth(&mut self.prev_stack, self.depth, None);
        self.op_stack[self.depth] = None;
        self.node_stack[self.depth] = None;
        self.prev_stack[self.depth] = None;
    }

    pub fn start_content_model(&mut self) {
        self.depth = 0;
        self.mixed = false;
        self.init_level();
    }

    pub fn start_group(&mut self) {
        self.depth += 1;
        self.init_level();
        self.mixed = false;
    }

    pub fn pcdata(&mut self) {
        self.mixed = true;
    }

    pub fn element(&mut self, store: &mut DeclStore, name: &str) {
        let leaf = store.add_leaf(Some(name));
        let d = self.depth;
        if self.mixed {
            self.node_stack[d] = Some(match self.node_stack[d] {
                Some(prev) => store.add_binary(ContentSpecKind::Choice, prev, leaf),
                None => leaf,
            });
        } else {
            self.node_stack[d] = Some(leaf);
        }
    }

    pub fn separator(&mut self, store: &mut DeclStore, separator: Separator) {
        if self.mixed {
            return;
        }
        let d = self.depth;
        // The first separator fixes the operator for the group
        match self.op_stack[d] {
            None => self.op_stack[d] = Some(separator),
            Some(op) if op != separator => return,
            Some(_) => {}
        }
        if let (Some(prev), Some(node)) = (self.prev_stack[d], self.node_stack[d]) {
            self.node_stack[d] = Some(store.add_binary(separator.kind(), prev, node));
        }
        self.prev_stack[d] = self.node_stack[d];
    }

    pub fn occurrence(&mut self, store: &mut DeclStore, occurrence: Occurrence) {
        if self.mixed {
            return;
        }
        let d = self.depth;
        if let Some(node) = self.node_stack[d] {
            self.node_stack[d] = Some(store.add_unary(occurrence.kind(), node));
        }
    }

    pub fn end_group(&mut self, store: &mut DeclStore) {
        if self.mixed || self.depth == 0 {
            return;
        }
        let d = self.depth;
        if let (Some(prev), Some(node), Some(op)) = (self.prev_stack[d], self.node_stack[d], self.op_stack[d]) {
            self.node_stack[d] = Some(store.add_binary(op.kind(), prev, node));
        }
        let group = self.node_stack[d];
        self.depth -= 1;
        self.node_stack[self.depth] = group;
    }

    /// Root of the element-children tree once the model is complete
    pub fn finish(&self) -> Option<ContentSpecIndex> {
        match (self.depth, self.mixed) {
            (0, _) => self.node_stack.first().copied().flatten(),
            (1, true) => self.node_stack.get(1).copied().flatten(),
            _ => None,
        }
    }

    pub fn stack_capacity(&self) -> usize {
        self.node_stack.len()
    }
}

/// Group-collecting builder that bisects each group on close
#[derive(Debug, Default)]
pub struct BalancedBuilder {
    depth: usize,
    mixed: bool,
    op_stack: Vec<Option<Separator>>,
    group_stack: Vec<Vec<ContentSpecIndex>>,
}

impl BalancedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn init_level(&mut self) {
        ensure_depth(&mut self.op_stack, self.depth, None);
        ensure_depth(&mut self.group_stack, self.depth, Vec::new());
        self.op_stack[self.depth] = None;
        self.group_stack[self.depth].clear();
    }

    pub fn start_content_model(&mut self) {
        self.depth = 0;
        self.mixed = false;
        self.init_level();
    }

    pub fn start_group(&mut self) {
        self.depth += 1;
        self.init_level();
        self.mixed = false;
    }

    pub fn pcdata(&mut self) {
        self.mixed = true;
    }

    pub fn element(&mut self, store: &mut DeclStore, name: &str) {
        let leaf = store.add_leaf(Some(name));
        self.group_stack[self.depth].push(leaf);
    }

    pub fn separator(&mut self, separator: Separator) {
        let d = self.depth;
        if self.op_stack[d].is_none() {
            self.op_stack[d] = Some(if self.mixed { Separator::Choice } else { separator });
        }
    }

    pub fn occurrence(&mut self, store: &mut DeclStore, occurrence: Occurrence) {
        if self.mixed {
            return;
        }
        if let Some(last) = self.group_stack[self.depth].last_mut() {
            *last = store.add_unary(occurrence.kind(), *last);
        }
    }

    pub fn end_group(&mut self, store: &mut DeclStore) {
        if self.depth == 0 {
            return;
        }
        let d = self.depth;
        let op = self.op_stack[d].unwrap_or(Separator::Sequence).kind();
        let items = std::mem::take(&mut self.group_stack[d]);
        let group = bisect(store, op, &items);
        self.depth -= 1;
        if let Some(group) = group {
            self.group_stack[self.depth].push(group);
        }
    }

    pub fn finish(&self) -> Option<ContentSpecIndex> {
        if self.depth != 0 {
            return None;
        }
        self.group_stack.first().and_then(|g| g.last().copied())
    }

    pub fn stack_capacity(&self) -> usize {
        self.group_stack.len()
    }
}

/// Join `items` with `op` into a tree of depth ceil(log2(len))
fn bisect(store: &mut DeclStore, op: ContentSpecKind, items: &[ContentSpecIndex]) -> Option<ContentSpecIndex> {
    match items.len() {
        0 => None,
        1 => Some(items[0]),
        len => {
            let mid = (len - 1) / 2;
            let left = bisect(store, op, &items[..=mid])?;
            let right = bisect(store, op, &items[mid + 1..])?;
            Some(store.add_binary(op, left, right))
        }
    }
}

/// The builder selected by [`TreeShape`]
#[derive(Debug)]
pub enum ContentSpecBuilder {
    Minimal(MinimalBuilder),
    Balanced(BalancedBuilder),
}

impl ContentSpecBuilder {
    pub fn new(shape: TreeShape) -> Self {
        match shape {
            TreeShape::Minimal => ContentSpecBuilder::Minimal(MinimalBuilder::new()),
            TreeShape::Balanced => ContentSpecBuilder::Balanced(BalancedBuilder::new()),
        }
    }

    pub fn start_content_model(&mut self) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.start_content_model(),
            ContentSpecBuilder::Balanced(b) => b.start_content_model(),
        }
    }

    pub fn start_group(&mut self) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.start_group(),
            ContentSpecBuilder::Balanced(b) => b.start_group(),
        }
    }

    pub fn pcdata(&mut self) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.pcdata(),
            ContentSpecBuilder::Balanced(b) => b.pcdata(),
        }
    }

    pub fn element(&mut self, store: &mut DeclStore, name: &str) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.element(store, name),
            ContentSpecBuilder::Balanced(b) => b.element(store, name),
        }
    }

    pub fn separator(&mut self, store: &mut DeclStore, separator: Separator) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.separator(store, separator),
            ContentSpecBuilder::Balanced(b) => b.separator(separator),
        }
    }

    pub fn occurrence(&mut self, store: &mut DeclStore, occurrence: Occurrence) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.occurrence(store, occurrence),
            ContentSpecBuilder::Balanced(b) => b.occurrence(store, occurrence),
        }
    }

    pub fn end_group(&mut self, store: &mut DeclStore) {
        match self {
            ContentSpecBuilder::Minimal(b) => b.end_group(store),
            ContentSpecBuilder::Balanced(b) => b.end_group(store),
        }
    }

    pub fn finish(&self) -> Option<ContentSpecIndex> {
        match self {
            ContentSpecBuilder::Minimal(b) => b.finish(),
            ContentSpecBuilder::Balanced(b) => b.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::decl::ContentSpecNode;

    fn node(store: &DeclStore, i: ContentSpecIndex) -> &ContentSpecNode {
        store.content_spec(i).unwrap()
    }

    /// Depth of the tree under `root` (leaves are depth 1)
    fn depth(store: &DeclStore, root: ContentSpecIndex) -> usize {
        let mut max = 0;
        let mut stack = vec![(root, 1)];
        while let Some((i, d)) = stack.pop() {
            max = max.max(d);
            match node(store, i) {
                ContentSpecNode::Unary(_, c) => stack.push((*c, d + 1)),
                ContentSpecNode::Binary(_, l, r) => {
                    stack.push((*l, d + 1));
                    stack.push((*r, d + 1));
                }
                _ => {}
            }
        }
        max
    }

    fn choice_of(builder: &mut ContentSpecBuilder, store: &mut DeclStore, n: usize) -> ContentSpecIndex {
        builder.start_content_model();
        builder.start_group();
        for i in 0..n {
            if i > 0 {
                builder.separator(store, Separator::Choice);
            }
            builder.element(store, &format!("e{i}"));
        }
        builder.end_group(store);
        builder.finish().unwrap()
    }

    #[test]
    fn test_minimal_left_fold() {
        let mut store = DeclStore::new();
        let mut b = ContentSpecBuilder::new(TreeShape::Minimal);
        let root = choice_of(&mut b, &mut store, 3);
        match node(&store, root) {
            ContentSpecNode::Binary(ContentSpecKind::Choice, l, r) => {
                assert_eq!(node(&store, *r).leaf_name(), Some("e2"));
                assert_eq!(node(&store, *l).kind(), ContentSpecKind::Choice);
            }
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn test_balanced_depth_is_logarithmic() {
        let mut store = DeclStore::new();
        let mut b = ContentSpecBuilder::new(TreeShape::Balanced);
        let root = choice_of(&mut b, &mut store, 3000);
        // ceil(log2(3000)) = 12, plus the leaf level
        assert!(depth(&store, root) <= 13);

        let mut store = DeclStore::new();
        let mut b = ContentSpecBuilder::new(TreeShape::Minimal);
        let root = choice_of(&mut b, &mut store, 3000);
        assert_eq!(depth(&store, root), 3000);
    }

    #[test]
    fn test_occurrence_on_group_and_leaf() {
        // (a,b?)+
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            let mut store = DeclStore::new();
            let mut b = ContentSpecBuilder::new(shape);
            b.start_content_model();
            b.start_group();
            b.element(&mut store, "a");
            b.separator(&mut store, Separator::Sequence);
            b.element(&mut store, "b");
            b.occurrence(&mut store, Occurrence::ZeroOrOne);
            b.end_group(&mut store);
            b.occurrence(&mut store, Occurrence::OneOrMore);
            let root = b.finish().unwrap();
            match node(&store, root) {
                ContentSpecNode::Unary(ContentSpecKind::OneOrMore, seq) => match node(&store, *seq) {
                    ContentSpecNode::Binary(ContentSpecKind::Sequence, a, q) => {
                        assert_eq!(node(&store, *a).leaf_name(), Some("a"));
                        assert_eq!(node(&store, *q).kind(), ContentSpecKind::ZeroOrOne);
                    }
                    other => panic!("unexpected {other:?}"),
                },
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_mixed_collects_choice_of_elements() {
        // (#PCDATA|a|b)*
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            let mut store = DeclStore::new();
            let mut b = ContentSpecBuilder::new(shape);
            b.start_content_model();
            b.start_group();
            b.pcdata();
            b.separator(&mut store, Separator::Choice);
            b.element(&mut store, "a");
            b.separator(&mut store, Separator::Choice);
            b.element(&mut store, "b");
            b.end_group(&mut store);
            b.occurrence(&mut store, Occurrence::ZeroOrMore);
            let root = b.finish().unwrap();
            assert_eq!(node(&store, root).kind(), ContentSpecKind::Choice);
        }
    }

    #[test]
    fn test_pcdata_only_has_no_element_tree() {
        let mut store = DeclStore::new();
        let mut b = ContentSpecBuilder::new(TreeShape::Minimal);
        b.start_content_model();
        b.start_group();
        b.pcdata();
        b.end_group(&mut store);
        assert_eq!(b.finish(), None);
    }

    #[test]
    fn test_stack_grows_by_doubling() {
        let mut store = DeclStore::new();
        let mut b = MinimalBuilder::new();
        b.start_content_model();
        assert_eq!(b.stack_capacity(), 8);
        for _ in 0..8 {
            b.start_group();
        }
        assert_eq!(b.stack_capacity(), 16);
        b.element(&mut store, "deep");
        for _ in 0..8 {
            b.end_group(&mut store);
        }
        let root = b.finish().unwrap();
        assert_eq!(store.content_spec(root).unwrap().leaf_name(), Some("deep"));
    }
}
