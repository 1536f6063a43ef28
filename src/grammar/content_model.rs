//! Content-model text
//!
//! Parses the text of an `<!ELEMENT>` content specification into the event
//! stream consumed by the tree builders, and renders a content-spec tree
//! back into the same notation.

use super::builder::{Occurrence, Separator};
use super::decl::{ContentSpecIndex, ContentSpecKind, ContentSpecNode};
use super::store::DeclStore;
use crate::core::names::{is_name_char, is_name_start_char};
use crate::error::DtdError;

/// Receiver of content-model events, in document order
pub trait ContentModelHandler {
    fn start_content_model(&mut self, element: &str);
    fn any(&mut self);
    fn empty(&mut self);
    fn start_group(&mut self);
    fn pcdata(&mut self);
    fn element(&mut self, name: &str);
    fn separator(&mut self, separator: Separator);
    fn occurrence(&mut self, occurrence: Occurrence);
    fn end_group(&mut self);
    fn end_content_model(&mut self);
}

/// Drive `handler` with the events for one content specification
pub fn parse<H: ContentModelHandler + ?Sized>(element: &str, text: &str, handler: &mut H) -> Result<(), DtdError> {
    let text = text.trim();
    handler.start_content_model(element);
    match text {
        "EMPTY" => handler.empty(),
        "ANY" => handler.any(),
        _ if text.starts_with('(') => parse_groups(text, handler)?,
        _ => return Err(malformed(text, 0, "expected EMPTY, ANY or '('")),
    }
    handler.end_content_model();
    Ok(())
}

fn malformed(text: &str, position: usize, reason: &'static str) -> DtdError {
    DtdError::MalformedContentModel {
        text: text.to_string(),
        position,
        reason,
    }
}

#[derive(Debug, Clone, Copy)]
enum Token<'a> {
    Open,
    Close,
    PcData,
    Name(&'a str),
    Separator(Separator),
    Occurrence(Occurrence),
}

/// Syntax state of one open group
#[derive(Debug, Default)]
struct Group {
    /// Set at the group start and after a separator
    expect_particle: bool,
    separator: Option<Separator>,
    mixed: bool,
    particles: usize,
}

impl Group {
    fn open() -> Self {
        Group { expect_particle: true, ..Default::default() }
    }
}

/// The whole text is checked before any event reaches the handler, so a
/// malformed model never leaves a half-built tree behind.
fn parse_groups<H: ContentModelHandler + ?Sized>(text: &str, handler: &mut H) -> Result<(), DtdError> {
    for token in tokenize(text)? {
        match token {
            Token::Open => handler.start_group(),
            Token::Close => handler.end_group(),
            Token::PcData => handler.pcdata(),
            Token::Name(name) => handler.element(name),
            Token::Separator(sep) => handler.separator(sep),
            Token::Occurrence(occ) => handler.occurrence(occ),
        }
    }
    Ok(())
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, DtdError> {
    let mut tokens = Vec::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut closed = false;
    let mut chars = text.char_indices().peekable();
    // True right after a name or ')' so an occurrence indicator may follow
    let mut after_particle = false;

    while let Some((pos, c)) = chars.next() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                after_particle = false;
                continue;
            }
            '(' => {
                if closed {
                    return Err(malformed(text, pos, "content after closing group"));
                }
                if let Some(parent) = groups.last() {
                    if parent.mixed {
                        return Err(malformed(text, pos, "nested group in mixed content"));
                    }
                    if !parent.expect_particle {
                        return Err(malformed(text, pos, "missing separator"));
                    }
                }
                groups.push(Group::open());
                tokens.push(Token::Open);
                after_particle = false;
            }
            ')' => {
                let Some(group) = groups.pop() else {
                    return Err(malformed(text, pos, "unbalanced ')'"));
                };
                if group.expect_particle {
                    let reason = if group.particles == 0 { "empty group" } else { "separator without a following particle" };
                    return Err(malformed(text, pos, reason));
                }
                if group.mixed {
                    match text[pos + 1..].chars().next() {
                        Some('*') => {}
                        Some('?' | '+') => return Err(malformed(text, pos + 1, "mixed content allows only '*'")),
                        _ if group.particles > 1 => {
                            return Err(malformed(text, pos, "mixed content with elements must end in ')*'"));
                        }
                        _ => {}
                    }
                }
                match groups.last_mut() {
                    Some(parent) => {
                        parent.expect_particle = false;
                        parent.particles += 1;
                    }
                    None => closed = true,
                }
                tokens.push(Token::Close);
                after_particle = true;
            }
            '|' | ',' if !groups.is_empty() => {
                let sep = if c == '|' { Separator::Choice } else { Separator::Sequence };
                let Some(group) = groups.last_mut() else { continue };
                if group.expect_particle {
                    return Err(malformed(text, pos, "separator without a preceding particle"));
                }
                if group.mixed && sep != Separator::Choice {
                    return Err(malformed(text, pos, "mixed content allows only '|'"));
                }
                match group.separator {
                    Some(prev) if prev != sep => return Err(malformed(text, pos, "',' and '|' mixed in one group")),
                    _ => group.separator = Some(sep),
                }
                group.expect_particle = true;
                tokens.push(Token::Separator(sep));
                after_particle = false;
            }
            '?' | '*' | '+' if after_particle => {
                if let Some(occ) = Occurrence::from_char(c) {
                    tokens.push(Token::Occurrence(occ));
                }
                after_particle = false;
            }
            '#' if !groups.is_empty() => {
                if !text[pos..].starts_with("#PCDATA") {
                    return Err(malformed(text, pos, "expected #PCDATA"));
                }
                let outermost = groups.len() == 1;
                let Some(group) = groups.last_mut() else { continue };
                if !outermost || group.particles != 0 {
                    return Err(malformed(text, pos, "#PCDATA must open the outermost group"));
                }
                // Skip the remaining "PCDATA"
                for _ in 0..6 {
                    chars.next();
                }
                group.mixed = true;
                group.expect_particle = false;
                group.particles = 1;
                tokens.push(Token::PcData);
                after_particle = false;
            }
            c if !groups.is_empty() && is_name_start_char(c) => {
                let mut end = pos + c.len_utf8();
                while let Some(&(next_pos, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = next_pos + next.len_utf8();
                    chars.next();
                }
                let Some(group) = groups.last_mut() else { continue };
                if !group.expect_particle {
                    return Err(malformed(text, pos, "missing separator"));
                }
                group.expect_particle = false;
                group.particles += 1;
                tokens.push(Token::Name(&text[pos..end]));
                // Names inside mixed content take no occurrence indicator
                after_particle = !group.mixed;
            }
            _ => return Err(malformed(text, pos, "unexpected character")),
        }
    }

    if !groups.is_empty() {
        return Err(malformed(text, text.len(), "unclosed group"));
    }
    Ok(tokens)
}

/// Render the tree under `root` in content-model notation.
///
/// Chains of the same binary operator are flattened into one group; a
/// top-level leaf is wrapped in parentheses. The tree does not remember
/// where the author put the parentheses around a lone particle, so `(a?)`
/// and `(a)?` both render as `(a)?`.
pub fn format(store: &DeclStore, root: ContentSpecIndex) -> String {
    let mut out = String::new();
    write_node(store, root, true, &mut out);
    out
}

fn write_node(store: &DeclStore, index: ContentSpecIndex, top: bool, out: &mut String) {
    let Some(node) = store.content_spec(index) else {
        return;
    };
    match node {
        ContentSpecNode::Binary(kind, _, _) => {
            let sep = if *kind == ContentSpecKind::Choice { '|' } else { ',' };
            out.push('(');
            for (i, operand) in flatten_chain(store, index, *kind).into_iter().enumerate() {
                if i > 0 {
                    out.push(sep);
                }
                write_node(store, operand, false, out);
            }
            out.push(')');
        }
        ContentSpecNode::Unary(kind, child) => {
            match store.content_spec(*child) {
                Some(ContentSpecNode::Unary(..)) => {
                    out.push('(');
                    write_node(store, *child, false, out);
                    out.push(')');
                }
                Some(ContentSpecNode::Binary(..)) => write_node(store, *child, false, out),
                Some(_) => write_node(store, *child, top, out),
                None => {}
            }
            if let Some(c) = kind.occurrence_char() {
                out.push(c);
            }
        }
        leaf => {
            if top {
                out.push('(');
            }
            write_leaf(leaf, out);
            if top {
                out.push(')');
            }
        }
    }
}

fn write_leaf(node: &ContentSpecNode, out: &mut String) {
    match node {
        ContentSpecNode::Leaf(Some(name)) => out.push_str(name),
        ContentSpecNode::Leaf(None) => out.push_str("#PCDATA"),
        ContentSpecNode::Any(None) => out.push_str("##any"),
        ContentSpecNode::Any(Some(uri)) => {
            out.push_str("##any:uri=");
            out.push_str(uri);
        }
        ContentSpecNode::AnyOther(uri) => {
            out.push_str("##other:uri=");
            out.push_str(uri);
        }
        ContentSpecNode::AnyLocal => out.push_str("##local"),
        ContentSpecNode::Unary(..) | ContentSpecNode::Binary(..) => {}
    }
}

/// Operands of a same-operator chain, left to right
pub(crate) fn flatten_chain(store: &DeclStore, root: ContentSpecIndex, kind: ContentSpecKind) -> Vec<ContentSpecIndex> {
    let mut operands = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        match store.content_spec(index) {
            Some(ContentSpecNode::Binary(k, left, right)) if *k == kind => {
                stack.push(*right);
                stack.push(*left);
            }
            _ => operands.push(index),
        }
    }
    operands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builder::{ContentSpecBuilder, TreeShape};

    /// Handler that builds a tree straight into a store
    struct TreeBuilder {
        store: DeclStore,
        builder: ContentSpecBuilder,
        events: Vec<String>,
    }

    impl TreeBuilder {
        fn new(shape: TreeShape) -> Self {
            TreeBuilder {
                store: DeclStore::new(),
                builder: ContentSpecBuilder::new(shape),
                events: Vec::new(),
            }
        }
    }

    impl ContentModelHandler for TreeBuilder {
        fn start_content_model(&mut self, _element: &str) {
            self.builder.start_content_model();
        }
        fn any(&mut self) {
            self.events.push("any".into());
        }
        fn empty(&mut self) {
            self.events.push("empty".into());
        }
        fn start_group(&mut self) {
            self.events.push("(".into());
            self.builder.start_group();
        }
        fn pcdata(&mut self) {
            self.events.push("#PCDATA".into());
            self.builder.pcdata();
        }
        fn element(&mut self, name: &str) {
            self.events.push(name.into());
            self.builder.element(&mut self.store, name);
        }
        fn separator(&mut self, separator: Separator) {
            self.events.push(format!("{separator:?}"));
            self.builder.separator(&mut self.store, separator);
        }
        fn occurrence(&mut self, occurrence: Occurrence) {
            self.events.push(format!("{occurrence:?}"));
            self.builder.occurrence(&mut self.store, occurrence);
        }
        fn end_group(&mut self) {
            self.events.push(")".into());
            self.builder.end_group(&mut self.store);
        }
        fn end_content_model(&mut self) {}
    }

    fn round_trip(text: &str, shape: TreeShape) -> String {
        let mut h = TreeBuilder::new(shape);
        parse("e", text, &mut h).unwrap();
        let root = h.builder.finish().unwrap();
        format(&h.store, root)
    }

    #[test]
    fn test_event_stream() {
        let mut h = TreeBuilder::new(TreeShape::Minimal);
        parse("e", "(a, b?)*", &mut h).unwrap();
        assert_eq!(h.events, vec!["(", "a", "Sequence", "b", "ZeroOrOne", ")", "ZeroOrMore"]);
    }

    #[test]
    fn test_empty_and_any() {
        let mut h = TreeBuilder::new(TreeShape::Minimal);
        parse("e", " EMPTY ", &mut h).unwrap();
        parse("e", "ANY", &mut h).unwrap();
        assert_eq!(h.events, vec!["empty", "any"]);
    }

    #[test]
    fn test_round_trip_both_shapes() {
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            assert_eq!(round_trip("(a,b?,c+)", shape), "(a,b?,c+)");
            assert_eq!(round_trip("(a|b|c|d|e)", shape), "(a|b|c|d|e)");
            assert_eq!(round_trip("(a,(b|c)*,d)", shape), "(a,(b|c)*,d)");
            assert_eq!(round_trip("(a)", shape), "(a)");
            assert_eq!(round_trip("(a)*", shape), "(a)*");
            assert_eq!(round_trip("((a|b),c)", shape), "((a|b),c)");
        }
    }

    #[test]
    fn test_nested_unary_gets_parentheses() {
        // ((a*))? collapses the redundant group but keeps both indicators
        assert_eq!(round_trip("((a*))?", TreeShape::Minimal), "(a*)?");
    }

    #[test]
    fn test_malformed() {
        let mut h = TreeBuilder::new(TreeShape::Minimal);
        assert!(parse("e", "(a,b", &mut h).is_err());
        assert!(parse("e", "a,b)", &mut h).is_err());
        assert!(parse("e", "(a;b)", &mut h).is_err());
        assert!(parse("e", "(#PCDAT)", &mut h).is_err());
        assert!(h.events.is_empty());
    }

    #[test]
    fn test_dangling_separators_and_empty_groups() {
        for text in ["(a,)", "(|a)", "(a b)", "()", "(a,(),b)", "(a,,b)", "((a)(b))"] {
            let mut h = TreeBuilder::new(TreeShape::Minimal);
            let err = parse("e", text, &mut h).unwrap_err();
            assert_eq!(err.code(), "malformed_content_model", "{text}");
            assert!(h.events.is_empty(), "{text}: {:?}", h.events);
        }
    }

    #[test]
    fn test_group_syntax() {
        let mut h = TreeBuilder::new(TreeShape::Minimal);
        for text in [
            "(a,b|c)",
            "(#PCDATA|a)",
            "(#PCDATA|a)+",
            "(#PCDATA,a)*",
            "(a|#PCDATA)*",
            "(#PCDATA|(a|b))*",
            "(#PCDATA|a*)*",
            "(a) *",
        ] {
            assert!(parse("e", text, &mut h).is_err(), "{text}");
        }
        for text in ["( a , b )", "(#PCDATA)", "(#PCDATA)*", "( #PCDATA | a )*", "((a|b)+,c?)"] {
            assert!(parse("e", text, &mut h).is_ok(), "{text}");
        }
    }

    #[test]
    fn test_lone_particle_normalized() {
        for shape in [TreeShape::Minimal, TreeShape::Balanced] {
            assert_eq!(round_trip("(a?)", shape), "(a)?");
            assert_eq!(round_trip("(a)?", shape), "(a)?");
        }
    }
}
