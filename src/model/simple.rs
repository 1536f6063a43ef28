//! Simple content models
//!
//! Models with at most two element leaves: `(a)`, `(a|b)`, `(a,b)`, `(a)?`,
//! `(a)*`, `(a)+`. Checked directly without building an automaton.

use super::{Child, ContentOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOp {
    Leaf,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    Choice,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleContentModel {
    op: SimpleOp,
    first: String,
    second: Option<String>,
}

impl SimpleContentModel {
    pub fn new(op: SimpleOp, first: &str, second: Option<&str>) -> Self {
        SimpleContentModel {
            op,
            first: first.to_string(),
            second: second.map(str::to_string),
        }
    }

    fn is_first(&self, child: &Child) -> bool {
        child.name() == Some(self.first.as_str())
    }

    fn is_second(&self, child: &Child) -> bool {
        match (&self.second, child.name()) {
            (Some(second), Some(name)) => second == name,
            _ => false,
        }
    }

    pub fn validate(&self, children: &[Child]) -> ContentOutcome {
        let count = children.len();
        match self.op {
            SimpleOp::Leaf => {
                if count == 0 {
                    return ContentOutcome::Incomplete;
                }
                if !self.is_first(&children[0]) {
                    return ContentOutcome::Invalid(0);
                }
                if count > 1 {
                    return ContentOutcome::Invalid(1);
                }
            }
            SimpleOp::ZeroOrOne => {
                if count == 1 && !self.is_first(&children[0]) {
                    return ContentOutcome::Invalid(0);
                }
                if count > 1 {
                    return ContentOutcome::Invalid(1);
                }
            }
            SimpleOp::ZeroOrMore => {
                if let Some(i) = children.iter().position(|c| !self.is_first(c)) {
                    return ContentOutcome::Invalid(i);
                }
            }
            SimpleOp::OneOrMore => {
                if count == 0 {
                    return ContentOutcome::Incomplete;
                }
                if let Some(i) = children.iter().position(|c| !self.is_first(c)) {
                    return ContentOutcome::Invalid(i);
                }
            }
            SimpleOp::Choice => {
                if count == 0 {
                    return ContentOutcome::Incomplete;
                }
                if !self.is_first(&children[0]) && !self.is_second(&children[0]) {
                    return ContentOutcome::Invalid(0);
                }
                if count > 1 {
                    return ContentOutcome::Invalid(1);
                }
            }
            SimpleOp::Sequence => {
                if count == 0 {
                    return ContentOutcome::Incomplete;
                }
                if !self.is_first(&children[0]) {
                    return ContentOutcome::Invalid(0);
                }
                if count == 1 {
                    return ContentOutcome::Incomplete;
                }
                if !self.is_second(&children[1]) {
                    return ContentOutcome::Invalid(1);
                }
                if count > 2 {
                    return ContentOutcome::Invalid(2);
                }
            }
        }
        ContentOutcome::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kids(names: &[&str]) -> Vec<Child> {
        names.iter().map(|n| if *n == "#" { Child::PcData } else { Child::element(n) }).collect()
    }

    #[test]
    fn test_leaf() {
        let m = SimpleContentModel::new(SimpleOp::Leaf, "a", None);
        assert_eq!(m.validate(&kids(&["a"])), ContentOutcome::Valid);
        assert_eq!(m.validate(&kids(&[])), ContentOutcome::Incomplete);
        assert_eq!(m.validate(&kids(&["b"])), ContentOutcome::Invalid(0));
        assert_eq!(m.validate(&kids(&["a", "a"])), ContentOutcome::Invalid(1));
    }

    #[test]
    fn test_repetitions() {
        let opt = SimpleContentModel::new(SimpleOp::ZeroOrOne, "a", None);
        assert_eq!(opt.validate(&kids(&[])), ContentOutcome::Valid);
        assert_eq!(opt.validate(&kids(&["a", "a"])), ContentOutcome::Invalid(1));

        let star = SimpleContentModel::new(SimpleOp::ZeroOrMore, "a", None);
        assert_eq!(star.validate(&kids(&["a", "a", "b"])), ContentOutcome::Invalid(2));
        assert_eq!(star.validate(&kids(&["a", "#"])), ContentOutcome::Invalid(1));

        let plus = SimpleContentModel::new(SimpleOp::OneOrMore, "a", None);
        assert_eq!(plus.validate(&kids(&[])), ContentOutcome::Incomplete);
        assert_eq!(plus.validate(&kids(&["a", "a"])), ContentOutcome::Valid);
    }

    #[test]
    fn test_choice_and_sequence() {
        let choice = SimpleContentModel::new(SimpleOp::Choice, "a", Some("b"));
        assert_eq!(choice.validate(&kids(&["b"])), ContentOutcome::Valid);
        assert_eq!(choice.validate(&kids(&["c"])), ContentOutcome::Invalid(0));
        assert_eq!(choice.validate(&kids(&["a", "b"])), ContentOutcome::Invalid(1));

        let seq = SimpleContentModel::new(SimpleOp::Sequence, "a", Some("b"));
        assert_eq!(seq.validate(&kids(&["a", "b"])), ContentOutcome::Valid);
        assert_eq!(seq.validate(&kids(&["a"])), ContentOutcome::Incomplete);
        assert_eq!(seq.validate(&kids(&["b"])), ContentOutcome::Invalid(0));
        assert_eq!(seq.validate(&kids(&["a", "a"])), ContentOutcome::Invalid(1));
        assert_eq!(seq.validate(&kids(&["a", "b", "c"])), ContentOutcome::Invalid(2));
    }
}
