//! Mixed content
//!
//! `(#PCDATA|a|b)*`: character data anywhere, plus any listed element in
//! any order and number.

use super::{Child, ContentOutcome, Wildcard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixedLeaf {
    Name(String),
    Wildcard(Wildcard),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixedContentModel {
    leaves: Vec<MixedLeaf>,
}

impl MixedContentModel {
    pub fn new(leaves: Vec<MixedLeaf>) -> Self {
        MixedContentModel { leaves }
    }

    pub fn leaves(&self) -> &[MixedLeaf] {
        &self.leaves
    }

    pub fn validate(&self, children: &[Child]) -> ContentOutcome {
        for (i, child) in children.iter().enumerate() {
            let Child::Element(name) = child else { continue };
            let allowed = self.leaves.iter().any(|leaf| match leaf {
                MixedLeaf::Name(n) => n == &name.raw,
                MixedLeaf::Wildcard(w) => w.matches(name),
            });
            if !allowed {
                return ContentOutcome::Invalid(i);
            }
        }
        ContentOutcome::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MixedContentModel {
        MixedContentModel::new(vec![MixedLeaf::Name("a".into()), MixedLeaf::Name("b".into())])
    }

    #[test]
    fn test_any_order_with_text() {
        let kids = vec![Child::PcData, Child::element("a"), Child::PcData, Child::element("b"), Child::element("a")];
        assert_eq!(model().validate(&kids), ContentOutcome::Valid);
        assert_eq!(model().validate(&[]), ContentOutcome::Valid);
    }

    #[test]
    fn test_unlisted_child() {
        let kids = vec![Child::PcData, Child::element("a"), Child::element("c")];
        assert_eq!(model().validate(&kids), ContentOutcome::Invalid(2));
    }

    #[test]
    fn test_pcdata_only() {
        let m = MixedContentModel::default();
        assert_eq!(m.validate(&[Child::PcData]), ContentOutcome::Valid);
        assert_eq!(m.validate(&[Child::element("a")]), ContentOutcome::Invalid(0));
    }
}
