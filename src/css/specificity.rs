//! Rule ordering within one style block.
//!
//! ```text
//! (rank, source_order)
//! ```
//!
//! Fields are ordered so that `Ord` (lexicographic) gives the cascade order:
//! a bare declaration list beats a type selector, which beats `*`; later
//! rules win ties.

use crate::css::model::Selector;

/// Selector rank, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectorRank {
    Universal,
    Kind,
    Own,
}

impl From<&Selector> for SelectorRank {
    fn from(selector: &Selector) -> Self {
        match selector {
            Selector::Universal => SelectorRank::Universal,
            Selector::Kind(_) => SelectorRank::Kind,
            Selector::Own => SelectorRank::Own,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub rank: SelectorRank,
    /// Rule index within its block.
    pub source_order: u32,
}

impl Specificity {
    pub fn from_selector(selector: &Selector, source_order: u32) -> Self {
        Self { rank: selector.into(), source_order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order() {
        assert!(SelectorRank::Universal < SelectorRank::Kind);
        assert!(SelectorRank::Kind < SelectorRank::Own);
    }

    #[test]
    fn rank_beats_source_order() {
        let early_own = Specificity::from_selector(&Selector::Own, 0);
        let late_kind = Specificity::from_selector(&Selector::Kind("box".into()), 9);
        assert!(early_own > late_kind);
    }

    #[test]
    fn source_order_breaks_ties() {
        let a = Specificity::from_selector(&Selector::Universal, 1);
        let b = Specificity::from_selector(&Selector::Universal, 2);
        assert!(b > a);
    }
}
