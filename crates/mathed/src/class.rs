//! TeX atom classes and inter-class spacing
//!
//! Each element of a linearized row carries one of the eight TeX atom
//! classes. Before spacing is looked up, binary atoms without a usable
//! operand on one side are downgraded to ordinary atoms (TeXbook Appendix G,
//! rules 5 and 6); the spacing table then maps each class pair to a math
//! skip in mu units.

use crate::metrics::MetricsBase;
use serde::{Deserialize, Serialize};

/// TeX atom classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MathClass {
    /// Ordinary symbol: variables, digits
    #[default]
    Ord,
    /// Large operator: \sum, \int
    Op,
    /// Binary operator: +, -, \times
    Bin,
    /// Relation: =, <, \leq
    Rel,
    /// Opening delimiter
    Open,
    /// Closing delimiter
    Close,
    /// Punctuation: comma, semicolon
    Punct,
    /// Inner (delimited subformula)
    Inner,
    /// Not yet classified; treated as Ord after reclassification
    Unknown,
}

impl MathClass {
    fn index(self) -> usize {
        match self {
            MathClass::Ord | MathClass::Unknown => 0,
            MathClass::Op => 1,
            MathClass::Bin => 2,
            MathClass::Rel => 3,
            MathClass::Open => 4,
            MathClass::Close => 5,
            MathClass::Punct => 6,
            MathClass::Inner => 7,
        }
    }
}

/// Reclassify one atom given its final neighbors.
///
/// A binary atom becomes ordinary when nothing it could operate on precedes
/// it (the previous atom is Bin, Op, Rel, Open or Punct - the row's OPEN
/// sentinel covers "first in list") or when a relation, closing delimiter or
/// punctuation follows it. Unknown atoms default to ordinary. Pure function
/// of the triple; running it twice changes nothing.
pub fn update_class(mc: &mut MathClass, prev: MathClass, next: MathClass) {
    if *mc == MathClass::Unknown {
        *mc = MathClass::Ord;
    }
    if *mc == MathClass::Bin
        && (matches!(
            prev,
            MathClass::Bin | MathClass::Op | MathClass::Rel | MathClass::Open | MathClass::Punct
        ) || matches!(next, MathClass::Rel | MathClass::Close | MathClass::Punct))
    {
        *mc = MathClass::Ord;
    }
}

/// Spacing codes between atom classes (row = left, column = right).
///
/// 0 none, 1 thin, 2 med, 3 thick; negative values apply only outside
/// script styles; 9 marks pairs that cannot survive reclassification.
const SPACING: [[i8; 8]; 8] = [
    /* left \ right: Ord  Op  Bin  Rel Open Close Punct Inner */
    /* Ord   */ [0, 1, -2, -3, 0, 0, 0, -1],
    /* Op    */ [1, 1, 9, -3, 0, 0, 0, -1],
    /* Bin   */ [-2, -2, 9, 9, -2, 9, 9, -2],
    /* Rel   */ [-3, -3, 9, 0, -3, 0, 0, -3],
    /* Open  */ [0, 0, 9, 0, 0, 0, 0, 0],
    /* Close */ [0, 1, -2, -3, 0, 0, 0, -1],
    /* Punct */ [-1, -1, 9, -1, -1, -1, -1, -1],
    /* Inner */ [-1, 1, -2, -3, -1, 0, -1, -1],
];

/// The pixel skip between two adjacent atoms of the given classes.
///
/// Must only be called after `update_class` ran over the row; the "never"
/// entries of the table are unreachable then.
pub fn class_spacing(left: MathClass, right: MathClass, base: &MetricsBase) -> i32 {
    let code = SPACING[left.index()][right.index()];
    debug_assert!(code != 9, "impossible class pair {left:?} {right:?}");
    let (code, conditional) = if code < 0 { (-code, true) } else { (code, false) };
    if conditional && base.font.style.is_script() {
        return 0;
    }
    match code {
        0 | 9 => 0,
        1 => base.thin_space(),
        2 => base.med_space(),
        3 => base.thick_space(),
        _ => unreachable!(),
    }
}

/// Default class of a plain character atom
pub fn char_class(c: char) -> MathClass {
    match c {
        '+' | '-' | '\u{2212}' | '\u{00B1}' | '\u{2213}' | '\u{00D7}' | '\u{00F7}'
        | '\u{22C5}' | '*' => MathClass::Bin,
        '=' | '<' | '>' | ':' | '\u{2260}' | '\u{2264}' | '\u{2265}' | '\u{2248}'
        | '\u{2261}' | '\u{221D}' | '\u{2208}' | '\u{2192}' | '\u{2190}' => MathClass::Rel,
        '(' | '[' | '{' | '\u{27E8}' => MathClass::Open,
        ')' | ']' | '}' | '\u{27E9}' | '!' | '?' => MathClass::Close,
        ',' | ';' => MathClass::Punct,
        _ => MathClass::Ord,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontInfo, MathStyle};
    use proptest::prelude::*;

    const ALL: [MathClass; 9] = [
        MathClass::Ord,
        MathClass::Op,
        MathClass::Bin,
        MathClass::Rel,
        MathClass::Open,
        MathClass::Close,
        MathClass::Punct,
        MathClass::Inner,
        MathClass::Unknown,
    ];

    fn text_base() -> MetricsBase {
        MetricsBase::new(FontInfo::new(18.0, MathStyle::Text), 600)
    }

    fn script_base() -> MetricsBase {
        MetricsBase::new(FontInfo::new(18.0, MathStyle::Script), 600)
    }

    #[test]
    fn test_bin_after_open_becomes_ord() {
        let mut mc = MathClass::Bin;
        update_class(&mut mc, MathClass::Open, MathClass::Ord);
        assert_eq!(mc, MathClass::Ord);
    }

    #[test]
    fn test_bin_before_rel_becomes_ord() {
        let mut mc = MathClass::Bin;
        update_class(&mut mc, MathClass::Ord, MathClass::Rel);
        assert_eq!(mc, MathClass::Ord);
    }

    #[test]
    fn test_bin_between_ords_stays_bin() {
        let mut mc = MathClass::Bin;
        update_class(&mut mc, MathClass::Ord, MathClass::Ord);
        assert_eq!(mc, MathClass::Bin);
    }

    #[test]
    fn test_unknown_defaults_to_ord() {
        let mut mc = MathClass::Unknown;
        update_class(&mut mc, MathClass::Ord, MathClass::Ord);
        assert_eq!(mc, MathClass::Ord);
    }

    #[test]
    fn test_ord_bin_ord_spacing_is_two_med_skips() {
        let base = text_base();
        let left = class_spacing(MathClass::Ord, MathClass::Bin, &base);
        let right = class_spacing(MathClass::Bin, MathClass::Ord, &base);
        assert_eq!(left, base.med_space());
        assert_eq!(right, base.med_space());
    }

    #[test]
    fn test_conditional_spacing_collapses_in_script() {
        let text = text_base();
        let script = script_base();
        assert!(class_spacing(MathClass::Ord, MathClass::Bin, &text) > 0);
        assert_eq!(class_spacing(MathClass::Ord, MathClass::Bin, &script), 0);
        // Op-Ord thin space is unconditional
        assert!(class_spacing(MathClass::Op, MathClass::Ord, &script) > 0);
    }

    #[test]
    fn test_ord_rel_is_thick() {
        let base = text_base();
        assert_eq!(
            class_spacing(MathClass::Ord, MathClass::Rel, &base),
            base.thick_space()
        );
    }

    fn reachable_after_update(left: MathClass, right: MathClass) -> bool {
        // After reclassification a Bin never borders Rel/Close/Punct on the
        // right, never follows Bin/Op/Rel/Open/Punct, and Unknown is gone.
        if left == MathClass::Unknown || right == MathClass::Unknown {
            return false;
        }
        if right == MathClass::Bin
            && matches!(
                left,
                MathClass::Bin | MathClass::Op | MathClass::Rel | MathClass::Open | MathClass::Punct
            )
        {
            return false;
        }
        if left == MathClass::Bin
            && matches!(right, MathClass::Rel | MathClass::Close | MathClass::Punct)
        {
            return false;
        }
        true
    }

    #[test]
    fn test_spacing_table_totality() {
        let base = text_base();
        for &left in &ALL {
            for &right in &ALL {
                if reachable_after_update(left, right) {
                    assert!(class_spacing(left, right, &base) >= 0);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_update_class_is_idempotent(
            mc_i in 0..ALL.len(), prev_i in 0..ALL.len(), next_i in 0..ALL.len()
        ) {
            let (prev, next) = (ALL[prev_i], ALL[next_i]);
            let mut once = ALL[mc_i];
            update_class(&mut once, prev, next);
            let mut twice = once;
            update_class(&mut twice, prev, next);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_char_classes() {
        assert_eq!(char_class('+'), MathClass::Bin);
        assert_eq!(char_class('='), MathClass::Rel);
        assert_eq!(char_class('('), MathClass::Open);
        assert_eq!(char_class(')'), MathClass::Close);
        assert_eq!(char_class(','), MathClass::Punct);
        assert_eq!(char_class('x'), MathClass::Ord);
    }
}
