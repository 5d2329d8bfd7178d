// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Porter-Duff operators.

use peniko::Compose;

/// A compositing operator. `src` is the (masked) source, `dst` the destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Clear,
    Src,
    Dst,
    Over,
    OverReverse,
    In,
    InReverse,
    Out,
    OutReverse,
    Atop,
    AtopReverse,
    Xor,
    Add,
    /// Add as much of the source as still fits under the destination alpha.
    Saturate,
}

impl Operator {
    pub const COUNT: usize = 14;

    pub const ALL: [Operator; Self::COUNT] = [
        Operator::Clear,
        Operator::Src,
        Operator::Dst,
        Operator::Over,
        Operator::OverReverse,
        Operator::In,
        Operator::InReverse,
        Operator::Out,
        Operator::OutReverse,
        Operator::Atop,
        Operator::AtopReverse,
        Operator::Xor,
        Operator::Add,
        Operator::Saturate,
    ];

    /// Index into the combiner tables.
    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Replace the operator by a cheaper one that gives the same result given
    /// what is known about the opacity of the source and the destination.
    ///
    /// Returns [`Operator::Dst`] when the composite leaves the destination unchanged.
    pub fn optimize(self, src_opaque: bool, dst_opaque: bool) -> Operator {
        use Operator::*;

        // Columns: both opaque, source opaque, destination opaque.
        let [both, src_only, dst_only] = match self {
            Over => [Src, Src, Over],
            OverReverse => [Dst, OverReverse, Dst],
            In => [Src, In, Src],
            InReverse => [Dst, Dst, InReverse],
            Out => [Clear, Out, Clear],
            OutReverse => [Clear, Clear, OutReverse],
            Atop => [Src, In, Over],
            AtopReverse => [Dst, OverReverse, InReverse],
            Xor => [Clear, Out, OutReverse],
            Saturate => [Dst, OverReverse, Dst],
            Clear | Src | Dst | Add => return self,
        };

        match (src_opaque, dst_opaque) {
            (true, true) => both,
            (true, false) => src_only,
            (false, true) => dst_only,
            (false, false) => self,
        }
    }
}

impl From<Compose> for Operator {
    fn from(value: Compose) -> Self {
        match value {
            Compose::Clear => Operator::Clear,
            Compose::Copy => Operator::Src,
            Compose::Dest => Operator::Dst,
            Compose::SrcOver => Operator::Over,
            Compose::DestOver => Operator::OverReverse,
            Compose::SrcIn => Operator::In,
            Compose::DestIn => Operator::InReverse,
            Compose::SrcOut => Operator::Out,
            Compose::DestOut => Operator::OutReverse,
            Compose::SrcAtop => Operator::Atop,
            Compose::DestAtop => Operator::AtopReverse,
            Compose::Xor => Operator::Xor,
            Compose::Plus => Operator::Add,
            Compose::PlusLighter => Operator::Saturate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, op) in Operator::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }

    #[test]
    fn over_with_opaque_source_becomes_src() {
        assert_eq!(Operator::Over.optimize(true, false), Operator::Src);
        assert_eq!(Operator::Over.optimize(true, true), Operator::Src);
        assert_eq!(Operator::Over.optimize(false, true), Operator::Over);
    }

    #[test]
    fn noop_reductions() {
        assert_eq!(Operator::OverReverse.optimize(false, true), Operator::Dst);
        assert_eq!(Operator::Saturate.optimize(false, true), Operator::Dst);
        assert_eq!(Operator::InReverse.optimize(true, false), Operator::Dst);
    }

    #[test]
    fn untouched_operators() {
        for op in [Operator::Clear, Operator::Src, Operator::Dst, Operator::Add] {
            for (s, d) in [(false, false), (true, false), (false, true), (true, true)] {
                assert_eq!(op.optimize(s, d), op);
            }
        }
        for op in Operator::ALL {
            assert_eq!(op.optimize(false, false), op);
        }
    }
}
