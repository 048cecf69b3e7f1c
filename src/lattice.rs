//! The two-constant disjoint-union abstract domain.
//!
//! The source models this as `DisjointUnionAbstractDomain<ConstantAbstractDomain<PointerClass>,
//! ConstantAbstractDomain<uint64_t>>`. Since the two sub-lattices are never addressed
//! independently of their join (a program point's register is either a number, a pointer with
//! some indirection count, unknown, or unreachable (never "possibly a number or possibly a
//! pointer, pick one"), this crate flattens the union into a single four-way enum.

use std::fmt;

/// An indirection count for a `Pointer` value. Always strictly positive.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct PointerClass(u32);

impl PointerClass {
    /// # Panics
    /// Panics (debug builds only) if `indirections` is zero; every public constructor of `Type`
    /// that produces a `Pointer` goes through [`Type::pointer`], which enforces this.
    pub fn new(indirections: u32) -> PointerClass {
        debug_assert!(indirections > 0, "pointer indirection count must be positive");
        PointerClass(indirections)
    }

    pub fn indirections(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PointerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An abstract type for one register at one program point.
///
/// `Bottom ⊑ Number ⊑ Top`, `Bottom ⊑ Pointer(k) ⊑ Top` for every `k`, and `Number`/`Pointer(k1)`/
/// `Pointer(k2)` (for `k1 != k2`) are pairwise unordered: joining any two of them collapses
/// straight to `Top`, exactly as a flat constant domain's distinct constants do.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Bottom,
    Number,
    Pointer(PointerClass),
    Top,
}

impl Type {
    pub fn pointer(indirections: u32) -> Type {
        Type::Pointer(PointerClass::new(indirections))
    }

    pub fn is_number(self) -> bool {
        matches!(self, Type::Number)
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Type::Bottom)
    }

    pub fn is_top(self) -> bool {
        matches!(self, Type::Top)
    }

    /// `self ⊑ other`.
    pub fn leq(self, other: Type) -> bool {
        match (self, other) {
            (Type::Bottom, _) => true,
            (_, Type::Top) => true,
            (a, b) => a == b,
        }
    }

    /// `self ⊔ other`.
    pub fn join(self, other: Type) -> Type {
        match (self, other) {
            (Type::Bottom, x) | (x, Type::Bottom) => x,
            (Type::Top, _) | (_, Type::Top) => Type::Top,
            (a, b) if a == b => a,
            _ => Type::Top,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bottom => write!(f, "\u{22a5}"),
            Type::Number => write!(f, "Number"),
            Type::Pointer(p) => write!(f, "Pointer({})", p.indirections()),
            Type::Top => write!(f, "\u{22a4}"),
        }
    }
}

/// The three-way classification a transfer function dispatches on (§4.4, §9): known `Number`,
/// known `Pointer`, or `Unknown` (`Top`/`Bottom`, which conservatively skips the check this
/// classification gates). This is the fixed-up version of the source's binary
/// `analyze_dest_number`/`analyze_dest_pointer` split, which had no third case.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Classification {
    Number,
    Pointer(PointerClass),
    Unknown,
}

pub fn classify(ty: Type) -> Classification {
    match ty {
        Type::Number => Classification::Number,
        Type::Pointer(p) => Classification::Pointer(p),
        Type::Top | Type::Bottom => Classification::Unknown,
    }
}
