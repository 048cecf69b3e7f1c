//! The abstract environment: a total map from canonical register name to [`Type`], plus the
//! dedicated `Bottom` sentinel for program points not (yet) reached by the fixpoint iterator.
//!
//! Mirrors the source's `HashedAbstractEnvironment<std::string, PointerNumberDomain>`: a register
//! absent from the map reads as `Top` (unknown), and the environment as a whole can additionally
//! be `Bottom` (every register unreachable), which a plain `HashMap` can't represent on its own.

use crate::lattice::Type;
use std::collections::HashMap;

/// A total register → [`Type`] map, or the `Bottom` environment.
#[derive(Clone, Debug, PartialEq)]
pub enum AbstractEnvironment {
    /// The environment at a program point the fixpoint iterator hasn't reached yet.
    Bottom,
    /// A (possibly partial) map; absent keys read as `Top`.
    Map(HashMap<String, Type>),
}

impl AbstractEnvironment {
    /// The environment in which every register is unknown (`Top`). This is the seed for the
    /// entry node.
    pub fn top() -> AbstractEnvironment {
        AbstractEnvironment::Map(HashMap::new())
    }

    /// The environment of an unreached program point.
    pub fn bottom() -> AbstractEnvironment {
        AbstractEnvironment::Bottom
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, AbstractEnvironment::Bottom)
    }

    /// Reads `reg`'s current abstract type. Missing keys (and the `Bottom` environment as a
    /// whole) read as their respective default: `Top` for an absent map key, `Bottom` for the
    /// `Bottom` environment.
    pub fn get(&self, reg: &str) -> Type {
        match self {
            AbstractEnvironment::Bottom => Type::Bottom,
            AbstractEnvironment::Map(map) => map.get(reg).copied().unwrap_or(Type::Top),
        }
    }

    /// Strong (destructive) update of `reg`. Promotes `Bottom` to an (otherwise-bottom-everywhere
    /// conceptually, but represented as an) empty map on first write, matching the convention
    /// that only the dedicated `Bottom` variant, not any individual key, represents ⊥.
    pub fn set(&mut self, reg: &str, ty: Type) {
        if let AbstractEnvironment::Bottom = self {
            *self = AbstractEnvironment::Map(HashMap::new());
        }
        if let AbstractEnvironment::Map(map) = self {
            map.insert(reg.to_owned(), ty);
        }
    }

    /// Pointwise join. `Bottom` is the identity; otherwise every register named in either side is
    /// joined (registers missing from one side read as `Top` there, as usual).
    pub fn join(&self, other: &AbstractEnvironment) -> AbstractEnvironment {
        match (self, other) {
            (AbstractEnvironment::Bottom, x) | (x, AbstractEnvironment::Bottom) => x.clone(),
            (AbstractEnvironment::Map(a), AbstractEnvironment::Map(b)) => {
                let mut joined = HashMap::new();
                for reg in a.keys().chain(b.keys()) {
                    if joined.contains_key(reg) {
                        continue;
                    }
                    let ty = self.get(reg).join(other.get(reg));
                    joined.insert(reg.clone(), ty);
                }
                AbstractEnvironment::Map(joined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_register_reads_top() {
        let env = AbstractEnvironment::top();
        assert_eq!(env.get("r5"), Type::Top);
    }

    #[test]
    fn bottom_register_reads_bottom() {
        let env = AbstractEnvironment::bottom();
        assert_eq!(env.get("r5"), Type::Bottom);
    }

    #[test]
    fn set_promotes_bottom_to_map() {
        let mut env = AbstractEnvironment::bottom();
        env.set("r1", Type::Number);
        assert_eq!(env.get("r1"), Type::Number);
        assert_eq!(env.get("r2"), Type::Top);
    }

    #[test]
    fn join_is_pointwise() {
        let mut a = AbstractEnvironment::top();
        a.set("r1", Type::Number);
        let mut b = AbstractEnvironment::top();
        b.set("r1", Type::Number);
        b.set("r2", Type::pointer(1));

        let joined = a.join(&b);
        assert_eq!(joined.get("r1"), Type::Number);
        assert_eq!(joined.get("r2"), Type::Top); // r2 is Top in `a`, Pointer(1) in `b`
    }

    #[test]
    fn join_with_bottom_is_identity() {
        let mut a = AbstractEnvironment::top();
        a.set("r1", Type::Number);
        let bottom = AbstractEnvironment::bottom();

        assert_eq!(a.join(&bottom), a);
        assert_eq!(bottom.join(&a), a);
    }
}
