//! Join-semilattice traits
//!
//! Permission grants only ever accumulate when merged: a claim hook widens a
//! role, it never narrows it. These traits name that algebra so merge code can
//! be written once and property-tested against the laws.
//!
//! Laws (for all `a`, `b`, `c`):
//! - idempotent: `a ⊔ a = a`
//! - commutative: `a ⊔ b = b ⊔ a`
//! - associative: `(a ⊔ b) ⊔ c = a ⊔ (b ⊔ c)`
//! - identity: `a ⊔ ⊥ = a`

/// Types with a least-upper-bound merge
pub trait JoinSemilattice: Clone {
    /// Least upper bound of `self` and `other`
    fn join(&self, other: &Self) -> Self;

    /// In-place join
    fn join_assign(&mut self, other: &Self) {
        *self = self.join(other);
    }

    /// Partial order induced by join: `self ≤ other` iff `self ⊔ other = other`
    fn leq(&self, other: &Self) -> bool
    where
        Self: PartialEq,
    {
        &self.join(other) == other
    }
}

/// Types with a least element
pub trait Bottom {
    /// The least element
    fn bottom() -> Self;
}
