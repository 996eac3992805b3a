//! Lattices for dataflow facts.

/// A meet semi-lattice of finite height with a bottom element.
///
/// In this crate the bottom element means "no information yet" and the meet moves a value
/// towards the top, which means "no single answer". Facts only ever move upwards while a
/// fixed point is being computed, so a lattice of finite height guarantees termination.
///
/// # Laws
///
/// Implementations must satisfy the following laws:
///
/// - **Identity**: `Self::bottom().meet(a) == a`
/// - **Idempotency**: `a.clone().meet(a) == a`
/// - **Commutativity**: `a.meet(b) == b.meet(a)`
/// - **Associativity**: `a.meet(b).meet(c) == a.meet(b.meet(c))`
pub trait MeetSemiLattice: Clone + PartialEq {
    /// The bottom element.
    #[must_use]
    fn bottom() -> Self;

    /// Checks whether `self` is the bottom element.
    #[must_use]
    fn is_bottom(&self) -> bool {
        self == &Self::bottom()
    }

    /// Combines two elements arriving from converging control flow paths.
    ///
    /// Both operands are consumed, similar to [`std::ops::Add`].
    #[must_use]
    fn meet(self, other: Self) -> Self;
}

/// The abstract value of an integer variable in constant propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Value {
    /// No definition has reached the variable yet (bottom).
    #[display("UNDEF")]
    Undefined,
    /// The variable always holds the given constant.
    #[display("{_0}")]
    Constant(i32),
    /// The variable may hold different values (top).
    #[display("NAC")]
    NotAConstant,
}

impl Value {
    /// Checks whether the value is [`Value::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Checks whether the value is [`Value::NotAConstant`].
    #[must_use]
    pub const fn is_nac(&self) -> bool {
        matches!(self, Self::NotAConstant)
    }

    /// Returns the constant if the value is [`Value::Constant`].
    #[must_use]
    pub const fn as_constant(&self) -> Option<i32> {
        match self {
            Self::Constant(it) => Some(*it),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Constant(value)
    }
}

impl MeetSemiLattice for Value {
    fn bottom() -> Self {
        Self::Undefined
    }

    fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::NotAConstant, _) | (_, Self::NotAConstant) => Self::NotAConstant,
            (Self::Undefined, it) | (it, Self::Undefined) => it,
            (Self::Constant(lhs), Self::Constant(rhs)) if lhs == rhs => Self::Constant(lhs),
            (Self::Constant(_), Self::Constant(_)) => Self::NotAConstant,
        }
    }
}
