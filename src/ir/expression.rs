use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use super::Type;

/// A local variable or a parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{name}")]
pub struct Var {
    name: String,
    ty: Type,
}

impl Var {
    /// Creates a variable.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Creates a variable of type `int`.
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Type::INT)
    }

    /// Returns the name of the variable.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type of the variable.
    #[must_use]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Checks whether the variable holds an `int` at runtime.
    #[must_use]
    pub const fn can_hold_int(&self) -> bool {
        self.ty.can_hold_int()
    }
}

/// An arithmetic operator on `int`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ArithmeticOp {
    /// `lhs + rhs`
    #[display("+")]
    Add,
    /// `lhs - rhs`
    #[display("-")]
    Sub,
    /// `lhs * rhs`
    #[display("*")]
    Mul,
    /// `lhs / rhs`
    #[display("/")]
    Div,
    /// `lhs % rhs`
    #[display("%")]
    Rem,
}

impl ArithmeticOp {
    /// Evaluates the operator with two's complement wrapping.
    /// Returns [`None`] when dividing by zero.
    #[must_use]
    pub const fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            Self::Add => Some(lhs.wrapping_add(rhs)),
            Self::Sub => Some(lhs.wrapping_sub(rhs)),
            Self::Mul => Some(lhs.wrapping_mul(rhs)),
            Self::Div if rhs == 0 => None,
            Self::Div => Some(lhs.wrapping_div(rhs)),
            Self::Rem if rhs == 0 => None,
            Self::Rem => Some(lhs.wrapping_rem(rhs)),
        }
    }
}

/// A comparison operator on `int`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ConditionOp {
    /// `lhs == rhs`
    #[display("==")]
    Eq,
    /// `lhs != rhs`
    #[display("!=")]
    Ne,
    /// `lhs < rhs`
    #[display("<")]
    Lt,
    /// `lhs > rhs`
    #[display(">")]
    Gt,
    /// `lhs <= rhs`
    #[display("<=")]
    Le,
    /// `lhs >= rhs`
    #[display(">=")]
    Ge,
}

impl ConditionOp {
    /// Evaluates the comparison.
    #[must_use]
    pub const fn apply(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// A bitwise operator on `int`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum BitwiseOp {
    /// `lhs | rhs`
    #[display("|")]
    Or,
    /// `lhs & rhs`
    #[display("&")]
    And,
    /// `lhs ^ rhs`
    #[display("^")]
    Xor,
}

impl BitwiseOp {
    /// Evaluates the operator.
    #[must_use]
    pub const fn apply(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Self::Or => lhs | rhs,
            Self::And => lhs & rhs,
            Self::Xor => lhs ^ rhs,
        }
    }
}

/// A shift operator on `int`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ShiftOp {
    /// `lhs << rhs`
    #[display("<<")]
    Shl,
    /// `lhs >> rhs`, filling with the sign bit.
    #[display(">>")]
    Shr,
    /// `lhs >>> rhs`, filling with zeros.
    #[display(">>>")]
    Ushr,
}

impl ShiftOp {
    /// Evaluates the operator. Only the lowest five bits of the distance are used.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub const fn apply(self, lhs: i32, rhs: i32) -> i32 {
        let distance = rhs as u32;
        match self {
            Self::Shl => lhs.wrapping_shl(distance),
            Self::Shr => lhs.wrapping_shr(distance),
            Self::Ushr => (lhs as u32).wrapping_shr(distance) as i32,
        }
    }
}

/// The operator of a binary expression, grouped by category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::From,
)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum BinaryOperator {
    /// An arithmetic operator.
    Arithmetic(ArithmeticOp),
    /// A comparison, yielding `1` if it holds and `0` otherwise.
    Condition(ConditionOp),
    /// A bitwise operator.
    Bitwise(BitwiseOp),
    /// A shift operator.
    Shift(ShiftOp),
}

impl BinaryOperator {
    /// Evaluates the operator on two `int`s with JVM semantics.
    /// Returns [`None`] if the result is undefined (division or remainder by zero).
    #[must_use]
    pub const fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            Self::Arithmetic(op) => op.apply(lhs, rhs),
            Self::Condition(op) => Some(if op.apply(lhs, rhs) { 1 } else { 0 }),
            Self::Bitwise(op) => Some(op.apply(lhs, rhs)),
            Self::Shift(op) => Some(op.apply(lhs, rhs)),
        }
    }
}

/// The right-hand side of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// Reads a variable.
    Var(Var),
    /// An `int` literal.
    IntLiteral(i32),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOperator,
        /// The left operand.
        lhs: Box<Expression>,
        /// The right operand.
        rhs: Box<Expression>,
    },
    /// Calls a method.
    Call {
        /// The name of the method.
        method: String,
        /// The arguments.
        args: Vec<Expression>,
    },
    /// Creates an instance of the named class.
    New(String),
}

impl Expression {
    /// Creates a binary expression.
    #[must_use]
    pub fn binary(
        op: impl Into<BinaryOperator>,
        lhs: impl Into<Expression>,
        rhs: impl Into<Expression>,
    ) -> Self {
        Self::Binary {
            op: op.into(),
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    /// Returns the set of [`Var`]s read by the expression.
    #[must_use]
    pub fn uses(&self) -> BTreeSet<Var> {
        match self {
            Self::Var(var) => BTreeSet::from([var.clone()]),
            Self::IntLiteral(_) | Self::New(_) => BTreeSet::new(),
            Self::Binary { lhs, rhs, .. } => lhs.uses().into_iter().chain(rhs.uses()).collect(),
            Self::Call { args, .. } => args.iter().flat_map(Self::uses).collect(),
        }
    }
}

impl From<Var> for Expression {
    fn from(value: Var) -> Self {
        Self::Var(value)
    }
}

impl From<&Var> for Expression {
    fn from(value: &Var) -> Self {
        Self::Var(value.clone())
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Self::IntLiteral(value)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var(var) => write!(f, "{var}"),
            Self::IntLiteral(value) => write!(f, "{value}"),
            Self::Binary { op, lhs, rhs } => {
                write_operand(f, lhs)?;
                write!(f, " {op} ")?;
                write_operand(f, rhs)
            }
            Self::Call { method, args } => write!(f, "{method}({})", args.iter().join(", ")),
            Self::New(class) => write!(f, "new {class}"),
        }
    }
}

fn write_operand(f: &mut Formatter<'_>, operand: &Expression) -> std::fmt::Result {
    if matches!(operand, Expression::Binary { .. }) {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn division_by_zero_is_undefined() {
        assert_eq!(ArithmeticOp::Div.apply(5, 0), None);
        assert_eq!(ArithmeticOp::Rem.apply(5, 0), None);
        assert_eq!(ArithmeticOp::Div.apply(i32::MIN, -1), Some(i32::MIN));
        assert_eq!(ArithmeticOp::Rem.apply(i32::MIN, -1), Some(0));
        assert_eq!(ArithmeticOp::Rem.apply(-7, 2), Some(-1));
    }

    #[test]
    fn shifts_follow_the_jvm() {
        assert_eq!(ShiftOp::Shl.apply(1, 33), 2);
        assert_eq!(ShiftOp::Shr.apply(-8, 1), -4);
        assert_eq!(ShiftOp::Ushr.apply(-1, 28), 0xf);
        assert_eq!(ShiftOp::Ushr.apply(-1, -4), 0xf);
    }

    #[test]
    fn conditions_yield_int() {
        let lt = BinaryOperator::from(ConditionOp::Lt);
        assert_eq!(lt.apply(1, 2), Some(1));
        assert_eq!(lt.apply(2, 1), Some(0));
    }

    #[test]
    fn display() {
        let x = Var::int("x");
        let expr = Expression::binary(
            ArithmeticOp::Mul,
            Expression::binary(ArithmeticOp::Add, &x, 1),
            2,
        );
        assert_eq!(expr.to_string(), "(x + 1) * 2");
        assert_eq!(x.name(), x.to_string());
        let call = Expression::Call {
            method: "foo".to_owned(),
            args: vec![Expression::from(&x), Expression::from(3)],
        };
        assert_eq!(call.to_string(), "foo(x, 3)");
        assert_eq!(BinaryOperator::from(ShiftOp::Ushr).to_string(), ">>>");
    }

    proptest! {
        #[test]
        fn uses(op in any::<BinaryOperator>(), lhs in "[a-z]{1,3}", rhs in "[a-z]{1,3}", n in any::<i32>()) {
            let lhs = Var::int(lhs);
            let rhs = Var::int(rhs);
            let expr = Expression::binary(op, Expression::binary(op, &lhs, n), &rhs);
            prop_assert_eq!(expr.uses(), BTreeSet::from([lhs, rhs]));
            prop_assert!(Expression::from(n).uses().is_empty());
        }

        #[test]
        fn comparisons_are_boolean(op in any::<ConditionOp>(), lhs in any::<i32>(), rhs in any::<i32>()) {
            let result = BinaryOperator::Condition(op).apply(lhs, rhs);
            prop_assert!(matches!(result, Some(0 | 1)));
        }
    }
}
