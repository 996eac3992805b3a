use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use super::{Expression, Var};

/// Denotes the position of a statement in the body of a method.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[repr(transparent)]
pub struct StmtIndex(u16);

impl StmtIndex {
    /// Denotes the entry point of a method.
    pub const ZERO: Self = Self(0);

    /// Checks if the index is the entry point.
    #[must_use]
    pub const fn is_entry_point(&self) -> bool {
        self.0 == 0
    }

    /// Returns the index of the following statement, if it can be represented.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(it) => Some(Self(it)),
            None => None,
        }
    }
}

impl Display for StmtIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:05}", self.0)
    }
}

impl From<u16> for StmtIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<StmtIndex> for u16 {
    fn from(val: StmtIndex) -> Self {
        val.0
    }
}

impl From<StmtIndex> for usize {
    fn from(val: StmtIndex) -> Self {
        usize::from(val.0)
    }
}

/// A statement in three-address form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Does nothing.
    Nop,
    /// Assigns [`rvalue`](Stmt::Assign::rvalue) to [`lvalue`](Stmt::Assign::lvalue).
    Assign {
        /// The defined variable.
        lvalue: Var,
        /// The assigned expression.
        rvalue: Expression,
    },
    /// Evaluates an [`Expression`] for its side effects.
    Invoke(Expression),
    /// Jumps to [`target`](Stmt::If::target) if [`condition`](Stmt::If::condition) is non-zero,
    /// falls through otherwise.
    If {
        /// The branch condition.
        condition: Expression,
        /// The branch target.
        target: StmtIndex,
    },
    /// Jumps unconditionally.
    Goto(StmtIndex),
    /// Returns from the method, with a value if it is [`Some`].
    Return(Option<Var>),
}

impl Stmt {
    /// Creates an assignment.
    #[must_use]
    pub fn assign(lvalue: Var, rvalue: impl Into<Expression>) -> Self {
        Self::Assign {
            lvalue,
            rvalue: rvalue.into(),
        }
    }

    /// Returns the variable defined by the statement.
    #[must_use]
    pub const fn def(&self) -> Option<&Var> {
        match self {
            Self::Assign { lvalue, .. } => Some(lvalue),
            _ => None,
        }
    }

    /// Returns the set of [`Var`]s read by the statement.
    #[must_use]
    pub fn uses(&self) -> BTreeSet<Var> {
        match self {
            Self::Assign { rvalue: expr, .. }
            | Self::Invoke(expr)
            | Self::If {
                condition: expr, ..
            } => expr.uses(),
            Self::Return(value) => value.iter().cloned().collect(),
            Self::Nop | Self::Goto(_) => BTreeSet::new(),
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nop => write!(f, "nop"),
            Self::Assign { lvalue, rvalue } => write!(f, "{lvalue} = {rvalue}"),
            Self::Invoke(expr) => write!(f, "{expr}"),
            Self::If { condition, target } => write!(f, "if {condition} goto {target}"),
            Self::Goto(target) => write!(f, "goto {target}"),
            Self::Return(Some(value)) => write!(f, "return {value}"),
            Self::Return(None) => write!(f, "return"),
        }
    }
}

/// A method: its parameters and a body of statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// The name of the method.
    pub name: String,
    /// The parameters.
    pub params: Vec<Var>,
    /// The statements. Execution starts at the first one.
    pub body: Vec<Stmt>,
}

impl Method {
    /// Creates a method.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<Var>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    /// Returns the statement at `index`.
    #[must_use]
    pub fn stmt(&self, index: StmtIndex) -> Option<&Stmt> {
        self.body.get(usize::from(index))
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let params = self
            .params
            .iter()
            .map(|it| format!("{} {it}", it.ty()))
            .join(", ");
        writeln!(f, "{}({params}) {{", self.name)?;
        for (index, stmt) in self.body.iter().enumerate() {
            writeln!(f, "    #{index:05}: {stmt}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ArithmeticOp;

    #[test]
    fn entry_point() {
        assert!(StmtIndex::ZERO.is_entry_point());
        assert!(!StmtIndex::from(1).is_entry_point());
        assert_eq!(StmtIndex::from(u16::MAX).next(), None);
        assert_eq!(StmtIndex::ZERO.next(), Some(StmtIndex::from(1)));
    }

    #[test]
    fn def_and_uses() {
        let x = Var::int("x");
        let y = Var::int("y");
        let assign = Stmt::assign(x.clone(), Expression::binary(ArithmeticOp::Add, &y, &y));
        assert_eq!(assign.def(), Some(&x));
        assert_eq!(assign.uses(), BTreeSet::from([y.clone()]));

        let ret = Stmt::Return(Some(x.clone()));
        assert_eq!(ret.def(), None);
        assert_eq!(ret.uses(), BTreeSet::from([x]));
        assert!(Stmt::Goto(StmtIndex::ZERO).uses().is_empty());
    }

    #[test]
    fn display() {
        let x = Var::int("x");
        let method = Method::new(
            "f",
            vec![x.clone()],
            vec![
                Stmt::If {
                    condition: x.clone().into(),
                    target: StmtIndex::from(2),
                },
                Stmt::assign(x.clone(), 1),
                Stmt::Return(Some(x)),
            ],
        );
        assert_eq!(
            method.to_string(),
            "f(int x) {\n    #00000: if x goto #00002\n    #00001: x = 1\n    #00002: return x\n}"
        );
    }
}
