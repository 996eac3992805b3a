//! A small three-address intermediate representation of method bodies.

pub mod control_flow;
mod expression;
mod stmt;
mod types;

pub use expression::{
    ArithmeticOp, BinaryOperator, BitwiseOp, ConditionOp, Expression, ShiftOp, Var,
};
pub use stmt::{Method, Stmt, StmtIndex};
pub use types::{PrimitiveType, Type};
