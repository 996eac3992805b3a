//! Intraprocedural constant propagation over `int` variables.

use super::{
    fact::MapFact,
    fixed_point::DataflowAnalysis,
    lattice::{MeetSemiLattice, Value},
};
use crate::ir::{Expression, Stmt, StmtIndex, Var, control_flow::ControlFlowGraph};

/// The fact of [`ConstantPropagation`]: the abstract value of every variable.
pub type CpFact = MapFact<Var, Value>;

/// A forward analysis computing which variables hold a constant `int`.
///
/// Only variables of a type that [can hold an `int`](Var::can_hold_int) are tracked. Everything
/// else stays [`Value::Undefined`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstantPropagation;

impl ConstantPropagation {
    /// Meets two values. Same as [`MeetSemiLattice::meet`].
    #[must_use]
    pub fn meet_value(lhs: Value, rhs: Value) -> Value {
        lhs.meet(rhs)
    }

    /// Evaluates `expr` in the abstract state `in_fact`.
    ///
    /// Division or remainder by a constant zero evaluates to [`Value::Undefined`] since no value
    /// ever reaches the definition. Expressions with effects the analysis does not model (calls
    /// and allocations) also evaluate to [`Value::Undefined`].
    #[must_use]
    pub fn evaluate(expr: &Expression, in_fact: &CpFact) -> Value {
        match expr {
            Expression::Var(var) => in_fact.get(var),
            Expression::IntLiteral(value) => Value::Constant(*value),
            Expression::Binary { op, lhs, rhs } => {
                match (Self::evaluate(lhs, in_fact), Self::evaluate(rhs, in_fact)) {
                    (Value::Constant(lhs), Value::Constant(rhs)) => {
                        op.apply(lhs, rhs).map_or(Value::Undefined, Value::Constant)
                    }
                    (Value::NotAConstant, _) | (_, Value::NotAConstant) => Value::NotAConstant,
                    _ => Value::Undefined,
                }
            }
            Expression::Call { .. } | Expression::New(_) => Value::Undefined,
        }
    }

    fn tracked_def(stmt: &Stmt) -> Option<(&Var, &Expression)> {
        match stmt {
            Stmt::Assign { lvalue, rvalue } if lvalue.can_hold_int() => Some((lvalue, rvalue)),
            _ => None,
        }
    }
}

impl DataflowAnalysis<ControlFlowGraph<'_>> for ConstantPropagation {
    type Fact = CpFact;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self, graph: &ControlFlowGraph<'_>) -> CpFact {
        graph
            .method()
            .params
            .iter()
            .filter(|it| it.can_hold_int())
            .map(|it| (it.clone(), Value::NotAConstant))
            .collect()
    }

    fn new_initial_fact(&self, graph: &ControlFlowGraph<'_>, node: StmtIndex) -> CpFact {
        Self::tracked_def(graph.stmt(node))
            .map(|(lvalue, _)| (lvalue.clone(), Value::NotAConstant))
            .into_iter()
            .collect()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        target.meet_with(fact);
    }

    fn transfer_node(
        &self,
        graph: &ControlFlowGraph<'_>,
        node: StmtIndex,
        input: &CpFact,
        output: &mut CpFact,
    ) -> bool {
        let mut new_out = input.clone();
        if let Some((lvalue, rvalue)) = Self::tracked_def(graph.stmt(node)) {
            new_out.update(lvalue.clone(), Self::evaluate(rvalue, input));
        }
        output.copy_from(&new_out)
    }
}
