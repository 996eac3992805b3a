//! Live-variable analysis.

use super::{fact::SetFact, fixed_point::DataflowAnalysis};
use crate::ir::{StmtIndex, Var, control_flow::ControlFlowGraph};

/// A backward analysis computing the variables that may be read before they are redefined.
///
/// The `IN` fact of a statement holds the variables live right before it, its `OUT` fact the
/// variables live right after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[instability::unstable(feature = "live-variables")]
pub struct LiveVariableAnalysis;

impl DataflowAnalysis<ControlFlowGraph<'_>> for LiveVariableAnalysis {
    type Fact = SetFact<Var>;

    fn is_forward(&self) -> bool {
        false
    }

    fn new_boundary_fact(&self, _graph: &ControlFlowGraph<'_>) -> Self::Fact {
        SetFact::new()
    }

    fn new_initial_fact(&self, _graph: &ControlFlowGraph<'_>, _node: StmtIndex) -> Self::Fact {
        SetFact::new()
    }

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
        target.union(fact);
    }

    fn transfer_node(
        &self,
        graph: &ControlFlowGraph<'_>,
        node: StmtIndex,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool {
        let stmt = graph.stmt(node);
        let mut live = input.clone();
        if let Some(def) = stmt.def() {
            live.remove(def);
        }
        for used in stmt.uses() {
            live.add(used);
        }
        output.copy_from(&live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArithmeticOp, Expression, Method, Stmt};

    #[test]
    fn kills_definition_and_adds_uses() {
        let x = Var::int("x");
        let y = Var::int("y");
        let method = Method::new(
            "f",
            vec![y.clone()],
            vec![
                Stmt::assign(x.clone(), Expression::binary(ArithmeticOp::Add, &x, &y)),
                Stmt::Return(None),
            ],
        );
        let cfg = ControlFlowGraph::new(&method).unwrap();

        let out: SetFact<_> = [x.clone()].into_iter().collect();
        let mut live_in = SetFact::new();
        assert!(LiveVariableAnalysis.transfer_node(&cfg, StmtIndex::ZERO, &out, &mut live_in));
        assert_eq!(live_in, [x.clone(), y].into_iter().collect::<SetFact<_>>());
        assert!(!LiveVariableAnalysis.transfer_node(&cfg, StmtIndex::ZERO, &out, &mut live_in));
    }

    #[test]
    fn meet_is_union() {
        let a: SetFact<_> = [Var::int("a")].into_iter().collect();
        let mut b: SetFact<_> = [Var::int("b")].into_iter().collect();
        LiveVariableAnalysis.meet_into(&a, &mut b);
        assert_eq!(b.len(), 2);
        assert!(b.contains(&Var::int("a")));
    }
}
