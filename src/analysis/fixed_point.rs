//! Module for the worklist-driven fixed-point solver.
//!
//! This module provides a generic framework for intraprocedural, iterative dataflow analyses:
//!
//! - [`Graph`]: The read-only control flow graph the solver walks
//! - [`DataflowAnalysis`]: The analysis (boundary and initial facts, meet, transfer function)
//! - [`Solver`]: Runs the worklist algorithm until no fact changes
//! - [`DataflowResult`]: The `IN` and `OUT` facts of every node at the fixed point
//!
//! # Theoretical Background
//!
//! Facts are elements of a lattice of finite height. At every node, the solver meets the facts
//! flowing in from the neighbouring nodes and applies the transfer function of the node.
//! Whenever the output of a node changes, its neighbours downstream are processed again.
//! As long as the meet operator and the transfer functions are monotonic, every fact can only
//! change a bounded number of times and the iteration terminates.
//!
//! # Example
//!
//! ```ignore
//! use tapas::analysis::{constant_propagation::ConstantPropagation, fixed_point::solve};
//!
//! let cfg = ControlFlowGraph::new(&method)?;
//! let result = solve(&cfg, &ConstantPropagation)?;
//! println!("{}", result.out_fact(cfg.entry()));
//! ```

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
    num::NonZeroUsize,
};

use tracing::{debug, trace, warn};

/// A control flow graph as seen by the solver.
///
/// Implementations must be well formed: edges are consistent in both directions and every
/// node yielded by [`predecessors`](Graph::predecessors) or [`successors`](Graph::successors)
/// is also yielded by [`nodes`](Graph::nodes). The solver never mutates the graph, so one graph
/// can serve several solver runs at the same time.
pub trait Graph {
    /// The identity of a node.
    ///
    /// Nodes are copied freely and used as keys of the solver's fact tables, so this is
    /// typically a small index such as [`StmtIndex`](crate::ir::StmtIndex).
    type Node: Copy + Eq + Hash + Debug;

    /// Returns the entry node.
    fn entry(&self) -> Self::Node;

    /// Returns the exit nodes. There is at least one.
    fn exits(&self) -> impl Iterator<Item = Self::Node> + '_;

    /// Returns all nodes.
    /// The solver uses this order for nodes that are not reachable from the start of the walk.
    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_;

    /// Returns the nodes with an edge to `node`.
    fn predecessors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Returns the nodes with an edge from `node`.
    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Suggests the order in which the nodes are first processed.
    ///
    /// The order is given in the direction of the edges. A backward analysis processes it in
    /// reverse. Duplicates are skipped and nodes missing from the hint are processed after it,
    /// in the order of [`nodes`](Graph::nodes).
    ///
    /// # Returns
    ///
    /// [`None`] by default, in which case the solver walks the graph in reverse post-order.
    fn order_hint(&self) -> Option<Vec<Self::Node>> {
        None
    }
}

/// A dataflow analysis over a graph of type `G`.
///
/// This trait encapsulates everything the [`Solver`] needs from an analysis:
/// - The direction in which facts flow
/// - The facts at the boundary and the starting facts of every node
/// - The meet operator combining facts at control flow merge points
/// - The transfer function of each node
///
/// The facts form a lattice whose bottom is [`Default::default`]. In a forward analysis the
/// facts flow from the entry along the edges, so each node maps its `IN` fact to its `OUT`
/// fact. In a backward analysis they flow from the exits against the edges, so each node maps
/// its `OUT` fact to its `IN` fact.
///
/// # Monotonicity
///
/// [`meet_into`](Self::meet_into) and [`transfer_node`](Self::transfer_node) must be monotonic
/// and the lattice must have finite height. The solver only ever meets into the incoming fact
/// of a node, so incoming facts never move back towards the bottom. It does not check the
/// analysis itself. A violation shows up as a run that does not terminate, which can be cut
/// off with [`SolverConfig::with_max_iterations`].
pub trait DataflowAnalysis<G: Graph + ?Sized> {
    /// The type of dataflow fact.
    ///
    /// [`Default::default`] must be the bottom of the lattice. The solver starts the incoming
    /// fact of every node that is not on the boundary from it.
    type Fact: Clone + Default;

    /// Checks whether facts flow along the edges.
    fn is_forward(&self) -> bool;

    /// Creates the fact at the boundary of the graph.
    ///
    /// This is the `IN` fact of the entry in a forward analysis and the `OUT` fact of every exit
    /// in a backward analysis.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph being analyzed
    fn new_boundary_fact(&self, graph: &G) -> Self::Fact;

    /// Creates the starting outgoing fact of `node`.
    ///
    /// This is the `OUT` fact in a forward analysis and the `IN` fact in a backward analysis,
    /// until `node` is processed for the first time.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph being analyzed
    /// * `node` - The node whose fact is created
    fn new_initial_fact(&self, graph: &G, node: G::Node) -> Self::Fact;

    /// Meets `fact` into `target`.
    ///
    /// # Arguments
    ///
    /// * `fact` - The outgoing fact of a neighbouring node
    /// * `target` - The incoming fact being accumulated
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Applies the transfer function of `node`.
    ///
    /// The new output is computed in place.
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph being analyzed
    /// * `node` - The node whose transfer function is applied
    /// * `input` - The fact flowing into the node in the direction of the analysis
    /// * `output` - The fact flowing out of the node, holding its previous value
    ///
    /// # Returns
    ///
    /// Whether `output` differs from its value before the call.
    fn transfer_node(
        &self,
        graph: &G,
        node: G::Node,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool;
}

/// Options of a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverConfig {
    /// The maximum number of nodes processed in a run. [`None`] means unbounded.
    pub max_iterations: Option<NonZeroUsize>,
}

impl SolverConfig {
    /// Bounds the number of nodes processed in a run.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: NonZeroUsize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// An error raised by the [`Solver`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SolverError {
    /// The configured iteration cap was reached before a fixed point.
    /// This means the analysis is not monotonic or its lattice is too high.
    #[error("The analysis did not converge within {iterations} iterations")]
    DidNotConverge {
        /// The number of nodes processed before giving up.
        iterations: usize,
    },
}

/// The facts of every node at the fixed point.
#[derive(Debug, Clone)]
pub struct DataflowResult<N, F> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    in_facts: Vec<F>,
    out_facts: Vec<F>,
    iterations: usize,
}

impl<N, F> DataflowResult<N, F>
where
    N: Copy + Eq + Hash + Debug,
{
    fn position(&self, node: N) -> usize {
        self.index
            .get(&node)
            .copied()
            .unwrap_or_else(|| panic!("{node:?} is not a node of the analyzed graph"))
    }

    /// Returns the `IN` fact of `node`.
    ///
    /// # Panics
    /// Panics if `node` was not part of the analyzed graph.
    #[must_use]
    pub fn in_fact(&self, node: N) -> &F {
        &self.in_facts[self.position(node)]
    }

    /// Returns the `OUT` fact of `node`.
    ///
    /// # Panics
    /// Panics if `node` was not part of the analyzed graph.
    #[must_use]
    pub fn out_fact(&self, node: N) -> &F {
        &self.out_facts[self.position(node)]
    }

    /// Checks whether `node` was part of the analyzed graph.
    #[must_use]
    pub fn contains(&self, node: N) -> bool {
        self.index.contains_key(&node)
    }

    /// Iterates over every node with its `IN` and `OUT` facts, in the order they were first
    /// queued.
    pub fn iter(&self) -> impl Iterator<Item = (N, &F, &F)> + '_ {
        self.nodes
            .iter()
            .zip(self.in_facts.iter().zip(&self.out_facts))
            .map(|(node, (in_fact, out_fact))| (*node, in_fact, out_fact))
    }

    /// Returns the number of nodes processed before reaching the fixed point.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }
}

/// A worklist solver computing the fixed point of a [`DataflowAnalysis`].
///
/// Every node starts queued, in the [order hint](Graph::order_hint) of the graph if it has one.
/// Otherwise the nodes are queued in reverse post-order of the walk from the entry (forward) or
/// the exits (backward), followed by the unreachable nodes. Whenever the output of a node
/// changes, the nodes downstream are queued again unless they are already queued.
///
/// The incoming fact of a node is kept across visits and only ever met into, so it never moves
/// back towards the bottom. This holds even when an outgoing fact drops from its
/// [initial value](DataflowAnalysis::new_initial_fact) on the first visit of its node.
#[derive(Debug, Clone, Copy, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Creates a solver with the given options.
    #[must_use]
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Returns the options of this solver.
    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Computes the fixed point of `analysis` over `graph`.
    ///
    /// # Errors
    /// Returns [`SolverError::DidNotConverge`] if the iteration cap is reached.
    ///
    /// # Panics
    /// Panics if `graph` is not well formed, see [`Graph`].
    pub fn solve<G, A>(
        &self,
        graph: &G,
        analysis: &A,
    ) -> Result<DataflowResult<G::Node, A::Fact>, SolverError>
    where
        G: Graph + ?Sized,
        A: DataflowAnalysis<G> + ?Sized,
    {
        let forward = analysis.is_forward();
        let boundary_nodes: HashSet<_> = if forward {
            HashSet::from([graph.entry()])
        } else {
            graph.exits().collect()
        };
        let nodes = match graph.order_hint() {
            Some(mut hint) => {
                if !forward {
                    hint.reverse();
                }
                complete_order(graph, hint)
            }
            None if forward => {
                traversal_order(graph, [graph.entry()], |it| graph.successors(it))
            }
            None => traversal_order(graph, graph.exits(), |it| graph.predecessors(it)),
        };
        debug!(
            forward,
            nodes = nodes.len(),
            "Solving dataflow analysis to a fixed point"
        );

        let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let boundary = analysis.new_boundary_fact(graph);
        // Facts entering and leaving each node in the direction of the analysis.
        let mut flow_in: Vec<A::Fact> = Vec::with_capacity(nodes.len());
        let mut flow_out: Vec<A::Fact> = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            if boundary_nodes.contains(&node) {
                flow_in.push(boundary.clone());
            } else {
                flow_in.push(A::Fact::default());
            }
            flow_out.push(analysis.new_initial_fact(graph, node));
        }

        let mut worklist: VecDeque<_> = nodes.iter().copied().collect();
        let mut queued: HashSet<_> = nodes.iter().copied().collect();
        let mut iterations = 0;
        while let Some(node) = worklist.pop_front() {
            queued.remove(&node);
            if let Some(limit) = self.config.max_iterations
                && iterations >= limit.get()
            {
                warn!(iterations, "Dataflow analysis did not converge");
                return Err(SolverError::DidNotConverge { iterations });
            }
            iterations += 1;

            let i = index[&node];
            let upstream: Vec<_> = if forward {
                graph.predecessors(node).collect()
            } else {
                graph.successors(node).collect()
            };
            for neighbour in upstream {
                analysis.meet_into(&flow_out[index[&neighbour]], &mut flow_in[i]);
            }

            let changed = analysis.transfer_node(graph, node, &flow_in[i], &mut flow_out[i]);
            trace!(?node, changed, "Processed node");
            if changed {
                let downstream: Vec<_> = if forward {
                    graph.successors(node).collect()
                } else {
                    graph.predecessors(node).collect()
                };
                for neighbour in downstream {
                    if queued.insert(neighbour) {
                        trace!(?neighbour, "Requeued node");
                        worklist.push_back(neighbour);
                    }
                }
            }
        }
        debug!(iterations, "Reached fixed point");

        let (in_facts, out_facts) = if forward {
            (flow_in, flow_out)
        } else {
            (flow_out, flow_in)
        };
        Ok(DataflowResult {
            nodes,
            index,
            in_facts,
            out_facts,
            iterations,
        })
    }
}

/// Computes the fixed point of `analysis` over `graph` with the default [`SolverConfig`].
///
/// # Errors
/// See [`Solver::solve`].
pub fn solve<G, A>(
    graph: &G,
    analysis: &A,
) -> Result<DataflowResult<G::Node, A::Fact>, SolverError>
where
    G: Graph + ?Sized,
    A: DataflowAnalysis<G> + ?Sized,
{
    Solver::default().solve(graph, analysis)
}

/// Lists the nodes reachable from `starts` via `next` in reverse post-order, followed by the
/// remaining nodes of `graph`.
fn traversal_order<G, S, F, I>(graph: &G, starts: S, next: F) -> Vec<G::Node>
where
    G: Graph + ?Sized,
    S: IntoIterator<Item = G::Node>,
    F: Fn(G::Node) -> I,
    I: Iterator<Item = G::Node>,
{
    let mut visited = HashSet::new();
    let mut post_order = Vec::new();
    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        let mut stack = vec![(start, next(start))];
        while let Some((node, children)) = stack.last_mut() {
            let node = *node;
            if let Some(child) = children.next() {
                if visited.insert(child) {
                    stack.push((child, next(child)));
                }
            } else {
                post_order.push(node);
                stack.pop();
            }
        }
    }
    post_order.reverse();
    complete_order(graph, post_order)
}

/// Drops duplicates from `order` and appends the nodes of `graph` it misses, in the order of
/// [`Graph::nodes`].
fn complete_order<G>(graph: &G, order: Vec<G::Node>) -> Vec<G::Node>
where
    G: Graph + ?Sized,
{
    let mut seen = HashSet::new();
    let mut complete: Vec<_> = order.into_iter().filter(|it| seen.insert(*it)).collect();
    complete.extend(graph.nodes().filter(|it| seen.insert(*it)));
    complete
}
