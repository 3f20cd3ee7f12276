//! Edge aggregators: map-reduce over all edges, run periodically by the engine.

use std::ops::AddAssign;

use crate::engine::{ProgramEdge, ProgramGraph, VertexProgram};
use crate::helpers::periodic::Periodic;

pub trait EdgeAggregator<P: VertexProgram> {
    /// Commutative and associative partial result.
    type Value: Default + AddAssign;

    fn map(&self, context: &P::Context, edge: ProgramEdge<'_, P>) -> Self::Value;

    fn finalize(&mut self, context: &P::Context, value: Self::Value);
}

/// Object-safe form of [`EdgeAggregator`], so that aggregators with different
/// value types can be registered in one engine.
pub trait Aggregate<P: VertexProgram> {
    fn aggregate(&mut self, graph: &ProgramGraph<P>, context: &P::Context);
}

impl<P, A> Aggregate<P> for A
where
    P: VertexProgram,
    A: EdgeAggregator<P>,
{
    fn aggregate(&mut self, graph: &ProgramGraph<P>, context: &P::Context) {
        let value = graph.map_reduce_edges(|edge| self.map(context, edge));
        self.finalize(context, value);
    }
}

pub struct PeriodicAggregator<P: VertexProgram> {
    pub name: &'static str,
    pub aggregator: Box<dyn Aggregate<P>>,
    pub periodic: Periodic,
}
