//! Bias-SGD vertex program.
//!
//! Rows (vertices without incoming edges) drive the updates: gathering over an
//! edge computes the descent steps of both endpoints, keeps the row's own step
//! and sends the column's step as a message. Columns never gather anything,
//! they apply the combined steps received from their rows. Scatter keeps both
//! sides cycling until the per-vertex update budget is exhausted.

use crate::engine::{Gathered, ProgramEdge, ProgramVertex, Signals, VertexProgram};
use crate::graph::{EdgeDirection, VertexMut};
use crate::math::vector::add_assign;
use crate::prelude::*;
use crate::trainer::context::RunContext;
use crate::trainer::gradient::Gradient;
use crate::trainer::math::{predict, sgd_step};
use crate::trainer::model::{EdgeData, Role, VertexData};

#[derive(Default)]
pub struct BiasSgd {
    /// Message buffered by `init` for a column, consumed by `apply`.
    pending: Gradient,
}

impl BiasSgd {
    /// Schedules every row that still has an update budget.
    pub fn signal_left(
        context: &RunContext,
        vertex: ProgramVertex<'_, Self>,
        signals: &mut Signals<Gradient>,
    ) {
        if vertex.num_out_edges() != 0
            && context.hyperparameters.has_budget(vertex.data().n_updates)
        {
            signals.signal(vertex.index(), Gradient::default());
        }
    }
}

impl VertexProgram for BiasSgd {
    type VertexData = VertexData;
    type EdgeData = EdgeData;
    type Gather = Gradient;
    type Message = Gradient;
    type Context = RunContext;

    /// Only rows gather, over their outgoing edges.
    fn gather_edges(
        &self,
        _context: &RunContext,
        vertex: ProgramVertex<'_, Self>,
    ) -> EdgeDirection {
        if vertex.num_in_edges() == 0 {
            EdgeDirection::Out
        } else {
            EdgeDirection::None
        }
    }

    fn gather(
        &self,
        context: &RunContext,
        vertex: ProgramVertex<'_, Self>,
        edge: ProgramEdge<'_, Self>,
    ) -> Gathered<Gradient, Gradient> {
        if vertex.num_in_edges() != 0 {
            return Gathered::local(Gradient::default());
        }

        let hyperparameters = &context.hyperparameters;
        let other = edge.other(&vertex);
        let data = edge.data();
        let prediction = predict(hyperparameters, edge.source().data(), edge.target().data());
        let residual_error = prediction - data.value;
        trace!(
            source = edge.source().id(),
            target = edge.target().id(),
            residual_error,
            "gathering",
        );
        assert!(
            !residual_error.is_nan(),
            "residual error is NaN for edge #{} → #{}",
            edge.source().id(),
            edge.target().id(),
        );

        match data.role {
            Role::Train => {
                let learning_rate = context.learning_rate.get();
                let regularization = hyperparameters.regularization;
                let own_step = sgd_step(
                    vertex.data(),
                    other.data(),
                    residual_error,
                    learning_rate,
                    regularization,
                );
                let other_step = sgd_step(
                    other.data(),
                    vertex.data(),
                    residual_error,
                    learning_rate,
                    regularization,
                );
                if hyperparameters.has_budget(other.data().n_updates) {
                    Gathered::with_signal(own_step, other.index(), other_step)
                } else {
                    Gathered::local(own_step)
                }
            }
            Role::Validate | Role::Predict => Gathered::local(Gradient::default()),
        }
    }

    fn init(&mut self, _context: &RunContext, vertex: ProgramVertex<'_, Self>, message: Gradient) {
        // Rows are updated from their own gather only.
        if vertex.num_in_edges() != 0 {
            self.pending = message;
        }
    }

    fn apply(&mut self, _context: &RunContext, vertex: VertexMut<'_, VertexData>, sum: Gradient) {
        let data = vertex.data;
        if !sum.is_empty() {
            assert_eq!(vertex.num_in_edges, 0, "vertex #{} gathered a step", vertex.id);
            add_assign(&mut data.factors, sum.delta());
            data.bias += sum.bias_delta();
        } else if !self.pending.is_empty() {
            assert_eq!(vertex.num_out_edges, 0, "vertex #{} received a step", vertex.id);
            add_assign(&mut data.factors, self.pending.delta());
            data.bias += self.pending.bias_delta();
        }
        data.n_updates += 1;
    }

    fn scatter(
        &self,
        context: &RunContext,
        vertex: ProgramVertex<'_, Self>,
        edge: ProgramEdge<'_, Self>,
        signals: &mut Signals<Gradient>,
    ) {
        match edge.data().role {
            Role::Train => {
                let other = edge.other(&vertex);
                if context.hyperparameters.has_budget(other.data().n_updates) {
                    signals.signal(other.index(), Gradient::default());
                }
            }
            Role::Validate | Role::Predict => {}
        }
    }
}
