//! Periodic error reports and the learning rate annealing.

use std::num::NonZeroUsize;

use crate::engine::{EdgeAggregator, ProgramEdge};
use crate::prelude::*;
use crate::tracing::format_elapsed;
use crate::trainer::context::RunContext;
use crate::trainer::loss::{ErrorAggregate, LossPair};
use crate::trainer::program::BiasSgd;

/// Name under which the monitor is registered in the engine.
pub const AGGREGATOR_NAME: &str = "error";

pub struct ConvergenceMonitor {
    /// Number of aggregations finished so far.
    n_calls: usize,

    /// Only every `cadence`-th aggregation is reported, starting with the first one.
    cadence: NonZeroUsize,

    start_instant: Instant,
}

impl ConvergenceMonitor {
    pub fn new(cadence: NonZeroUsize) -> Self {
        Self {
            n_calls: 0,
            cadence,
            start_instant: Instant::now(),
        }
    }

    pub fn aggregate(context: &RunContext, edge: ProgramEdge<'_, BiasSgd>) -> ErrorAggregate {
        ErrorAggregate::from_edge(&context.hyperparameters, edge)
    }

    /// Reports the errors and decays the learning rate, if it is the reporting call.
    pub fn report(&mut self, context: &RunContext, aggregate: &ErrorAggregate) -> Option<LossPair> {
        self.n_calls += 1;
        if (self.n_calls - 1) % self.cadence.get() != 0 {
            return None;
        }

        assert_ne!(aggregate.train.count(), 0, "there are no training edges");
        let losses = aggregate.finalise();
        let learning_rate = context
            .learning_rate
            .decay(context.hyperparameters.learning_rate_decay);
        info!(
            elapsed = format_elapsed(self.start_instant).as_str(),
            train_rmse = losses.train,
            validation_rmse = losses.validation,
            learning_rate,
            "error report",
        );
        Some(losses)
    }
}

impl EdgeAggregator<BiasSgd> for ConvergenceMonitor {
    type Value = ErrorAggregate;

    fn map(&self, context: &RunContext, edge: ProgramEdge<'_, BiasSgd>) -> ErrorAggregate {
        Self::aggregate(context, edge)
    }

    fn finalize(&mut self, context: &RunContext, value: ErrorAggregate) {
        self.report(context, &value);
    }
}
