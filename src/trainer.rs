//! Trains the row and column factors of a sparse matrix.
//! Implements a biased stochastic gradient descent for matrix factorization
//! on top of the gather-apply-scatter engine.
//!
//! https://sifter.org/~simon/journal/20061211.html

use std::num::NonZeroUsize;

use human_repr::HumanCount;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::{Engine, ExecutionMode, ProgramGraph, RunStats};
use crate::graph::GraphStatistics;
use crate::helpers::average::Average;
use crate::opts::TrainerOpts;
use crate::prelude::*;
use crate::tracing::format_duration;
use crate::trainer::context::{Hyperparameters, RunContext};
use crate::trainer::loss::LossPair;
use crate::trainer::model::{Role, VertexData};
use crate::trainer::monitor::{ConvergenceMonitor, AGGREGATOR_NAME};
use crate::trainer::program::BiasSgd;

pub mod context;
pub mod gradient;
pub mod learning_rate;
pub mod loader;
pub mod loss;
pub mod math;
pub mod model;
pub mod monitor;
pub mod program;
pub mod saver;

#[instrument(skip_all)]
pub async fn run(opts: TrainerOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "trainer"));

    let builder = loader::load(&opts.matrix, opts.remap_target).await?;
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let n_factors = opts.n_factors;
    let mut graph = builder.build(|_| {
        if opts.debug {
            VertexData::ones(n_factors)
        } else {
            VertexData::random(n_factors, &mut rng)
        }
    });
    check_statistics(&graph.statistics())?;

    let global_mean = calculate_global_mean(&graph)?;
    let context = RunContext::new(Hyperparameters {
        regularization: opts.lambda,
        initial_learning_rate: opts.gamma,
        learning_rate_decay: opts.step_dec,
        min_value: opts.min_value,
        max_value: opts.max_value,
        max_updates: opts.max_updates,
        global_mean,
    });

    train(&mut graph, &context, opts.engine, opts.interval, opts.report_cadence)?;

    if let Some(path) = &opts.predictions {
        saver::save_predictions(&graph, &context.hyperparameters, opts.remap_target, path).await?;
    }
    if let Some(path) = &opts.factors {
        saver::save_factors(&graph, path).await?;
    }
    Ok(())
}

/// Seeds the rows and runs the engine until every vertex has exhausted its update budget.
#[instrument(skip_all, fields(mode = ?mode))]
pub fn train(
    graph: &mut ProgramGraph<BiasSgd>,
    context: &RunContext,
    mode: ExecutionMode,
    report_interval: StdDuration,
    report_cadence: NonZeroUsize,
) -> Result<RunStats> {
    let stats = {
        let mut engine = Engine::<BiasSgd>::new(graph, context, mode);
        engine.add_edge_aggregator(
            AGGREGATOR_NAME,
            ConvergenceMonitor::new(report_cadence),
            report_interval,
        )?;
        engine.signal_vertices(BiasSgd::signal_left);

        info!(n_scheduled = engine.num_scheduled(), "running Bias-SGD…");
        let stats = engine.start();
        info!(
            runtime = format_duration(stats.elapsed).as_str(),
            n_updates = stats.n_updates,
            update_rate = %stats.update_rate().human_count("updates/s"),
            "trained",
        );

        engine.aggregate_now(AGGREGATOR_NAME)?;
        stats
    };

    let n_exhausted = graph.map_reduce_vertices(|vertex| {
        usize::from(!context.hyperparameters.has_budget(vertex.data().n_updates))
    });
    let losses = evaluate(graph, context);
    let learning_rate = context.learning_rate.get();
    info!(
        n_exhausted,
        train_rmse = losses.train,
        validation_rmse = losses.validation,
        learning_rate,
        "final error",
    );
    Ok(stats)
}

/// Calculates the errors of the current vertex state.
pub fn evaluate(graph: &ProgramGraph<BiasSgd>, context: &RunContext) -> LossPair {
    graph
        .map_reduce_edges(|edge| ConvergenceMonitor::aggregate(context, edge))
        .finalise()
}

/// Calculates the mean over the training edges.
fn calculate_global_mean(graph: &ProgramGraph<BiasSgd>) -> Result<f64> {
    let average = graph.map_reduce_edges(|edge| {
        let data = edge.data();
        match data.role {
            Role::Train => Average::from(data.value),
            Role::Validate | Role::Predict => Average::default(),
        }
    });
    let global_mean = average
        .average()
        .ok_or_else(|| anyhow!("there are no training edges"))?;
    info!(global_mean, n_train = average.count(), "calculated the global mean");
    Ok(global_mean)
}

/// Logs the statistics and rejects a graph which is not bipartite.
fn check_statistics(statistics: &GraphStatistics) -> Result {
    info!(
        n_vertices = statistics.n_vertices,
        n_edges = statistics.n_edges,
        n_left = statistics.n_left,
        n_right = statistics.n_right,
        "graph statistics",
    );
    if statistics.n_mixed != 0 {
        bail!(
            "{} vertices have both incoming and outgoing edges, consider `--remap-target`",
            statistics.n_mixed,
        );
    }
    Ok(())
}
