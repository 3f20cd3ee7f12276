//! Local gather-apply-scatter engine.
//!
//! The engine owns the activation schedule: it instantiates one vertex program
//! per activation, hands it the combined pending message via `init`, folds the
//! `gather` results over the requested edges, lets `apply` mutate the vertex,
//! and finally calls `scatter`. Signals sent by `gather` or `scatter` schedule
//! future activations. Messages addressed to the same vertex are combined and
//! consumed exactly once, by that vertex's next activation.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};
use std::ops::AddAssign;

use crate::graph::{Edge, EdgeDirection, Graph, Vertex, VertexIndex, VertexMut};
use crate::helpers::periodic::Periodic;
use crate::prelude::*;
use crate::tracing::format_duration;

pub use self::aggregator::EdgeAggregator;
use self::aggregator::PeriodicAggregator;

pub mod aggregator;
mod asynchronous;
mod synchronous;

pub type ProgramGraph<P> =
    Graph<<P as VertexProgram>::VertexData, <P as VertexProgram>::EdgeData>;
pub type ProgramVertex<'a, P> =
    Vertex<'a, <P as VertexProgram>::VertexData, <P as VertexProgram>::EdgeData>;
pub type ProgramEdge<'a, P> =
    Edge<'a, <P as VertexProgram>::VertexData, <P as VertexProgram>::EdgeData>;

/// Vertex-centric callbacks invoked by the engine.
///
/// A fresh instance is created for every activation, so per-activation state
/// (such as a message buffered by `init`) lives in the program itself.
pub trait VertexProgram: Default {
    type VertexData;
    type EdgeData;

    /// Partial result of `gather`, combined across the gathered edges.
    type Gather: Default + AddAssign;

    /// Payload of a signal, combined when several signals target one vertex.
    type Message: Default + AddAssign;

    /// Shared run context passed into every callback.
    type Context;

    fn gather_edges(
        &self,
        _context: &Self::Context,
        _vertex: ProgramVertex<'_, Self>,
    ) -> EdgeDirection {
        EdgeDirection::All
    }

    fn gather(
        &self,
        context: &Self::Context,
        vertex: ProgramVertex<'_, Self>,
        edge: ProgramEdge<'_, Self>,
    ) -> Gathered<Self::Gather, Self::Message>;

    fn init(
        &mut self,
        context: &Self::Context,
        vertex: ProgramVertex<'_, Self>,
        message: Self::Message,
    );

    fn apply(
        &mut self,
        context: &Self::Context,
        vertex: VertexMut<'_, Self::VertexData>,
        sum: Self::Gather,
    );

    fn scatter_edges(
        &self,
        _context: &Self::Context,
        _vertex: ProgramVertex<'_, Self>,
    ) -> EdgeDirection {
        EdgeDirection::All
    }

    fn scatter(
        &self,
        context: &Self::Context,
        vertex: ProgramVertex<'_, Self>,
        edge: ProgramEdge<'_, Self>,
        signals: &mut Signals<Self::Message>,
    );
}

/// Request to activate `target`, carrying `message` into its next `init`.
#[derive(Debug, PartialEq)]
pub struct Signal<M> {
    pub target: VertexIndex,
    pub message: M,
}

/// Result of a single `gather` call: the vertex's own contribution and an optional
/// signal to another vertex.
#[derive(Debug, PartialEq)]
pub struct Gathered<G, M> {
    pub gather: G,
    pub signal: Option<Signal<M>>,
}

impl<G, M> Gathered<G, M> {
    pub const fn local(gather: G) -> Self {
        Self {
            gather,
            signal: None,
        }
    }

    pub const fn with_signal(gather: G, target: VertexIndex, message: M) -> Self {
        Self {
            gather,
            signal: Some(Signal { target, message }),
        }
    }
}

/// Signals collected during a callback, delivered by the engine afterwards.
pub struct Signals<M>(Vec<Signal<M>>);

impl<M> Default for Signals<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<M> Signals<M> {
    pub fn signal(&mut self, target: VertexIndex, message: M) {
        self.0.push(Signal { target, message });
    }

    pub fn push(&mut self, signal: Signal<M>) {
        self.0.push(signal);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutionMode {
    /// Rounds separated by barriers, signals are visible in the next round.
    Synchronous,

    /// Activations are processed one by one in signal order.
    Asynchronous,
}

#[derive(Debug, Copy, Clone)]
pub struct RunStats {
    pub n_updates: usize,
    pub n_rounds: usize,
    pub elapsed: StdDuration,
}

impl RunStats {
    pub fn update_rate(&self) -> f64 {
        self.n_updates as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }
}

pub struct Engine<'g, P: VertexProgram> {
    graph: &'g mut ProgramGraph<P>,
    context: &'g P::Context,
    mode: ExecutionMode,

    /// Combined messages of the scheduled activations.
    pending: BTreeMap<VertexIndex, P::Message>,

    /// Activation order in the asynchronous mode.
    queue: VecDeque<VertexIndex>,

    aggregators: Vec<PeriodicAggregator<P>>,
    n_updates: usize,
}

impl<'g, P: VertexProgram> Engine<'g, P> {
    pub fn new(
        graph: &'g mut ProgramGraph<P>,
        context: &'g P::Context,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            graph,
            context,
            mode,
            pending: BTreeMap::new(),
            queue: VecDeque::new(),
            aggregators: Vec::new(),
            n_updates: 0,
        }
    }

    /// Registers an aggregator to be run periodically while the engine is running.
    pub fn add_edge_aggregator<A>(
        &mut self,
        name: &'static str,
        aggregator: A,
        interval: StdDuration,
    ) -> Result
    where
        A: EdgeAggregator<P> + 'static,
    {
        if self.aggregators.iter().any(|entry| entry.name == name) {
            bail!("aggregator `{}` is already registered", name);
        }
        self.aggregators.push(PeriodicAggregator {
            name,
            aggregator: Box::new(aggregator),
            periodic: Periodic::new(interval),
        });
        Ok(())
    }

    /// Runs the named aggregator right away.
    #[instrument(level = "debug", skip(self))]
    pub fn aggregate_now(&mut self, name: &str) -> Result {
        let entry = self
            .aggregators
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| anyhow!("aggregator `{}` is not registered", name))?;
        entry.aggregator.aggregate(self.graph, self.context);
        Ok(())
    }

    /// Runs the aggregators whose interval has elapsed.
    fn aggregate_periodic(&mut self) {
        for entry in &mut self.aggregators {
            if entry.periodic.should_trigger() {
                debug!(
                    name = entry.name,
                    n_triggered = entry.periodic.n_triggered(),
                    "aggregating…",
                );
                entry.aggregator.aggregate(self.graph, self.context);
            }
        }
    }

    /// Schedules the activation of `target`.
    pub fn signal(&mut self, target: VertexIndex, message: P::Message) {
        match self.pending.entry(target) {
            Entry::Vacant(entry) => {
                entry.insert(message);
                if self.mode == ExecutionMode::Asynchronous {
                    self.queue.push_back(target);
                }
            }
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += message;
            }
        }
    }

    fn deliver(&mut self, signals: Signals<P::Message>) {
        for Signal { target, message } in signals.0 {
            self.signal(target, message);
        }
    }

    /// Lets `signal` inspect every vertex and schedule activations.
    pub fn signal_vertices(
        &mut self,
        mut signal: impl FnMut(&P::Context, ProgramVertex<'_, P>, &mut Signals<P::Message>),
    ) {
        let mut signals = Signals::default();
        for vertex in self.graph.vertices() {
            signal(self.context, vertex, &mut signals);
        }
        debug!(n_signals = signals.len(), "signalled");
        self.deliver(signals);
    }

    pub fn num_scheduled(&self) -> usize {
        self.pending.len()
    }

    /// Runs until no vertex is scheduled.
    #[instrument(
        level = "info",
        skip_all,
        fields(mode = ?self.mode, n_scheduled = self.pending.len()),
    )]
    pub fn start(&mut self) -> RunStats {
        let start_instant = Instant::now();
        let n_updates = self.n_updates;
        let n_rounds = match self.mode {
            ExecutionMode::Synchronous => self.run_synchronous(),
            ExecutionMode::Asynchronous => self.run_asynchronous(),
        };
        let stats = RunStats {
            n_updates: self.n_updates - n_updates,
            n_rounds,
            elapsed: start_instant.elapsed(),
        };
        info!(
            n_updates = stats.n_updates,
            n_rounds = stats.n_rounds,
            elapsed = format_duration(stats.elapsed).as_str(),
            "finished",
        );
        stats
    }

    /// Runs `init` and folds `gather` for a single activation.
    fn init_and_gather(
        context: &P::Context,
        vertex: ProgramVertex<'_, P>,
        message: P::Message,
        signals: &mut Signals<P::Message>,
    ) -> (P, P::Gather) {
        let mut program = P::default();
        program.init(context, vertex, message);
        let mut sum = P::Gather::default();
        for edge in vertex.edges(program.gather_edges(context, vertex)) {
            let Gathered { gather, signal } = program.gather(context, vertex, edge);
            sum += gather;
            if let Some(signal) = signal {
                signals.push(signal);
            }
        }
        (program, sum)
    }

    fn scatter(
        program: &P,
        context: &P::Context,
        vertex: ProgramVertex<'_, P>,
        signals: &mut Signals<P::Message>,
    ) {
        for edge in vertex.edges(program.scatter_edges(context, vertex)) {
            program.scatter(context, vertex, edge, signals);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    /// Counts the activations and forwards a token along the outgoing edges.
    #[derive(Default)]
    struct Relay {
        received: usize,
    }

    impl VertexProgram for Relay {
        type VertexData = usize;
        type EdgeData = ();
        type Gather = usize;
        type Message = usize;
        type Context = usize;

        fn gather(
            &self,
            _: &usize,
            _: ProgramVertex<'_, Self>,
            _: ProgramEdge<'_, Self>,
        ) -> Gathered<usize, usize> {
            Gathered::local(1)
        }

        fn init(&mut self, _: &usize, _: ProgramVertex<'_, Self>, message: usize) {
            self.received = message;
        }

        fn apply(&mut self, _: &usize, vertex: VertexMut<'_, usize>, _: usize) {
            *vertex.data += self.received;
        }

        fn scatter_edges(&self, _: &usize, _: ProgramVertex<'_, Self>) -> EdgeDirection {
            EdgeDirection::Out
        }

        fn scatter(
            &self,
            max_hops: &usize,
            vertex: ProgramVertex<'_, Self>,
            edge: ProgramEdge<'_, Self>,
            signals: &mut Signals<usize>,
        ) {
            if self.received < *max_hops {
                signals.signal(edge.other(&vertex).index(), self.received + 1);
            }
        }
    }

    fn build_chain() -> ProgramGraph<Relay> {
        let mut builder = GraphBuilder::default();
        builder.add_edge(1, 2, ());
        builder.add_edge(2, 3, ());
        builder.add_edge(1, 3, ());
        builder.build(|_| 0)
    }

    fn run(mode: ExecutionMode) -> (RunStats, Vec<usize>) {
        let mut graph = build_chain();
        let context = 10;
        let stats = {
            let mut engine = Engine::<Relay>::new(&mut graph, &context, mode);
            engine.signal(0, 1);
            engine.start()
        };
        (stats, graph.vertices().map(|vertex| *vertex.data()).collect())
    }

    #[test]
    fn synchronous_ok() {
        let (stats, data) = run(ExecutionMode::Synchronous);
        // Round 1: vertex 1. Round 2: vertices 2 and 3. Round 3: vertex 3 again.
        assert_eq!(stats.n_rounds, 3);
        assert_eq!(stats.n_updates, 4);
        assert_eq!(data, [1, 2, 5]);
    }

    #[test]
    fn asynchronous_ok() {
        let (stats, data) = run(ExecutionMode::Asynchronous);
        // Vertex 3 is still queued when vertex 2 signals it, so both tokens arrive at once.
        assert_eq!(stats.n_updates, 3);
        assert_eq!(data, [1, 2, 5]);
    }

    #[test]
    fn messages_are_combined_ok() {
        let mut graph = build_chain();
        let context = 0;
        {
            let mut engine =
                Engine::<Relay>::new(&mut graph, &context, ExecutionMode::Synchronous);
            engine.signal(2, 3);
            engine.signal(2, 4);
            assert_eq!(engine.num_scheduled(), 1);
            assert_eq!(engine.start().n_updates, 1);
        }
        assert_eq!(*graph.vertex(2).data(), 7);
    }

    #[derive(Default)]
    struct EdgeCounter {
        counts: std::rc::Rc<std::cell::RefCell<Vec<usize>>>,
    }

    impl EdgeAggregator<Relay> for EdgeCounter {
        type Value = usize;

        fn map(&self, _: &usize, _: ProgramEdge<'_, Relay>) -> usize {
            1
        }

        fn finalize(&mut self, _: &usize, value: usize) {
            self.counts.borrow_mut().push(value);
        }
    }

    #[test]
    fn aggregators_ok() -> Result {
        let mut graph = build_chain();
        let context = 10;
        let counter = EdgeCounter::default();
        let counts = counter.counts.clone();

        let mut engine = Engine::<Relay>::new(&mut graph, &context, ExecutionMode::Synchronous);
        engine.add_edge_aggregator("edges", counter, StdDuration::ZERO)?;
        assert!(engine
            .add_edge_aggregator("edges", EdgeCounter::default(), StdDuration::ZERO)
            .is_err());
        engine.signal(0, 1);
        engine.start();
        assert_eq!(*counts.borrow(), [3, 3, 3]);

        engine.aggregate_now("edges")?;
        assert_eq!(counts.borrow().len(), 4);
        assert!(engine.aggregate_now("missing").is_err());
        Ok(())
    }
}
