use crate::engine::{Engine, Signals, VertexProgram};
use crate::graph::VertexIndex;
use crate::prelude::*;

impl<'g, P: VertexProgram> Engine<'g, P> {
    /// Processes activations in signal order until the queue is empty.
    ///
    /// Aggregators are checked once per sweep, that is every `num_vertices` updates.
    pub(super) fn run_asynchronous(&mut self) -> usize {
        let sweep_size = self.graph.num_vertices().max(1);
        let mut n_sweeps = 0;
        let mut n_updates_in_sweep = 0;
        while let Some(index) = self.queue.pop_front() {
            self.update(index);
            n_updates_in_sweep += 1;
            if n_updates_in_sweep == sweep_size {
                n_sweeps += 1;
                n_updates_in_sweep = 0;
                debug!(n_sweeps, n_scheduled = self.queue.len(), "sweep finished");
                self.aggregate_periodic();
            }
        }
        n_sweeps + usize::from(n_updates_in_sweep != 0)
    }

    fn update(&mut self, index: VertexIndex) {
        let context = self.context;
        let message = self.pending.remove(&index).unwrap_or_default();
        let mut signals = Signals::default();

        let (mut program, sum) =
            Self::init_and_gather(context, self.graph.vertex(index), message, &mut signals);
        program.apply(context, self.graph.vertex_mut(index), sum);
        self.n_updates += 1;
        Self::scatter(&program, context, self.graph.vertex(index), &mut signals);

        // The message has been consumed, so new signals schedule another activation.
        self.deliver(signals);
    }
}
