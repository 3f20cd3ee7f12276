use std::mem::take;

use crate::engine::{Engine, Signals, VertexProgram};
use crate::prelude::*;

impl<'g, P: VertexProgram> Engine<'g, P> {
    /// Runs barrier-separated rounds until nothing is scheduled, returns the number of rounds.
    pub(super) fn run_synchronous(&mut self) -> usize {
        let mut n_rounds = 0;
        while !self.pending.is_empty() {
            n_rounds += 1;
            let n_active = self.pending.len();
            let signals = self.run_round();
            debug!(n_rounds, n_active, n_signals = signals.len(), "round finished");

            // Signals of this round are only visible in the next one.
            self.deliver(signals);
            self.aggregate_periodic();
        }
        n_rounds
    }

    fn run_round(&mut self) -> Signals<P::Message> {
        let context = self.context;
        let active = take(&mut self.pending);
        let mut signals = Signals::default();

        // All gathers observe the state left by the previous round.
        let gathered: Vec<_> = active
            .into_iter()
            .map(|(index, message)| {
                let vertex = self.graph.vertex(index);
                let (program, sum) = Self::init_and_gather(context, vertex, message, &mut signals);
                (index, program, sum)
            })
            .collect();

        let programs: Vec<_> = gathered
            .into_iter()
            .map(|(index, mut program, sum)| {
                program.apply(context, self.graph.vertex_mut(index), sum);
                (index, program)
            })
            .collect();
        self.n_updates += programs.len();

        for (index, program) in &programs {
            Self::scatter(program, context, self.graph.vertex(*index), &mut signals);
        }
        signals
    }
}
