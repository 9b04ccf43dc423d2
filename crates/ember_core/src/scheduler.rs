//! Discrete-event scheduler: the time-bucketed queue and the tick loop.
//!
//! Simulated time is a plain monotonically increasing integer tick
//! counter. Each tick either drains its bucket of events (in enqueue
//! order) and then lets the dispatcher look at the world, or — when no
//! event is due — advances by a single increment. There is deliberately
//! no skip-to-next-event shortcut: timing must stay identical across
//! implementations being compared.

use std::collections::{HashMap, VecDeque};

use crate::dispatcher::{self, DispatchPolicy};
use crate::error::Result;
use crate::event::{Event, EventCtx};
use crate::loader;
use crate::render::RenderSink;
use crate::rng::{SimRng, DEFAULT_SEED};
use crate::world::WorldState;

/// Simulated time, in ticks.
pub type Tick = u64;

/// Pending events, bucketed by the tick they fire on.
///
/// The scheduler owns this exclusively; events reach it only through
/// [`EventQueue::schedule`].
#[derive(Debug, Default)]
pub struct EventQueue {
    buckets: HashMap<Tick, VecDeque<Event>>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event for the given tick.
    ///
    /// A start event claims its unit here, at enqueue time: the unit's
    /// busy flag goes up the moment the chain exists, so one dispatcher
    /// invocation never stacks two chains on the same unit.
    pub fn schedule(&mut self, at: Tick, event: Event, state: &mut WorldState) {
        if let Some(unit) = event.claims_unit() {
            if let Some(u) = state.units.get_mut(unit) {
                u.busy = true;
            }
        }
        self.buckets.entry(at).or_default().push_back(event);
    }

    /// Remove and return the bucket for a tick, if any.
    pub(crate) fn take_bucket(&mut self, tick: Tick) -> Option<VecDeque<Event>> {
        self.buckets.remove(&tick)
    }

    /// The still-enqueued events for a tick, in execution order.
    #[must_use]
    pub fn events_at(&self, tick: Tick) -> Option<&VecDeque<Event>> {
        self.buckets.get(&tick)
    }

    /// Whether any event remains anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of pending events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buckets.values().map(VecDeque::len).sum()
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// Static run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Dispatch policy run after each drained tick; `None` disables the
    /// dispatcher entirely (manually seeded runs).
    pub policy: Option<DispatchPolicy>,
    /// Period of the global fire-spread event; `None` disables spread.
    pub spread_period: Option<Tick>,
    /// Seed for all simulation randomness.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: None,
            spread_period: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimConfig {
    /// Set the dispatch policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Enable periodic fire spread.
    #[must_use]
    pub const fn with_spread_period(mut self, period: Tick) -> Self {
        self.spread_period = Some(period);
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RunOutcome {
    /// Every fire was extinguished.
    AllFiresOut {
        /// Tick the run stopped on.
        tick: Tick,
    },
    /// No events remain but fires still burn (nothing more will happen).
    QueueDrained {
        /// Tick the run stopped on.
        tick: Tick,
    },
    /// The tick limit was hit first.
    TickLimit {
        /// Tick the run stopped on.
        tick: Tick,
    },
}

/// The simulation driver: world state, event queue and clock.
///
/// Construction and [`Simulation::reset`] both load the world from the
/// kept description, run the configured policy's first assignment pass
/// and arm fire spread — so a reset reproduces the identical initial
/// state and the identical first-tick event set.
#[derive(Debug)]
pub struct Simulation {
    /// World description text, kept so `reset` can re-run the loader.
    description: String,
    config: SimConfig,
    state: WorldState,
    queue: EventQueue,
    rng: SimRng,
    tick: Tick,
}

impl Simulation {
    /// Load a world description and seed the initial events.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::WorldParse`] for a malformed
    /// description.
    pub fn new(description: &str, config: SimConfig) -> Result<Self> {
        let state = loader::load_world(description)?;
        let mut sim = Self {
            description: description.to_string(),
            config,
            state,
            queue: EventQueue::new(),
            rng: SimRng::from_seed_u64(config.seed),
            tick: 0,
        };
        sim.seed_initial_events();
        Ok(sim)
    }

    /// First assignment pass plus the first spread event, at tick 0.
    fn seed_initial_events(&mut self) {
        if let Some(policy) = self.config.policy {
            dispatcher::dispatch(policy, &mut self.state, &mut self.queue, self.tick);
        }
        if let Some(period) = self.config.spread_period {
            self.queue
                .schedule(self.tick + period, Event::FireSpread, &mut self.state);
        }
    }

    /// Throw the run away and rebuild it from the original description.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::WorldParse`] if the kept
    /// description no longer parses (it always should).
    pub fn reset(&mut self) -> Result<()> {
        self.state = loader::load_world(&self.description)?;
        self.queue.clear();
        self.rng = SimRng::from_seed_u64(self.config.seed);
        self.tick = 0;
        self.seed_initial_events();
        Ok(())
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// The shared world.
    #[must_use]
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable world access, for drivers that seed scenarios by hand.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// True when no event remains anywhere in the queue.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending events for a tick, in execution order.
    #[must_use]
    pub fn events_at(&self, tick: Tick) -> Option<&VecDeque<Event>> {
        self.queue.events_at(tick)
    }

    /// Enqueue an event. Start events mark their unit busy immediately.
    pub fn enqueue(&mut self, at: Tick, event: Event) {
        self.queue.schedule(at, event, &mut self.state);
    }

    /// Advance the simulation by exactly one tick.
    ///
    /// Drains the current tick's bucket in enqueue order (events that
    /// enqueue at the same tick run within the same drain), invokes the
    /// dispatcher if a bucket was drained, then increments the clock.
    /// Ticks with no bucket advance by a plain increment. Does nothing
    /// once the queue is empty.
    ///
    /// # Errors
    ///
    /// Propagates fatal event failures; the run must not be continued
    /// after an error.
    pub fn step(&mut self, render: &mut dyn RenderSink) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }

        let Some(mut bucket) = self.queue.take_bucket(self.tick) else {
            self.tick += 1;
            return Ok(());
        };

        let mut executed = 0_usize;
        let mut spread_ran = false;
        loop {
            while let Some(event) = bucket.pop_front() {
                spread_ran |= matches!(event, Event::FireSpread);
                let mut ctx = EventCtx {
                    state: &mut self.state,
                    queue: &mut self.queue,
                    rng: &mut self.rng,
                    render: &mut *render,
                };
                event.execute(self.tick, &mut ctx)?;
                executed += 1;
            }
            // Events enqueued for this same tick during the drain run
            // before the tick closes.
            match self.queue.take_bucket(self.tick) {
                Some(more) => bucket = more,
                None => break,
            }
        }
        tracing::trace!(tick = self.tick, executed, "tick drained");

        if spread_ran {
            self.rearm_spread();
        }
        if let Some(policy) = self.config.policy {
            dispatcher::dispatch(policy, &mut self.state, &mut self.queue, self.tick);
        }
        self.tick += 1;
        Ok(())
    }

    /// Schedule the next periodic spread event while fires remain.
    fn rearm_spread(&mut self) {
        if let Some(period) = self.config.spread_period {
            if self.state.has_active_fires() {
                self.queue
                    .schedule(self.tick + period, Event::FireSpread, &mut self.state);
            }
        }
    }

    /// Step until every fire is out, the queue drains, or `max_ticks`.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal event failure.
    pub fn run_to_completion(
        &mut self,
        render: &mut dyn RenderSink,
        max_ticks: Tick,
    ) -> Result<RunOutcome> {
        while self.tick < max_ticks {
            if !self.state.has_active_fires() {
                return Ok(RunOutcome::AllFiresOut { tick: self.tick });
            }
            if self.is_finished() {
                return Ok(RunOutcome::QueueDrained { tick: self.tick });
            }
            self.step(render)?;
        }
        Ok(RunOutcome::TickLimit { tick: self.tick })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Coord, Direction};
    use crate::render::NullSink;

    const LINE_MAP: &str = "\
1 5 100
OPEN OPEN OPEN OPEN OPEN
1
0 4 150
1
0 0 WHEELED
";

    #[test]
    fn test_empty_ticks_are_plain_increments() {
        let mut sim = Simulation::new(LINE_MAP, SimConfig::default()).unwrap();
        sim.enqueue(
            3,
            Event::StartMove {
                unit: 0,
                direction: Some(Direction::East),
                after: None,
            },
        );
        let mut sink = NullSink;

        sim.step(&mut sink).unwrap();
        assert_eq!(sim.tick(), 1);
        sim.step(&mut sink).unwrap();
        sim.step(&mut sink).unwrap();
        assert_eq!(sim.tick(), 3);
        assert_eq!(sim.state().units[0].position, Coord::new(0, 0));

        // Tick 3 has the bucket; the move chain begins here.
        sim.step(&mut sink).unwrap();
        assert_eq!(sim.tick(), 4);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_step_is_noop_when_finished() {
        let mut sim = Simulation::new(LINE_MAP, SimConfig::default()).unwrap();
        assert!(sim.is_finished());
        let mut sink = NullSink;
        sim.step(&mut sink).unwrap();
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_initial_dispatch_seeds_first_tick() {
        let sim = Simulation::new(
            LINE_MAP,
            SimConfig::default().with_policy(DispatchPolicy::Simple),
        )
        .unwrap();

        assert!(!sim.is_finished());
        assert!(sim.state().fires[0].assigned);
        assert!(sim.state().units[0].busy);
        let first = sim.events_at(1).unwrap();
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_run_extinguishes_single_fire() {
        let mut sim = Simulation::new(
            LINE_MAP,
            SimConfig::default().with_policy(DispatchPolicy::Simple),
        )
        .unwrap();
        let mut sink = NullSink;

        let outcome = sim.run_to_completion(&mut sink, 10_000).unwrap();
        assert!(matches!(outcome, RunOutcome::AllFiresOut { .. }));
        assert!(sim.state().fires.is_empty());
        // 150 demand costs the wheeled unit two 100 L passes.
        assert_eq!(sim.state().units[0].volume, 4_800);
        assert!(!sim.state().units[0].busy);
    }

    #[test]
    fn test_reset_reproduces_initial_state_and_events() {
        let mut sim = Simulation::new(
            LINE_MAP,
            SimConfig::default().with_policy(DispatchPolicy::Simple),
        )
        .unwrap();
        let initial_snapshot = sim.state().snapshot().unwrap();
        let initial_events = sim.events_at(1).unwrap().clone();

        let mut sink = NullSink;
        sim.run_to_completion(&mut sink, 10_000).unwrap();
        assert!(sim.state().fires.is_empty());

        sim.reset().unwrap();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.state().snapshot().unwrap(), initial_snapshot);
        assert_eq!(sim.events_at(1).unwrap(), &initial_events);
    }

    #[test]
    fn test_queue_drained_outcome_without_policy() {
        let mut sim = Simulation::new(LINE_MAP, SimConfig::default()).unwrap();
        let mut sink = NullSink;

        // No policy, no events: fires remain but nothing will happen.
        let outcome = sim.run_to_completion(&mut sink, 100).unwrap();
        assert!(matches!(outcome, RunOutcome::QueueDrained { tick: 0 }));
        assert!(sim.state().has_active_fires());
    }

    #[test]
    fn test_spread_rearms_while_fires_burn() {
        const BIG_FIRE_MAP: &str = "\
1 3 100
OPEN OPEN OPEN
1
0 2 20000
0
";
        let mut sim = Simulation::new(
            BIG_FIRE_MAP,
            SimConfig::default().with_spread_period(5).with_seed(9),
        )
        .unwrap();
        let mut sink = NullSink;

        assert_eq!(sim.events_at(5).unwrap().len(), 1);
        for _ in 0..6 {
            sim.step(&mut sink).unwrap();
        }
        // The tick-5 spread event re-armed itself for tick 10.
        assert_eq!(sim.events_at(10).unwrap().len(), 1);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_fatal_event_aborts_run() {
        let mut sim = Simulation::new(LINE_MAP, SimConfig::default()).unwrap();
        sim.enqueue(
            0,
            Event::StartMove {
                unit: 0,
                direction: Some(Direction::North),
                after: None,
            },
        );
        let mut sink = NullSink;
        assert!(sim.step(&mut sink).is_err());
    }
}
