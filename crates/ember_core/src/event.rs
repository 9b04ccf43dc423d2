//! The event catalog: timestamped actions driving the state machine.
//!
//! Events are a closed tagged variant consumed by the scheduler loop.
//! Executing an event may mutate the world, notify the renderer and
//! enqueue follow-up events at the current tick or later — never
//! earlier. Events reference units and fires by id; they own nothing.

use crate::dispatcher;
use crate::error::{Result, SimError};
use crate::grid::{Coord, Direction};
use crate::render::RenderSink;
use crate::rng::SimRng;
use crate::scheduler::{EventQueue, Tick};
use crate::units::UnitId;
use crate::world::{FireId, WorldState};

/// Demand above which a fire is large enough to spread.
const SPREAD_DEMAND_THRESHOLD: u32 = 1000;

/// One-in-N chance for a qualifying fire to spread per spread event.
const SPREAD_CHANCE: u32 = 1000;

/// Action chained after a path-following move completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMove {
    /// Start intervening on the fire at the arrival cell.
    Intervene,
    /// Start refilling the tank.
    Refill,
}

/// How a start-intervention event names its fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTarget {
    /// A fire known by id.
    Known(FireId),
    /// A cell, resolved to the first fire burning there at execution.
    At(Coord),
}

/// A scheduled action. The timestamp lives in the scheduler's bucket
/// key; the payload here is immutable once enqueued.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Begin a move: either one explicit step, or the unit's whole
    /// queued path, optionally chaining a follow-up action.
    StartMove {
        /// The moving unit.
        unit: UnitId,
        /// Single step to take; `None` consumes the unit's queued path.
        direction: Option<Direction>,
        /// Action to schedule once the move chain completes.
        after: Option<PostMove>,
    },
    /// Arrival of one movement step.
    EndMove {
        /// The moving unit.
        unit: UnitId,
        /// Cell the unit lands on.
        destination: Coord,
    },
    /// Begin an intervention pass on a fire.
    StartIntervene {
        /// The intervening unit.
        unit: UnitId,
        /// The fire being attacked.
        target: FireTarget,
    },
    /// Completion of one intervention pass.
    EndIntervene {
        /// The intervening unit.
        unit: UnitId,
        /// The fire being attacked.
        fire: FireId,
    },
    /// Begin refilling the tank.
    StartRefill {
        /// The refilling unit.
        unit: UnitId,
    },
    /// Completion of a refill.
    EndRefill {
        /// The refilling unit.
        unit: UnitId,
    },
    /// Global periodic fire propagation check.
    FireSpread,
}

/// Mutable context handed to event execution by the scheduler.
pub(crate) struct EventCtx<'a> {
    /// The shared world.
    pub state: &'a mut WorldState,
    /// The scheduler's queue, for follow-up events.
    pub queue: &'a mut EventQueue,
    /// Seeded randomness for fire spread.
    pub rng: &'a mut SimRng,
    /// Redraw notification sink.
    pub render: &'a mut dyn RenderSink,
}

impl Event {
    /// The unit a start event claims when it is enqueued.
    ///
    /// The scheduler marks that unit busy at enqueue time, so a unit is
    /// busy from the moment a chain targeting it exists.
    #[must_use]
    pub fn claims_unit(&self) -> Option<UnitId> {
        match *self {
            Self::StartMove { unit, .. }
            | Self::StartIntervene { unit, .. }
            | Self::StartRefill { unit } => Some(unit),
            _ => None,
        }
    }

    /// Execute the event at tick `now`.
    ///
    /// # Errors
    ///
    /// Fatal conditions (a path walking off the grid, a refill away from
    /// water, an intervention aimed at a fireless cell) abort the run.
    pub(crate) fn execute(self, now: Tick, ctx: &mut EventCtx<'_>) -> Result<()> {
        match self {
            Self::StartMove {
                unit,
                direction,
                after,
            } => match direction {
                Some(dir) => start_single_move(ctx, now, unit, dir, after),
                None => start_path_move(ctx, now, unit, after),
            },
            Self::EndMove { unit, destination } => end_move(ctx, unit, destination),
            Self::StartIntervene { unit, target } => start_intervene(ctx, now, unit, target),
            Self::EndIntervene { unit, fire } => end_intervene(ctx, now, unit, fire),
            Self::StartRefill { unit } => start_refill(ctx, now, unit),
            Self::EndRefill { unit } => end_refill(ctx, unit),
            Self::FireSpread => fire_spread(ctx),
        }
    }
}

/// Schedule the requested post-move action.
fn schedule_post(ctx: &mut EventCtx<'_>, at: Tick, action: PostMove, unit: UnitId, cell: Coord) {
    let event = match action {
        PostMove::Intervene => Event::StartIntervene {
            unit,
            target: FireTarget::At(cell),
        },
        PostMove::Refill => Event::StartRefill { unit },
    };
    ctx.queue.schedule(at, event, ctx.state);
}

/// One explicit step in a given direction.
fn start_single_move(
    ctx: &mut EventCtx<'_>,
    now: Tick,
    unit: UnitId,
    dir: Direction,
    after: Option<PostMove>,
) -> Result<()> {
    let position = ctx.state.unit(unit)?.position;
    let secs = ctx.state.unit(unit)?.traverse_secs(&ctx.state.grid, position)?;
    let destination = ctx
        .state
        .grid
        .neighbor(position, dir)
        .ok_or(SimError::UnitLeftGrid { unit })?;

    let arrival = now + secs.round() as Tick + 1;
    ctx.queue
        .schedule(arrival, Event::EndMove { unit, destination }, ctx.state);
    if let Some(action) = after {
        schedule_post(ctx, now + secs.round() as Tick + 2, action, unit, destination);
    }
    Ok(())
}

/// Consume the unit's queued path, scheduling one arrival per step.
fn start_path_move(
    ctx: &mut EventCtx<'_>,
    now: Tick,
    unit: UnitId,
    after: Option<PostMove>,
) -> Result<()> {
    let path: Vec<Direction> = std::mem::take(&mut ctx.state.unit_mut(unit)?.pending_path)
        .into_iter()
        .collect();
    let start = ctx.state.unit(unit)?.position;

    if path.is_empty() {
        // Nothing to walk: hand over to the follow-up one tick later.
        if let Some(action) = after {
            schedule_post(ctx, now + 1, action, unit, start);
        }
        return Ok(());
    }

    // Every leg is timed at the speed of the cell the unit occupies when
    // the chain is scheduled; the cursor only produces arrival cells.
    let step_secs = ctx.state.unit(unit)?.traverse_secs(&ctx.state.grid, start)?;
    let mut cursor = start;
    let mut elapsed = 0.0_f64;
    for step in path {
        cursor = ctx
            .state
            .grid
            .neighbor(cursor, step)
            .ok_or(SimError::UnitLeftGrid { unit })?;
        elapsed += step_secs;
        ctx.queue.schedule(
            now + elapsed.round() as Tick + 1,
            Event::EndMove {
                unit,
                destination: cursor,
            },
            ctx.state,
        );
    }
    if let Some(action) = after {
        schedule_post(ctx, now + elapsed.round() as Tick + 2, action, unit, cursor);
    }
    Ok(())
}

/// Land a unit on its destination cell.
fn end_move(ctx: &mut EventCtx<'_>, unit: UnitId, destination: Coord) -> Result<()> {
    let (old, kind) = {
        let u = ctx.state.unit_mut(unit)?;
        u.busy = false;
        (u.position, u.kind())
    };

    let terrain = ctx.state.grid.terrain(destination).ok_or_else(|| {
        SimError::InvalidState(format!("move destination {destination} outside the grid"))
    })?;
    if !kind.accessible(terrain) {
        return Err(SimError::CapabilityViolation(format!(
            "{kind} unit cannot stand on {terrain} at {destination}"
        )));
    }
    ctx.state.unit_mut(unit)?.position = destination;

    ctx.render.redraw_cell(old);
    if let Some(fire) = ctx.state.fire_at(old) {
        ctx.render.redraw_fire(fire);
    }
    ctx.render.redraw_unit(unit);
    Ok(())
}

/// Resolve the targeted fire and schedule the intervention's completion.
fn start_intervene(
    ctx: &mut EventCtx<'_>,
    now: Tick,
    unit: UnitId,
    target: FireTarget,
) -> Result<()> {
    let fire = match target {
        FireTarget::Known(id) => id,
        FireTarget::At(cell) => ctx.state.fire_at(cell).ok_or(SimError::NoFireAt {
            row: cell.row,
            col: cell.col,
        })?,
    };
    let duration = ctx.state.unit(unit)?.kind().intervention_duration();
    ctx.queue
        .schedule(now + duration, Event::EndIntervene { unit, fire }, ctx.state);
    Ok(())
}

/// Apply one intervention pass and decide what the unit does next.
fn end_intervene(ctx: &mut EventCtx<'_>, now: Tick, unit: UnitId, fire: FireId) -> Result<()> {
    {
        let state = &mut *ctx.state;
        let u = state
            .units
            .get_mut(unit)
            .ok_or_else(|| SimError::InvalidState(format!("unknown unit id {unit}")))?;
        match state.fires.iter_mut().find(|f| f.id == fire) {
            Some(f) => u.intervene(f),
            // The fire went out under someone else's pass while this one
            // was in flight; the tank still drains.
            None => u.spend_intervention_water(),
        }
    }

    let extinguished = ctx.state.fire(fire).map_or(true, |f| f.remaining == 0);
    if extinguished {
        ctx.state.unit_mut(unit)?.busy = false;
        if let Some(f) = ctx.state.fire_mut(fire) {
            f.assigned = false;
        }
        if let Some(removed) = ctx.state.remove_fire(fire) {
            tracing::debug!(%fire, cell = %removed.position, "fire extinguished");
            ctx.render.redraw_cell(removed.position);
            ctx.render.redraw_unit(unit);
        }
    } else if ctx.state.unit(unit)?.volume > 0 {
        // Keep attacking the same fire.
        ctx.queue.schedule(
            now + 1,
            Event::StartIntervene {
                unit,
                target: FireTarget::Known(fire),
            },
            ctx.state,
        );
    }

    // An empty tank sends the unit to the nearest water source, whether
    // or not the fire survived.
    if ctx.state.unit(unit)?.volume == 0 {
        if let Some(f) = ctx.state.fire_mut(fire) {
            f.assigned = false;
        }
        let route = dispatcher::nearest_water(ctx.state, unit);
        ctx.state.unit_mut(unit)?.pending_path = route.into();
        ctx.queue.schedule(
            now + 1,
            Event::StartMove {
                unit,
                direction: None,
                after: Some(PostMove::Refill),
            },
            ctx.state,
        );
    }
    Ok(())
}

/// Schedule the refill's completion.
fn start_refill(ctx: &mut EventCtx<'_>, now: Tick, unit: UnitId) -> Result<()> {
    let duration = ctx.state.unit(unit)?.kind().refill_duration();
    ctx.queue
        .schedule(now + duration, Event::EndRefill { unit }, ctx.state);
    Ok(())
}

/// Fill the tank and release the unit.
fn end_refill(ctx: &mut EventCtx<'_>, unit: UnitId) -> Result<()> {
    let state = &mut *ctx.state;
    let u = state
        .units
        .get_mut(unit)
        .ok_or_else(|| SimError::InvalidState(format!("unknown unit id {unit}")))?;
    u.refill(&state.grid)?;
    u.busy = false;
    Ok(())
}

/// Let every large fire try to spread to a random neighbor cell.
fn fire_spread(ctx: &mut EventCtx<'_>) -> Result<()> {
    let mut spawned: Vec<(Coord, u32)> = Vec::new();
    for fire in &ctx.state.fires {
        if fire.remaining > SPREAD_DEMAND_THRESHOLD && ctx.rng.one_in(SPREAD_CHANCE) {
            let dir = ctx.rng.direction();
            if let Some(cell) = ctx.state.grid.neighbor(fire.position, dir) {
                // No check for an existing fire on the cell: duplicate
                // fires per cell are allowed.
                spawned.push((cell, fire.remaining / 10));
            }
        }
    }
    // Fires born this pass do not themselves spread until the next one.
    for (cell, demand) in spawned {
        let id = ctx.state.spawn_fire(cell, demand);
        tracing::debug!(%id, cell = %cell, demand, "fire spread");
        ctx.render.redraw_fire(id);
    }
    Ok(())
}
