//! Redraw notifications toward an external renderer.
//!
//! The core never draws anything; events report which cells, units and
//! fires changed and a sink decides what to do with that. Headless runs
//! use [`NullSink`].

use crate::grid::Coord;
use crate::units::UnitId;
use crate::world::FireId;

/// Receiver for redraw notifications emitted during event execution.
pub trait RenderSink {
    /// A cell's appearance changed (a unit left it, a fire went out).
    fn redraw_cell(&mut self, _cell: Coord) {}

    /// A unit moved or changed state.
    fn redraw_unit(&mut self, _unit: UnitId) {}

    /// A fire appeared or changed.
    fn redraw_fire(&mut self, _fire: FireId) {}
}

/// Sink that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {}
