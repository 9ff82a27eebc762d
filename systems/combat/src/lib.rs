#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits strike commands for units in attack position.

use gridlock_core::{Command, UnitState, UnitView};

/// Combat system that queues strikes for units whose cooldown has elapsed.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::Strike` entries for attacking units that are ready.
    ///
    /// Units are visited in ascending id order, so the command batch is
    /// deterministic for a given view. An attacking unit whose target has
    /// already left the view is skipped; its state machine re-targets on the
    /// next tick.
    pub fn handle(&mut self, units: &UnitView, out: &mut Vec<Command>) {
        self.scratch.clear();

        for unit in units.iter() {
            if unit.state != UnitState::Attacking || !unit.ready_to_strike {
                continue;
            }
            let Some(target) = unit.target else {
                continue;
            };
            if units.get(target).is_none() {
                continue;
            }
            self.scratch.push(Command::Strike {
                attacker: unit.id,
                target,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
