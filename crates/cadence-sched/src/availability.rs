//! Per-wire availability tracking shared by both traversal directions.

use cadence_ir::WireId;
use rustc_hash::FxHashMap;

/// Next free time of every wire.
///
/// Times only move forward: [`ResourceAvailability::advance`] never lowers
/// an entry. The forward pass reads entries as wall-clock time, the reverse
/// pass as time measured back from the end of the schedule.
#[derive(Debug, Clone, Default)]
pub struct ResourceAvailability {
    free_at: FxHashMap<WireId, u64>,
}

impl ResourceAvailability {
    /// Track the given wires, all free at time zero.
    pub fn new(wires: impl IntoIterator<Item = WireId>) -> Self {
        Self {
            free_at: wires.into_iter().map(|w| (w, 0)).collect(),
        }
    }

    /// Next free time of a wire. Untracked wires are free at zero.
    pub fn get(&self, wire: WireId) -> u64 {
        self.free_at.get(&wire).copied().unwrap_or(0)
    }

    /// Latest free time over several wires, zero if there are none.
    pub fn latest(&self, wires: impl IntoIterator<Item = WireId>) -> u64 {
        wires.into_iter().map(|w| self.get(w)).max().unwrap_or(0)
    }

    /// Mark a wire busy until `time`. Earlier times are ignored.
    pub fn advance(&mut self, wire: WireId, time: u64) {
        let entry = self.free_at.entry(wire).or_insert(0);
        *entry = (*entry).max(time);
    }

    /// Latest free time over all tracked wires.
    pub fn horizon(&self) -> u64 {
        self.free_at.values().copied().max().unwrap_or(0)
    }
}
