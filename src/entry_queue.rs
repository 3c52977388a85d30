// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ach-payroll-rs contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Pending-entry accumulator between reconciliation and cutoff.
//!
//! Multiple reconcilers append concurrently; a single cutoff flusher drains.
//! The queue is lock-free, so an append never blocks on an in-progress drain.

use crate::entry::NachaEntry;
use crossbeam::queue::SegQueue;

/// Accumulates entries between cutoffs.
///
/// Any implementation must guarantee that an entry lands in exactly one
/// drain: entries appended before a [`drain_all`](Accumulator::drain_all)
/// call are included in its result, entries appended concurrently with it
/// land in either that drain or the next, and no entry is ever lost or
/// duplicated. A durable-queue implementation can be substituted here
/// without touching the encoder or assembler.
pub trait Accumulator: Send + Sync {
    /// Appends an entry at the tail. Never blocks.
    fn append(&self, entry: NachaEntry);

    /// Removes and returns all pending entries in arrival order.
    fn drain_all(&self) -> Vec<NachaEntry>;

    /// Number of entries currently pending.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`Accumulator`] backed by a lock-free segmented queue.
#[derive(Debug, Default)]
pub struct EntryQueue {
    entries: SegQueue<NachaEntry>,
}

impl EntryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for EntryQueue {
    fn append(&self, entry: NachaEntry) {
        self.entries.push(entry);
    }

    fn drain_all(&self) -> Vec<NachaEntry> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(entry) = self.entries.pop() {
            drained.push(entry);
        }
        drained
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Cents, EmployeeId};

    fn entry(seq: u32) -> NachaEntry {
        NachaEntry {
            transaction_code: "22",
            rdfi_routing: "123456780".to_string(),
            dfi_account: "1".to_string(),
            amount: Cents(100),
            individual_id: "X".to_string(),
            individual_name: "X".to_string(),
            trace_seq: seq,
            employee_id: EmployeeId(seq),
        }
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let queue = EntryQueue::new();
        for seq in 1..=5 {
            queue.append(entry(seq));
        }
        let drained = queue.drain_all();
        let seqs: Vec<u32> = drained.iter().map(|e| e.trace_seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn drain_resets_queue_to_empty() {
        let queue = EntryQueue::new();
        queue.append(entry(1));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_all().len(), 1);
        assert!(queue.is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn entries_after_drain_land_in_next_drain() {
        let queue = EntryQueue::new();
        queue.append(entry(1));
        queue.drain_all();
        queue.append(entry(2));
        let second = queue.drain_all();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].trace_seq, 2);
    }
}
