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

//! Double-entry journal records for the payroll audit trail.
//!
//! Every ACH entry the reconciler produces is paired with a balanced journal
//! entry: debit the payroll-expense account, credit the ACH-clearing account,
//! both for the identical cent amount. Posting is fire-and-forget from the
//! pipeline's perspective; the [`LedgerSink`] implementation owns durability.

use crate::base::{Cents, EmployeeId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Account debited for payroll cost.
pub const PAYROLL_EXPENSE: &str = "payroll:expense";

/// Account credited while funds await ACH settlement.
pub const ACH_CLEARING: &str = "ach:clearing";

/// Debit or credit side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    #[serde(rename = "D")]
    Debit,
    #[serde(rename = "C")]
    Credit,
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalLine {
    pub account: String,
    pub side: Side,
    pub amount: Cents,
    /// Scope tag; payroll lines carry the employee ID.
    pub entity: String,
}

/// A dated, balanced set of journal lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub memo: String,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Builds the standard two-line payroll entry for one payout.
    ///
    /// Both lines take the same `amount` and the same entity tag; the ACH
    /// entry and this journal entry are constructed from one converted
    /// amount upstream, so they cannot diverge.
    pub fn payroll(employee_id: EmployeeId, amount: Cents, timestamp: DateTime<Utc>) -> Self {
        let entity = employee_id.to_string();
        Self {
            timestamp,
            memo: format!("payroll credit for employee {employee_id}"),
            lines: vec![
                JournalLine {
                    account: PAYROLL_EXPENSE.to_string(),
                    side: Side::Debit,
                    amount,
                    entity: entity.clone(),
                },
                JournalLine {
                    account: ACH_CLEARING.to_string(),
                    side: Side::Credit,
                    amount,
                    entity,
                },
            ],
        }
    }

    /// True when debit and credit totals match.
    pub fn is_balanced(&self) -> bool {
        let mut debits: i64 = 0;
        let mut credits: i64 = 0;
        for line in &self.lines {
            match line.side {
                Side::Debit => debits += line.amount.0,
                Side::Credit => credits += line.amount.0,
            }
        }
        debits == credits
    }
}

/// Destination for posted journal entries.
///
/// Posting never fails from the caller's view; a real implementation queues
/// or persists internally.
pub trait LedgerSink: Send + Sync {
    fn post(&self, entry: JournalEntry);
}

/// In-memory [`LedgerSink`] for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all posted entries in posting order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LedgerSink for MemoryLedger {
    fn post(&self, entry: JournalEntry) {
        self.entries.lock().push(entry);
    }
}
