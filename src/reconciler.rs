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

//! Payout-to-entry reconciliation.
//!
//! The reconciler turns one on-chain payout event into one ACH entry
//! candidate plus its paired journal entry, or into a documented silent
//! skip. Skips are not errors: redelivered events, unknown employees,
//! on-chain pay preferences, and zero-value payouts all fall out of the
//! pipeline here with a log line and nothing else.

use crate::base::{Cents, EmployeeId, TraceSequence};
use crate::currency::{ConversionMode, TokenAmount, convert_to_cents};
use crate::entry::NachaEntry;
use crate::error::AchError;
use crate::ledger::JournalEntry;
use crate::payout::{BankDirectory, PayPreference, PayoutEvent};
use chrono::DateTime;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts payout events into ACH entries and journal entries.
///
/// # Invariants
///
/// - The ACH entry and the journal entry of one payout always carry the
///   identical cent amount.
/// - Trace sequences come from a single atomic generator and are never
///   reused, even under concurrent reconciliation.
/// - Chain delivery is at-least-once; a `(employee_id, pay_time)` pair is
///   reconciled at most once.
pub struct Reconciler {
    directory: Arc<dyn BankDirectory>,
    sequence: TraceSequence,
    /// Events already reconciled, for at-least-once delivery dedup.
    ///
    /// Grows with every reconciled payout until [`Reconciler::forget_before`]
    /// prunes it; callers with long-lived processes prune after each
    /// submitted cutoff, once the event source can no longer redeliver that
    /// far back.
    seen: DashMap<(EmployeeId, i64), ()>,
    /// Decimal precision per token contract address.
    token_decimals: HashMap<String, u32>,
    mode: ConversionMode,
}

impl Reconciler {
    pub fn new(
        directory: Arc<dyn BankDirectory>,
        token_decimals: HashMap<String, u32>,
        mode: ConversionMode,
        sequence: TraceSequence,
    ) -> Self {
        Self {
            directory,
            sequence,
            seen: DashMap::new(),
            token_decimals,
            mode,
        }
    }

    /// Reconciles one payout event.
    ///
    /// Returns `Ok(None)` for every documented skip; `Ok(Some(..))` carries
    /// the entry candidate and its journal pairing. The caller owns queueing
    /// the entry and posting the journal entry.
    ///
    /// # Errors
    ///
    /// Configuration and data problems fail fast: unknown token, oracle
    /// mode, malformed base units, overflow, a profile with a malformed
    /// routing number, or an unrepresentable pay time. A failed event is
    /// un-marked from the dedup set so a redelivery after the underlying fix
    /// is not swallowed.
    pub fn reconcile(
        &self,
        event: &PayoutEvent,
    ) -> Result<Option<(NachaEntry, JournalEntry)>, AchError> {
        let key = (event.employee_id, event.pay_time);
        match self.seen.entry(key) {
            Entry::Occupied(_) => {
                debug!(employee = %event.employee_id, pay_time = event.pay_time,
                       "skipping redelivered payout event");
                return Ok(None);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(());
            }
        }

        let result = self.reconcile_inner(event);
        if result.is_err() {
            self.seen.remove(&key);
        }
        result
    }

    /// Drops dedup state for events paid strictly before `pay_time`.
    ///
    /// Safe once the event source's redelivery window has moved past that
    /// point; pruning a key the source can still redeliver would pay the
    /// payout twice.
    pub fn forget_before(&self, pay_time: i64) {
        self.seen.retain(|&(_, t), _| t >= pay_time);
    }

    fn reconcile_inner(
        &self,
        event: &PayoutEvent,
    ) -> Result<Option<(NachaEntry, JournalEntry)>, AchError> {
        let Some(profile) = self.directory.lookup(event.employee_id) else {
            debug!(employee = %event.employee_id, "no bank profile, skipping payout");
            return Ok(None);
        };
        if profile.pay_preference != PayPreference::Ach {
            debug!(employee = %event.employee_id, "pay preference is on-chain, skipping payout");
            return Ok(None);
        }

        let decimals = *self
            .token_decimals
            .get(&event.token)
            .ok_or_else(|| AchError::UnknownToken(event.token.clone()))?;
        let amount = convert_to_cents(
            &TokenAmount {
                base_units: event.amount_base_units.clone(),
                decimals,
            },
            self.mode,
        )?;
        // Zero-value payouts never reach the encoder, which requires
        // strictly positive entry amounts.
        if amount == Cents::ZERO {
            warn!(employee = %event.employee_id, "zero-amount payout, skipping");
            return Ok(None);
        }

        if profile.routing_number.len() != 9
            || !profile.routing_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AchError::InvalidRoutingNumber);
        }

        let timestamp =
            DateTime::from_timestamp(event.pay_time, 0).ok_or(AchError::InvalidPayTime)?;

        // One converted amount feeds both outputs; the ledger and the ACH
        // file cannot disagree.
        let trace_seq = self.sequence.next();
        let entry = NachaEntry::from_profile(&profile, amount, trace_seq);
        let journal = JournalEntry::payroll(event.employee_id, amount, timestamp);
        Ok(Some((entry, journal)))
    }
}
