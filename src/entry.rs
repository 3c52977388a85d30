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

//! NACHA file building blocks: entries, batches, and the file header.
//!
//! An entry is created once by the reconciler, queued until a cutoff drains
//! it into a batch, rendered once, and never mutated. Control totals are not
//! stored anywhere on these types; they are folded from the entries at
//! render time so totals can never drift from the entries they describe.

use crate::base::{Cents, EmployeeId};
use crate::error::AchError;
use crate::payout::EmployeeBankProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ACH credit instruction (a PPD Entry Detail record in waiting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NachaEntry {
    /// `"22"` (checking credit) or `"32"` (savings credit).
    pub transaction_code: &'static str,
    /// Nine-digit routing number of the receiving bank.
    pub rdfi_routing: String,
    /// Destination account number (≤17 chars).
    pub dfi_account: String,
    /// Credit amount in cents; must be strictly positive.
    pub amount: Cents,
    /// Employee identifier printed on the entry (≤15 chars).
    pub individual_id: String,
    /// Recipient name, uppercased; truncated to 22 chars at render.
    pub individual_name: String,
    /// Sequence half of the trace number, unique per process lifetime.
    pub trace_seq: u32,
    /// Employee the entry pays, kept for audit correlation.
    pub employee_id: EmployeeId,
}

impl NachaEntry {
    /// Builds an entry from a banking profile and a converted amount.
    ///
    /// The recipient name is uppercased here; width truncation happens when
    /// the record is rendered.
    pub fn from_profile(profile: &EmployeeBankProfile, amount: Cents, trace_seq: u32) -> Self {
        Self {
            transaction_code: profile.account_type.transaction_code(),
            rdfi_routing: profile.routing_number.clone(),
            dfi_account: profile.account_number.clone(),
            amount,
            individual_id: profile.individual_id.clone(),
            individual_name: profile.name.to_uppercase(),
            trace_seq,
            employee_id: profile.employee_id,
        }
    }

    /// First eight digits of the RDFI routing number as an integer, the
    /// per-entry term of the NACHA entry hash.
    pub fn routing_prefix(&self) -> Result<u64, AchError> {
        let digits = &self.rdfi_routing;
        if digits.len() != 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AchError::InvalidRoutingNumber);
        }
        digits[..8]
            .parse()
            .map_err(|_| AchError::InvalidRoutingNumber)
    }
}

/// An ordered run of entries under one company batch header.
///
/// Entry order is insertion (arrival) order; it is significant for audit
/// trails but not for control totals. Service class 200 (credits only) and
/// SEC code PPD are fixed by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NachaBatch {
    /// Originating company name (16-char field).
    pub company_name: String,
    /// Company identification (10-char field, typically `1` + EIN).
    pub company_id: String,
    /// Entry description shown on bank statements (10-char field).
    pub entry_description: String,
    /// Settlement date requested for the credits.
    pub effective_date: NaiveDate,
    /// Eight-digit ODFI identifier (routing number without check digit).
    pub odfi_id: String,
    pub entries: Vec<NachaEntry>,
}

/// Per-file immutable metadata for the File Header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    /// Nine-digit routing number of the receiving point (usually the ODFI).
    pub immediate_destination: String,
    /// Nine-digit routing number identifying the originator.
    pub immediate_origin: String,
    pub destination_name: String,
    pub origin_name: String,
    /// Single uppercase letter, rotated A→Z across same-day re-submissions.
    /// Rotation policy belongs to the operator, not this crate.
    pub file_id_modifier: char,
    /// Free-form reference (8-char field, commonly blank).
    pub reference_code: String,
}
