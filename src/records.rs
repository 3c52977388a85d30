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

//! NACHA record rendering.
//!
//! Pure, stateless functions, one per record type, each producing exactly one
//! 94-character ASCII line. Text fields are space-right-padded and silently
//! truncated (fixed-width banking convention); numeric fields are
//! zero-left-padded and reject non-numeric or overwide input outright, so a
//! malformed value can never reach the wire as zeros.
//!
//! Record order, control totals, and block padding are the file assembler's
//! concern; everything here renders a single record from its inputs.

use crate::entry::{FileHeader, NachaBatch, NachaEntry};
use crate::error::AchError;
use chrono::NaiveDateTime;

/// Every NACHA record is exactly this many characters.
pub const RECORD_LEN: usize = 94;

/// Records per block; files are padded to a multiple of this.
pub const BLOCKING_FACTOR: usize = 10;

/// Entry hashes are kept modulo 10^10.
pub const HASH_MODULUS: u64 = 10_000_000_000;

/// Service class for credits-only batches.
const SERVICE_CLASS: &str = "200";

/// Standard entry class for consumer payroll credits.
const SEC_CODE: &str = "PPD";

/// Space-right-pads `value` to `width`, silently truncating overlong input.
fn alpha(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Zero-left-pads an already-numeric string to `width`.
///
/// # Errors
///
/// Non-digit input or input wider than the field is a hard error; NACHA
/// numeric fields must never be silently zeroed or clipped.
fn numeric(value: &str, width: usize, field: &'static str) -> Result<String, AchError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AchError::NonNumericField { field });
    }
    if value.len() > width {
        return Err(AchError::NumericOverflow { field });
    }
    Ok(format!("{value:0>width$}"))
}

/// Zero-left-pads an unsigned value to `width`.
fn numeric_u64(value: u64, width: usize, field: &'static str) -> Result<String, AchError> {
    numeric(&value.to_string(), width, field)
}

/// Validates a nine-digit routing number.
fn routing9<'a>(value: &'a str, _field: &'static str) -> Result<&'a str, AchError> {
    if value.len() != 9 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AchError::InvalidRoutingNumber);
    }
    Ok(value)
}

/// Sums the 8-digit RDFI routing prefixes of `entries`, modulo 10^10.
///
/// The file-level hash must fold over every entry directly rather than
/// summing batch hashes, so both levels call this with their own entry set.
pub fn entry_hash<'a>(
    entries: impl IntoIterator<Item = &'a NachaEntry>,
) -> Result<u64, AchError> {
    let mut sum: u64 = 0;
    for entry in entries {
        sum = (sum + entry.routing_prefix()?) % HASH_MODULUS;
    }
    Ok(sum)
}

/// Sums entry amounts in cents, rejecting any non-positive amount.
pub fn credit_total<'a>(
    entries: impl IntoIterator<Item = &'a NachaEntry>,
) -> Result<u64, AchError> {
    let mut sum: u64 = 0;
    for entry in entries {
        if entry.amount.0 <= 0 {
            return Err(AchError::InvalidAmount);
        }
        sum = sum
            .checked_add(entry.amount.0 as u64)
            .ok_or(AchError::AmountOverflow)?;
    }
    Ok(sum)
}

/// Renders the File Header record (type `1`).
///
/// `created` is the file creation timestamp, the only render-time input that
/// varies between otherwise identical files. Callers that need byte-stable
/// retries pass the same value again.
pub fn file_header(header: &FileHeader, created: NaiveDateTime) -> Result<String, AchError> {
    let destination = routing9(&header.immediate_destination, "immediate destination")?;
    let origin = routing9(&header.immediate_origin, "immediate origin")?;
    if !header.file_id_modifier.is_ascii_uppercase() {
        return Err(AchError::InvalidFileIdModifier);
    }

    // Immediate destination/origin are 10-char fields: a leading space
    // followed by the nine-digit routing number.
    let line = format!(
        "101 {destination} {origin}{date}{time}{modifier}094101{dest_name}{orig_name}{reference}",
        date = created.format("%y%m%d"),
        time = created.format("%H%M"),
        modifier = header.file_id_modifier,
        dest_name = alpha(&header.destination_name, 23),
        orig_name = alpha(&header.origin_name, 23),
        reference = alpha(&header.reference_code, 8),
    );
    debug_assert_eq!(line.len(), RECORD_LEN);
    Ok(line)
}

/// Renders a Batch Header record (type `5`).
pub fn batch_header(batch: &NachaBatch, batch_number: u32) -> Result<String, AchError> {
    let line = format!(
        "5{SERVICE_CLASS}{company_name}{discretionary}{company_id}{SEC_CODE}{description}{descriptive_date}{effective}{settlement}1{odfi}{number}",
        company_name = alpha(&batch.company_name, 16),
        discretionary = alpha("", 20),
        company_id = alpha(&batch.company_id, 10),
        description = alpha(&batch.entry_description, 10),
        descriptive_date = alpha("", 6),
        effective = batch.effective_date.format("%y%m%d"),
        settlement = alpha("", 3),
        odfi = numeric(&batch.odfi_id, 8, "ODFI identifier")?,
        number = numeric_u64(batch_number as u64, 7, "batch number")?,
    );
    debug_assert_eq!(line.len(), RECORD_LEN);
    Ok(line)
}

/// Renders an Entry Detail record (type `6`).
///
/// The trace number is the ODFI's eight-digit identifier followed by the
/// entry's zero-padded seven-digit sequence.
pub fn entry_detail(entry: &NachaEntry, odfi_id: &str) -> Result<String, AchError> {
    if entry.amount.0 <= 0 {
        return Err(AchError::InvalidAmount);
    }
    let routing = routing9(&entry.rdfi_routing, "RDFI routing")?;
    let (prefix, check_digit) = routing.split_at(8);

    let line = format!(
        "6{code}{prefix}{check_digit}{account}{amount}{individual_id}{individual_name}{discretionary}0{odfi}{trace}",
        code = numeric(entry.transaction_code, 2, "transaction code")?,
        account = alpha(&entry.dfi_account, 17),
        amount = numeric_u64(entry.amount.0 as u64, 10, "amount")?,
        individual_id = alpha(&entry.individual_id, 15),
        individual_name = alpha(&entry.individual_name, 22),
        discretionary = alpha("", 2),
        odfi = numeric(odfi_id, 8, "ODFI identifier")?,
        trace = numeric_u64(entry.trace_seq as u64, 7, "trace sequence")?,
    );
    debug_assert_eq!(line.len(), RECORD_LEN);
    Ok(line)
}

/// Renders a Batch Control record (type `8`).
///
/// Count, hash, and credit total are folded from the batch's entries right
/// here; nothing is read from stored totals. The debit total is always zero
/// for a credits-only service class.
pub fn batch_control(batch: &NachaBatch, batch_number: u32) -> Result<String, AchError> {
    let hash = entry_hash(&batch.entries)?;
    let credits = credit_total(&batch.entries)?;

    let line = format!(
        "8{SERVICE_CLASS}{count}{hash}{debits}{credits}{company_id}{mac}{reserved}{odfi}{number}",
        count = numeric_u64(batch.entries.len() as u64, 6, "entry count")?,
        hash = numeric_u64(hash, 10, "entry hash")?,
        debits = numeric_u64(0, 12, "debit total")?,
        credits = numeric_u64(credits, 12, "credit total")?,
        company_id = alpha(&batch.company_id, 10),
        mac = alpha("", 19),
        reserved = alpha("", 6),
        odfi = numeric(&batch.odfi_id, 8, "ODFI identifier")?,
        number = numeric_u64(batch_number as u64, 7, "batch number")?,
    );
    debug_assert_eq!(line.len(), RECORD_LEN);
    Ok(line)
}

/// Renders the File Control record (type `9`).
///
/// `record_count` counts every record through this one (header, batch
/// records, entries, and the control itself), before filler padding. The
/// block count rounds that up to whole blocks of [`BLOCKING_FACTOR`].
pub fn file_control(
    batch_count: usize,
    record_count: usize,
    entry_count: usize,
    hash: u64,
    credits: u64,
) -> Result<String, AchError> {
    let blocks = record_count.div_ceil(BLOCKING_FACTOR);

    let line = format!(
        "9{batches}{blocks}{entries}{hash}{debits}{credits}{reserved}",
        batches = numeric_u64(batch_count as u64, 6, "batch count")?,
        blocks = numeric_u64(blocks as u64, 6, "block count")?,
        entries = numeric_u64(entry_count as u64, 8, "entry count")?,
        hash = numeric_u64(hash, 10, "entry hash")?,
        debits = numeric_u64(0, 12, "debit total")?,
        credits = numeric_u64(credits, 12, "credit total")?,
        reserved = alpha("", 39),
    );
    debug_assert_eq!(line.len(), RECORD_LEN);
    Ok(line)
}

/// A block-padding filler record: 94 nines.
pub fn filler() -> String {
    "9".repeat(RECORD_LEN)
}
