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

//! NACHA file assembly.
//!
//! [`build_file`] orchestrates the record encoder across one or more batches:
//! file header, then each batch's header, entries, and control, then the file
//! control, then `9`-filler records up to a whole block. Every control total
//! is folded from the entries being rendered, so a mismatch between entries
//! and totals cannot be constructed.
//!
//! Rendering is all-or-nothing: any invalid field aborts the whole file.

use crate::entry::{FileHeader, NachaBatch};
use crate::error::AchError;
use crate::records;
use chrono::NaiveDateTime;

/// Renders a complete NACHA file as ASCII text.
///
/// Records are joined with `\n` and the file ends with a trailing newline.
/// `created` becomes the file creation date/time in the File Header; given
/// the same header, batches, and `created`, the output is byte-identical.
///
/// # Errors
///
/// [`AchError::EmptyBatch`] if `batches` is empty or any batch has no
/// entries (an empty batch is not a valid NACHA file and must be skipped by
/// the caller). Field-level validation errors propagate from the encoder.
pub fn build_file(
    header: &FileHeader,
    batches: &[NachaBatch],
    created: NaiveDateTime,
) -> Result<String, AchError> {
    if batches.is_empty() || batches.iter().any(|b| b.entries.is_empty()) {
        return Err(AchError::EmptyBatch);
    }

    let mut lines = Vec::new();
    lines.push(records::file_header(header, created)?);

    for (index, batch) in batches.iter().enumerate() {
        let batch_number = (index + 1) as u32;
        lines.push(records::batch_header(batch, batch_number)?);
        for entry in &batch.entries {
            lines.push(records::entry_detail(entry, &batch.odfi_id)?);
        }
        lines.push(records::batch_control(batch, batch_number)?);
    }

    // File-level hash and credit total fold over every entry of every batch
    // directly; summing per-batch hashes would double-apply the modulus.
    let all_entries = || batches.iter().flat_map(|b| b.entries.iter());
    let entry_count: usize = batches.iter().map(|b| b.entries.len()).sum();
    let hash = records::entry_hash(all_entries())?;
    let credits = records::credit_total(all_entries())?;

    let record_count = lines.len() + 1; // including the file control itself
    lines.push(records::file_control(
        batches.len(),
        record_count,
        entry_count,
        hash,
        credits,
    )?);

    while lines.len() % records::BLOCKING_FACTOR != 0 {
        lines.push(records::filler());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}
