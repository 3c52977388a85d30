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

//! Pipeline orchestration.
//!
//! The [`Engine`] wires the reconciler, the pending-entry queue, and the
//! ledger together. Payout events arrive concurrently via
//! [`Engine::handle_payout`]; a cutoff trigger (timer, cron, operator)
//! calls [`Engine::flush`], which drains whatever is pending, renders one
//! NACHA file, and hands it to the submission transport.
//!
//! The engine never retries a failed submission. The rendered file travels
//! inside the flush error so the caller can resubmit the identical bytes or
//! persist them for manual recovery; re-rendering would move the
//! file-creation timestamp.

use crate::base::{Cents, TraceSequence};
use crate::currency::ConversionMode;
use crate::entry::{FileHeader, NachaBatch, NachaEntry};
use crate::entry_queue::{Accumulator, EntryQueue};
use crate::error::AchError;
use crate::ledger::LedgerSink;
use crate::payout::{BankDirectory, PayoutEvent};
use crate::reconciler::Reconciler;
use crate::{assembler, records};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Static configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub file_header: FileHeader,
    /// Originating company name for batch headers (16-char field).
    pub company_name: String,
    /// Company identification (10-char field).
    pub company_id: String,
    /// Statement description, e.g. `PAYROLL` (10-char field).
    pub entry_description: String,
    /// Eight-digit ODFI identifier used in batch records and trace numbers.
    pub odfi_id: String,
    /// Decimal precision per payout token address.
    pub token_decimals: HashMap<String, u32>,
    pub conversion_mode: ConversionMode,
}

impl EngineConfig {
    /// Checks the fixed file and batch header fields.
    ///
    /// These values render into every file the engine produces, so a bad one
    /// is rejected here rather than at the first cutoff.
    pub fn validate(&self) -> Result<(), AchError> {
        let routing_ok =
            |value: &str| value.len() == 9 && value.bytes().all(|b| b.is_ascii_digit());
        if !routing_ok(&self.file_header.immediate_destination)
            || !routing_ok(&self.file_header.immediate_origin)
        {
            return Err(AchError::InvalidRoutingNumber);
        }
        if !self.file_header.file_id_modifier.is_ascii_uppercase() {
            return Err(AchError::InvalidFileIdModifier);
        }
        if self.odfi_id.is_empty() || !self.odfi_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AchError::NonNumericField {
                field: "ODFI identifier",
            });
        }
        if self.odfi_id.len() > 8 {
            return Err(AchError::NumericOverflow {
                field: "ODFI identifier",
            });
        }
        Ok(())
    }
}

/// A rendered NACHA file plus the totals it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Complete file text, newline-terminated. Byte-stable: resubmit these
    /// exact bytes rather than re-rendering.
    pub text: String,
    pub entry_count: usize,
    pub total_credit: Cents,
}

/// Result of a cutoff flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending; no file was generated or submitted.
    Skipped,
    Submitted(RenderedFile),
}

/// Error type returned by submission transports.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Delivers a rendered file to the bank.
///
/// The tag is a caller-supplied idempotency/naming token; what the
/// transport is (disk, SFTP, gateway API) is none of the engine's business.
pub trait SubmissionTransport {
    fn submit(&self, tag: &str, file_text: &str) -> Result<(), TransportError>;
}

/// A cutoff flush failure.
#[derive(Debug, Error)]
pub enum FlushError {
    /// Rendering failed before anything was submitted.
    #[error(transparent)]
    Render(#[from] AchError),

    /// The transport rejected the file. `file` holds the complete rendered
    /// text, sufficient for manual resubmission of identical bytes.
    #[error("submission failed for tag `{tag}`: {source}")]
    Submission {
        tag: String,
        file: RenderedFile,
        #[source]
        source: TransportError,
    },
}

/// Central pipeline: reconciles payouts, accumulates entries, flushes files.
pub struct Engine {
    config: EngineConfig,
    queue: Box<dyn Accumulator>,
    reconciler: Reconciler,
    ledger: Arc<dyn LedgerSink>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine with the default in-memory accumulator.
    ///
    /// # Errors
    ///
    /// Rejects a configuration whose fixed header fields could not render,
    /// so a bad ODFI or routing number surfaces here and not at a cutoff.
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn BankDirectory>,
        ledger: Arc<dyn LedgerSink>,
    ) -> Result<Self, AchError> {
        Self::with_accumulator(config, directory, ledger, Box::new(EntryQueue::new()))
    }

    /// Creates an engine with a caller-supplied accumulator, e.g. a durable
    /// queue that survives restarts.
    pub fn with_accumulator(
        config: EngineConfig,
        directory: Arc<dyn BankDirectory>,
        ledger: Arc<dyn LedgerSink>,
        queue: Box<dyn Accumulator>,
    ) -> Result<Self, AchError> {
        config.validate()?;
        let reconciler = Reconciler::new(
            directory,
            config.token_decimals.clone(),
            config.conversion_mode,
            TraceSequence::new(),
        );
        Ok(Self {
            config,
            queue,
            reconciler,
            ledger,
        })
    }

    /// Processes one payout event.
    ///
    /// On success the ACH entry is queued for the next cutoff and the paired
    /// journal entry is posted to the ledger; the assigned trace sequence is
    /// returned. Documented skips (redelivery, unknown employee, on-chain
    /// preference, zero amount) return `Ok(None)`.
    pub fn handle_payout(&self, event: &PayoutEvent) -> Result<Option<u32>, AchError> {
        let Some((entry, journal)) = self.reconciler.reconcile(event)? else {
            return Ok(None);
        };
        let trace_seq = entry.trace_seq;
        self.queue.append(entry);
        self.ledger.post(journal);
        Ok(Some(trace_seq))
    }

    /// Number of entries awaiting the next cutoff.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drops redelivery-dedup state for payouts before `pay_time`.
    ///
    /// The dedup set otherwise grows for the process lifetime. Call after a
    /// submitted cutoff, once the event source can no longer redeliver that
    /// far back.
    pub fn forget_reconciled_before(&self, pay_time: i64) {
        self.reconciler.forget_before(pay_time);
    }

    /// Drains pending entries and renders a NACHA file without submitting.
    ///
    /// Returns `None` when nothing is pending. Rendering runs after the
    /// drain completes; no lock is held while encoding. On a render error
    /// the drained entries go back into the queue, so the journal entries
    /// already posted for them still have a file flush ahead of them;
    /// entries appended concurrently with the failed render come first in
    /// the re-queued order.
    pub fn render(&self, effective_date: NaiveDate) -> Result<Option<RenderedFile>, AchError> {
        let entries = self.queue.drain_all();
        if entries.is_empty() {
            return Ok(None);
        }
        self.render_entries(entries, effective_date).map(Some)
    }

    /// Drains pending entries, renders a NACHA file, and submits it.
    ///
    /// An empty queue is [`FlushOutcome::Skipped`]: an empty batch is not a
    /// valid NACHA file and nothing is sent. On a transport failure the
    /// drained entries are not lost; the rendered file rides in the error
    /// for retry or manual recovery.
    pub fn flush(
        &self,
        effective_date: NaiveDate,
        tag: &str,
        transport: &dyn SubmissionTransport,
    ) -> Result<FlushOutcome, FlushError> {
        let Some(file) = self.render(effective_date)? else {
            info!(tag, "cutoff fired with no pending entries, skipping file generation");
            return Ok(FlushOutcome::Skipped);
        };

        match transport.submit(tag, &file.text) {
            Ok(()) => {
                info!(
                    tag,
                    entries = file.entry_count,
                    total_cents = %file.total_credit,
                    "submitted NACHA file"
                );
                Ok(FlushOutcome::Submitted(file))
            }
            Err(source) => {
                error!(tag, entries = file.entry_count, %source, "NACHA file submission failed");
                Err(FlushError::Submission {
                    tag: tag.to_string(),
                    file,
                    source,
                })
            }
        }
    }

    fn render_entries(
        &self,
        entries: Vec<NachaEntry>,
        effective_date: NaiveDate,
    ) -> Result<RenderedFile, AchError> {
        let batch = NachaBatch {
            company_name: self.config.company_name.clone(),
            company_id: self.config.company_id.clone(),
            entry_description: self.config.entry_description.clone(),
            effective_date,
            odfi_id: self.config.odfi_id.clone(),
            entries,
        };
        match self.render_batch(&batch) {
            Ok(file) => Ok(file),
            Err(err) => {
                // The drained entries already have journal entries posted;
                // putting them back keeps a later flush ahead of them.
                error!(entries = batch.entries.len(), %err, "render failed, re-queueing entries");
                for entry in batch.entries {
                    self.queue.append(entry);
                }
                Err(err)
            }
        }
    }

    fn render_batch(&self, batch: &NachaBatch) -> Result<RenderedFile, AchError> {
        let entry_count = batch.entries.len();
        let total_credit = Cents(records::credit_total(&batch.entries)? as i64);
        // File creation date/time is the sole render-time non-determinism.
        let text = assembler::build_file(
            &self.config.file_header,
            std::slice::from_ref(batch),
            Utc::now().naive_utc(),
        )?;
        Ok(RenderedFile {
            text,
            entry_count,
            total_credit,
        })
    }
}
