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

//! # ACH Payroll
//!
//! This library reconciles on-chain payout events into NACHA-compliant ACH
//! credit files with a paired double-entry audit trail.
//!
//! ## Core Components
//!
//! - [`Engine`]: central pipeline; reconciles payouts, accumulates entries,
//!   flushes files at cutoffs
//! - [`convert_to_cents`]: exact token-amount to cents conversion
//! - [`records`]: pure fixed-width NACHA record rendering
//! - [`build_file`]: multi-record file assembly with derived control totals
//! - [`Reconciler`]: payout event → ACH entry + journal entry
//! - [`EntryQueue`]: lock-free pending-entry accumulator
//!
//! ## Example
//!
//! ```
//! use ach_payroll_rs::{
//!     AccountType, ConversionMode, EmployeeBankProfile, EmployeeId, Engine, EngineConfig,
//!     FileHeader, MemoryDirectory, MemoryLedger, PayPreference, PayoutEvent,
//! };
//! use chrono::NaiveDate;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let directory = Arc::new(MemoryDirectory::new());
//! directory.insert(EmployeeBankProfile {
//!     employee_id: EmployeeId(1),
//!     name: "Ada Lovelace".to_string(),
//!     individual_id: "EMP-1".to_string(),
//!     routing_number: "123456780".to_string(),
//!     account_number: "1001".to_string(),
//!     account_type: AccountType::Checking,
//!     pay_preference: PayPreference::Ach,
//! });
//!
//! let config = EngineConfig {
//!     file_header: FileHeader {
//!         immediate_destination: "091000019".to_string(),
//!         immediate_origin: "123456780".to_string(),
//!         destination_name: "FIRST TEST BANK".to_string(),
//!         origin_name: "ACME PAYROLL".to_string(),
//!         file_id_modifier: 'A',
//!         reference_code: String::new(),
//!     },
//!     company_name: "ACME PAYROLL".to_string(),
//!     company_id: "1234567890".to_string(),
//!     entry_description: "PAYROLL".to_string(),
//!     odfi_id: "09100001".to_string(),
//!     token_decimals: HashMap::from([("0xusdc".to_string(), 6)]),
//!     conversion_mode: ConversionMode::Stable1To1,
//! };
//!
//! let engine = Engine::new(config, directory, Arc::new(MemoryLedger::new())).unwrap();
//! engine
//!     .handle_payout(&PayoutEvent {
//!         employee_id: EmployeeId(1),
//!         wallet: "0xabc".to_string(),
//!         token: "0xusdc".to_string(),
//!         amount_base_units: "1500000".to_string(), // 1.50 units
//!         pay_time: 1_760_000_000,
//!     })
//!     .unwrap();
//!
//! let effective = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
//! let file = engine.render(effective).unwrap().unwrap();
//! assert_eq!(file.entry_count, 1);
//! // One entry pads out to a single ten-record block.
//! assert_eq!(file.text.lines().count(), 10);
//! ```
//!
//! ## Thread Safety
//!
//! Payout events may be handled from many threads concurrently while a
//! separate cutoff thread flushes; the pending queue is lock-free and trace
//! sequences are assigned atomically, so no entry is ever lost, duplicated,
//! or given a duplicate trace number.

pub mod assembler;
mod base;
mod currency;
mod engine;
pub mod entry;
mod entry_queue;
pub mod error;
pub mod ledger;
pub mod payout;
pub mod records;
mod reconciler;

pub use assembler::build_file;
pub use base::{Cents, EmployeeId, TraceSequence};
pub use currency::{ConversionMode, MAX_TOKEN_DECIMALS, TokenAmount, convert_to_cents};
pub use engine::{
    Engine, EngineConfig, FlushError, FlushOutcome, RenderedFile, SubmissionTransport,
    TransportError,
};
pub use entry::{FileHeader, NachaBatch, NachaEntry};
pub use entry_queue::{Accumulator, EntryQueue};
pub use error::AchError;
pub use ledger::{JournalEntry, JournalLine, LedgerSink, MemoryLedger, Side};
pub use payout::{
    AccountType, BankDirectory, EmployeeBankProfile, MemoryDirectory, PayPreference, PayoutEvent,
};
pub use reconciler::Reconciler;
