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

//! End-to-end pipeline tests: payout events in, NACHA file and journal out.

use ach_payroll_rs::{
    AccountType, Cents, ConversionMode, EmployeeBankProfile, EmployeeId, Engine, EngineConfig,
    FileHeader, FlushError, FlushOutcome, MemoryDirectory, MemoryLedger, PayPreference,
    PayoutEvent, Side, SubmissionTransport, TransportError,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const USDC: &str = "0xusdc";

struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl SubmissionTransport for RecordingTransport {
    fn submit(&self, tag: &str, file_text: &str) -> Result<(), TransportError> {
        self.sent.lock().push((tag.to_string(), file_text.to_string()));
        Ok(())
    }
}

struct DownTransport;

impl SubmissionTransport for DownTransport {
    fn submit(&self, _tag: &str, _file_text: &str) -> Result<(), TransportError> {
        Err("sftp: connection refused".into())
    }
}

fn make_profile(
    id: u32,
    name: &str,
    account_type: AccountType,
    pay_preference: PayPreference,
) -> EmployeeBankProfile {
    EmployeeBankProfile {
        employee_id: EmployeeId(id),
        name: name.to_string(),
        individual_id: format!("EMP-{id}"),
        routing_number: "123456780".to_string(),
        account_number: format!("10{id:02}"),
        account_type,
        pay_preference,
    }
}

fn make_directory() -> Arc<MemoryDirectory> {
    let dir = MemoryDirectory::new();
    dir.insert(make_profile(1, "Ada Lovelace", AccountType::Checking, PayPreference::Ach));
    dir.insert(make_profile(2, "Grace Hopper", AccountType::Savings, PayPreference::Ach));
    dir.insert(make_profile(3, "Satoshi", AccountType::Checking, PayPreference::OnChain));
    Arc::new(dir)
}

fn make_config() -> EngineConfig {
    EngineConfig {
        file_header: FileHeader {
            immediate_destination: "091000019".to_string(),
            immediate_origin: "123456780".to_string(),
            destination_name: "FIRST TEST BANK".to_string(),
            origin_name: "ACME PAYROLL".to_string(),
            file_id_modifier: 'A',
            reference_code: String::new(),
        },
        company_name: "ACME PAYROLL".to_string(),
        company_id: "1234567890".to_string(),
        entry_description: "PAYROLL".to_string(),
        odfi_id: "09100001".to_string(),
        token_decimals: HashMap::from([(USDC.to_string(), 6)]),
        conversion_mode: ConversionMode::Stable1To1,
    }
}

fn make_event(employee: u32, base_units: &str, pay_time: i64) -> PayoutEvent {
    PayoutEvent {
        employee_id: EmployeeId(employee),
        wallet: format!("0xwallet{employee}"),
        token: USDC.to_string(),
        amount_base_units: base_units.to_string(),
        pay_time,
    }
}

fn effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

#[test]
fn full_cycle_payouts_to_submitted_file() {
    let ledger = Arc::new(MemoryLedger::new());
    let engine = Engine::new(make_config(), make_directory(), ledger.clone()).unwrap();

    engine.handle_payout(&make_event(1, "250000000", 1_760_000_000)).unwrap(); // $250.00
    engine.handle_payout(&make_event(2, "125500000", 1_760_000_001)).unwrap(); // $125.50
    engine.handle_payout(&make_event(3, "999000000", 1_760_000_002)).unwrap(); // on-chain, skipped

    assert_eq!(engine.pending(), 2);

    let transport = RecordingTransport::new();
    let outcome = engine
        .flush(effective_date(), "20260316-A", &transport)
        .unwrap();
    let FlushOutcome::Submitted(file) = outcome else {
        panic!("expected a submitted file");
    };

    assert_eq!(file.entry_count, 2);
    assert_eq!(file.total_credit, Cents(37550));
    assert_eq!(engine.pending(), 0);

    let sent = transport.sent.lock();
    assert_eq!(sent.len(), 1);
    let lines: Vec<&str> = sent[0].1.trim_end_matches('\n').split('\n').collect();
    assert_eq!(lines.len(), 10);
    // Ada's checking credit and Grace's savings credit, in arrival order.
    assert_eq!(&lines[2][1..3], "22");
    assert!(lines[2].contains("ADA LOVELACE"));
    assert_eq!(&lines[3][1..3], "32");
    assert!(lines[3].contains("GRACE HOPPER"));
    // File control credit total covers both entries.
    assert_eq!(&lines[5][43..55], "000000037550");
}

#[test]
fn ledger_matches_file_totals() {
    let ledger = Arc::new(MemoryLedger::new());
    let engine = Engine::new(make_config(), make_directory(), ledger.clone()).unwrap();

    engine.handle_payout(&make_event(1, "100500000", 1)).unwrap(); // $100.50
    engine.handle_payout(&make_event(2, "50000000", 2)).unwrap(); // $50.00

    let file = engine.render(effective_date()).unwrap().unwrap();

    let journal_debits: i64 = ledger
        .entries()
        .iter()
        .flat_map(|e| e.lines.iter())
        .filter(|l| l.side == Side::Debit)
        .map(|l| l.amount.0)
        .sum();
    assert_eq!(Cents(journal_debits), file.total_credit);
    assert!(ledger.entries().iter().all(|e| e.is_balanced()));
}

#[test]
fn cutoff_with_nothing_pending_is_skipped() {
    let engine = Engine::new(make_config(), make_directory(), Arc::new(MemoryLedger::new())).unwrap();
    let transport = RecordingTransport::new();

    let outcome = engine
        .flush(effective_date(), "20260316-A", &transport)
        .unwrap();
    assert_eq!(outcome, FlushOutcome::Skipped);
    assert!(transport.sent.lock().is_empty());
}

#[test]
fn transport_failure_preserves_rendered_file_for_retry() {
    let engine = Engine::new(make_config(), make_directory(), Arc::new(MemoryLedger::new())).unwrap();
    engine.handle_payout(&make_event(1, "250000000", 1)).unwrap();

    let err = engine
        .flush(effective_date(), "20260316-A", &DownTransport)
        .unwrap_err();
    let FlushError::Submission { tag, file, .. } = err else {
        panic!("expected a submission failure");
    };
    assert_eq!(tag, "20260316-A");
    assert_eq!(file.entry_count, 1);

    // Retrying with the cached bytes through a healthy transport succeeds
    // with the identical file: no re-render, no timestamp drift.
    let retry = RecordingTransport::new();
    retry.submit(&tag, &file.text).unwrap();
    assert_eq!(retry.sent.lock()[0].1, file.text);
}

#[test]
fn second_cutoff_only_flushes_new_entries() {
    let engine = Engine::new(make_config(), make_directory(), Arc::new(MemoryLedger::new())).unwrap();
    let transport = RecordingTransport::new();

    engine.handle_payout(&make_event(1, "100000000", 1)).unwrap();
    engine.flush(effective_date(), "first", &transport).unwrap();

    engine.handle_payout(&make_event(2, "200000000", 2)).unwrap();
    let outcome = engine.flush(effective_date(), "second", &transport).unwrap();
    let FlushOutcome::Submitted(file) = outcome else {
        panic!("expected submission");
    };

    assert_eq!(file.entry_count, 1);
    assert_eq!(file.total_credit, Cents(20000));
    // Trace sequences continue across cutoffs.
    let lines: Vec<&str> = file.text.trim_end_matches('\n').split('\n').collect();
    assert_eq!(&lines[2][79..94], "091000010000002");
}

#[test]
fn redelivered_event_not_double_paid_across_flushes() {
    let engine = Engine::new(make_config(), make_directory(), Arc::new(MemoryLedger::new())).unwrap();
    let transport = RecordingTransport::new();

    engine.handle_payout(&make_event(1, "100000000", 77)).unwrap();
    engine.flush(effective_date(), "first", &transport).unwrap();

    // Same (employee, pay_time) delivered again after the flush.
    assert_eq!(engine.handle_payout(&make_event(1, "100000000", 77)).unwrap(), None);
    let outcome = engine.flush(effective_date(), "second", &transport).unwrap();
    assert_eq!(outcome, FlushOutcome::Skipped);
}

#[test]
fn unknown_employee_and_zero_amount_are_skips_not_errors() {
    let ledger = Arc::new(MemoryLedger::new());
    let engine = Engine::new(make_config(), make_directory(), ledger.clone()).unwrap();

    assert_eq!(engine.handle_payout(&make_event(42, "100000000", 1)).unwrap(), None);
    assert_eq!(engine.handle_payout(&make_event(1, "0", 2)).unwrap(), None);
    assert_eq!(engine.pending(), 0);
    assert!(ledger.is_empty());
}
