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

use ach_payroll_rs::{
    AccountType, ConversionMode, EmployeeBankProfile, EmployeeId, Engine, EngineConfig,
    FileHeader, MemoryDirectory, MemoryLedger, PayPreference, PayoutEvent, Side,
};
use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::warn;

/// ACH Payroll - Render payout events into a NACHA file
///
/// Reads employee bank profiles and on-chain payout events from CSV files,
/// reconciles them into ACH credit entries, writes the rendered NACHA file,
/// and prints the double-entry journal as CSV to stdout.
#[derive(Parser, Debug)]
#[command(name = "ach-payroll-rs")]
#[command(about = "Renders on-chain payout events into a NACHA ACH file", long_about = None)]
struct Args {
    /// CSV of employee bank profiles
    ///
    /// Columns: employee_id,name,individual_id,routing_number,account_number,
    /// account_type,pay_preference
    #[arg(long, value_name = "FILE")]
    employees: PathBuf,

    /// CSV of payout events
    ///
    /// Columns: employee_id,wallet,token,amount_base_units,pay_time
    #[arg(long, value_name = "FILE")]
    payouts: PathBuf,

    /// Output path for the rendered NACHA file
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    /// Originating company name (16-char NACHA field)
    #[arg(long)]
    company_name: String,

    /// Company identification, typically 1 + EIN (10-char field)
    #[arg(long)]
    company_id: String,

    /// Statement entry description
    #[arg(long, default_value = "PAYROLL")]
    entry_description: String,

    /// Eight-digit ODFI identifier
    #[arg(long)]
    odfi: String,

    /// Nine-digit immediate destination routing number
    #[arg(long)]
    destination: String,

    /// Nine-digit immediate origin routing number
    #[arg(long)]
    origin: String,

    /// Immediate destination name
    #[arg(long, default_value = "")]
    destination_name: String,

    /// Immediate origin name
    #[arg(long, default_value = "")]
    origin_name: String,

    /// File ID modifier, rotate A..Z for same-day re-submissions
    #[arg(long, default_value_t = 'A')]
    file_id_modifier: char,

    /// Requested settlement date (YYYY-MM-DD)
    #[arg(long)]
    effective_date: NaiveDate,

    /// Token decimals mapping, repeatable: --token 0xADDR=6
    #[arg(long = "token", value_name = "ADDR=DECIMALS", value_parser = parse_token_spec)]
    tokens: Vec<(String, u32)>,
}

fn parse_token_spec(spec: &str) -> Result<(String, u32), String> {
    let (address, decimals) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=DECIMALS, got '{spec}'"))?;
    let decimals: u32 = decimals
        .parse()
        .map_err(|_| format!("invalid decimals in '{spec}'"))?;
    Ok((address.to_string(), decimals))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let directory = Arc::new(MemoryDirectory::new());
    match open(&args.employees).and_then(|f| {
        load_profiles(BufReader::new(f), &directory).map_err(|e| e.to_string())
    }) {
        Ok(count) => {
            if count == 0 {
                eprintln!("No valid employee profiles in '{}'", args.employees.display());
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error reading employees: {e}");
            process::exit(1);
        }
    }

    let ledger = Arc::new(MemoryLedger::new());
    let config = EngineConfig {
        file_header: FileHeader {
            immediate_destination: args.destination.clone(),
            immediate_origin: args.origin.clone(),
            destination_name: args.destination_name.clone(),
            origin_name: args.origin_name.clone(),
            file_id_modifier: args.file_id_modifier,
            reference_code: String::new(),
        },
        company_name: args.company_name.clone(),
        company_id: args.company_id.clone(),
        entry_description: args.entry_description.clone(),
        odfi_id: args.odfi.clone(),
        token_decimals: args.tokens.iter().cloned().collect::<HashMap<_, _>>(),
        conversion_mode: ConversionMode::Stable1To1,
    };
    let engine = match Engine::new(config, directory, ledger.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    match open(&args.payouts)
        .and_then(|f| process_payouts(BufReader::new(f), &engine).map_err(|e| e.to_string()))
    {
        Ok(stats) => {
            eprintln!(
                "Reconciled {} payouts ({} skipped, {} failed)",
                stats.reconciled, stats.skipped, stats.failed
            );
        }
        Err(e) => {
            eprintln!("Error processing payouts: {e}");
            process::exit(1);
        }
    }

    match engine.render(args.effective_date) {
        Ok(Some(file)) => {
            if let Err(e) = fs::write(&args.out, &file.text) {
                eprintln!("Error writing '{}': {e}", args.out.display());
                process::exit(1);
            }
            eprintln!(
                "Wrote {} ({} entries, total ${})",
                args.out.display(),
                file.entry_count,
                file.total_credit.to_decimal()
            );
        }
        Ok(None) => {
            eprintln!("No ACH entries produced; no file written");
        }
        Err(e) => {
            eprintln!("Error rendering NACHA file: {e}");
            process::exit(1);
        }
    }

    if let Err(e) = write_journal(&ledger, std::io::stdout()) {
        eprintln!("Error writing journal: {e}");
        process::exit(1);
    }
}

fn open(path: &PathBuf) -> Result<File, String> {
    File::open(path).map_err(|e| format!("cannot open '{}': {e}", path.display()))
}

/// Raw CSV record for one employee bank profile.
#[derive(Debug, Deserialize)]
struct ProfileRecord {
    employee_id: u32,
    name: String,
    individual_id: String,
    routing_number: String,
    account_number: String,
    account_type: AccountType,
    pay_preference: PayPreference,
}

impl From<ProfileRecord> for EmployeeBankProfile {
    fn from(record: ProfileRecord) -> Self {
        EmployeeBankProfile {
            employee_id: EmployeeId(record.employee_id),
            name: record.name,
            individual_id: record.individual_id,
            routing_number: record.routing_number,
            account_number: record.account_number,
            account_type: record.account_type,
            pay_preference: record.pay_preference,
        }
    }
}

/// Raw CSV record for one payout event.
#[derive(Debug, Deserialize)]
struct PayoutRecord {
    employee_id: u32,
    wallet: String,
    token: String,
    amount_base_units: String,
    pay_time: i64,
}

impl From<PayoutRecord> for PayoutEvent {
    fn from(record: PayoutRecord) -> Self {
        PayoutEvent {
            employee_id: EmployeeId(record.employee_id),
            wallet: record.wallet,
            token: record.token,
            amount_base_units: record.amount_base_units,
            pay_time: record.pay_time,
        }
    }
}

/// Loads employee profiles into the directory, returning how many loaded.
///
/// Malformed rows are logged and skipped; a profile row never aborts the run.
fn load_profiles<R: Read>(reader: R, directory: &MemoryDirectory) -> Result<usize, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let mut count = 0;
    for result in rdr.deserialize::<ProfileRecord>() {
        match result {
            Ok(record) => {
                directory.insert(record.into());
                count += 1;
            }
            Err(e) => {
                warn!("skipping malformed profile row: {e}");
            }
        }
    }
    Ok(count)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct PayoutStats {
    reconciled: usize,
    skipped: usize,
    failed: usize,
}

/// Streams payout events through the engine.
///
/// Skips (non-ACH preference, unknown employees, redeliveries, zero amounts)
/// and per-event errors are counted and logged but never stop the run,
/// matching the at-least-once delivery contract of the chain subscription.
fn process_payouts<R: Read>(reader: R, engine: &Engine) -> Result<PayoutStats, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let mut stats = PayoutStats::default();
    for result in rdr.deserialize::<PayoutRecord>() {
        match result {
            Ok(record) => {
                let event: PayoutEvent = record.into();
                match engine.handle_payout(&event) {
                    Ok(Some(_)) => stats.reconciled += 1,
                    Ok(None) => stats.skipped += 1,
                    Err(e) => {
                        warn!(employee = %event.employee_id, "payout failed: {e}");
                        stats.failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!("skipping malformed payout row: {e}");
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

/// One journal line flattened for CSV output.
#[derive(Debug, Serialize)]
struct JournalRow {
    timestamp: String,
    memo: String,
    account: String,
    side: &'static str,
    amount: Decimal,
    entity: String,
}

/// Writes the posted journal as CSV, one row per line.
///
/// Amounts are dollars with two decimal places.
fn write_journal<W: std::io::Write>(ledger: &MemoryLedger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for entry in ledger.entries() {
        for line in &entry.lines {
            wtr.serialize(JournalRow {
                timestamp: entry.timestamp.to_rfc3339(),
                memo: entry.memo.clone(),
                account: line.account.clone(),
                side: match line.side {
                    Side::Debit => "D",
                    Side::Credit => "C",
                },
                amount: line.amount.to_decimal(),
                entity: line.entity.clone(),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ach_payroll_rs::BankDirectory;
    use std::io::Cursor;

    fn directory_with_csv(csv: &str) -> (Arc<MemoryDirectory>, usize) {
        let directory = Arc::new(MemoryDirectory::new());
        let count = load_profiles(Cursor::new(csv), &directory).unwrap();
        (directory, count)
    }

    fn test_engine(directory: Arc<MemoryDirectory>, ledger: Arc<MemoryLedger>) -> Engine {
        let config = EngineConfig {
            file_header: FileHeader {
                immediate_destination: "091000019".to_string(),
                immediate_origin: "123456780".to_string(),
                destination_name: "TEST BANK".to_string(),
                origin_name: "ACME".to_string(),
                file_id_modifier: 'A',
                reference_code: String::new(),
            },
            company_name: "ACME".to_string(),
            company_id: "1234567890".to_string(),
            entry_description: "PAYROLL".to_string(),
            odfi_id: "09100001".to_string(),
            token_decimals: HashMap::from([("0xusdc".to_string(), 6)]),
            conversion_mode: ConversionMode::Stable1To1,
        };
        Engine::new(config, directory, ledger).unwrap()
    }

    const PROFILES: &str = "\
employee_id,name,individual_id,routing_number,account_number,account_type,pay_preference
1,Ada Lovelace,EMP-1,123456780,1001,CHECKING,ACH
2,Satoshi,EMP-2,123456780,1002,SAVINGS,ONCHAIN
";

    #[test]
    fn parse_employee_profiles() {
        let (directory, count) = directory_with_csv(PROFILES);
        assert_eq!(count, 2);
        let ada = directory.lookup(EmployeeId(1)).unwrap();
        assert_eq!(ada.account_type, AccountType::Checking);
        assert_eq!(ada.pay_preference, PayPreference::Ach);
    }

    #[test]
    fn malformed_profile_rows_are_skipped() {
        let csv = "\
employee_id,name,individual_id,routing_number,account_number,account_type,pay_preference
1,Ada,EMP-1,123456780,1001,CHECKING,ACH
not,a,valid,row,at,all,here
";
        let (_, count) = directory_with_csv(csv);
        assert_eq!(count, 1);
    }

    #[test]
    fn payouts_stream_through_engine() {
        let (directory, _) = directory_with_csv(PROFILES);
        let ledger = Arc::new(MemoryLedger::new());
        let engine = test_engine(directory, ledger.clone());

        let payouts = "\
employee_id,wallet,token,amount_base_units,pay_time
1,0xaaa,0xusdc,1500000,1760000000
2,0xbbb,0xusdc,1000000,1760000000
9,0xccc,0xusdc,1000000,1760000000
";
        let stats = process_payouts(Cursor::new(payouts), &engine).unwrap();
        // One ACH credit; the on-chain preference and the unknown employee skip.
        assert_eq!(
            stats,
            PayoutStats {
                reconciled: 1,
                skipped: 2,
                failed: 0
            }
        );
        assert_eq!(engine.pending(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn unknown_token_counts_as_failure() {
        let (directory, _) = directory_with_csv(PROFILES);
        let engine = test_engine(directory, Arc::new(MemoryLedger::new()));

        let payouts = "\
employee_id,wallet,token,amount_base_units,pay_time
1,0xaaa,0xmystery,1500000,1760000000
";
        let stats = process_payouts(Cursor::new(payouts), &engine).unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn journal_csv_has_one_row_per_line() {
        let (directory, _) = directory_with_csv(PROFILES);
        let ledger = Arc::new(MemoryLedger::new());
        let engine = test_engine(directory, ledger.clone());

        let payouts = "\
employee_id,wallet,token,amount_base_units,pay_time
1,0xaaa,0xusdc,1500000,1760000000
";
        process_payouts(Cursor::new(payouts), &engine).unwrap();

        let mut output = Vec::new();
        write_journal(&ledger, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3); // header + debit + credit
        assert!(lines[0].starts_with("timestamp,memo,account,side,amount,entity"));
        assert!(lines[1].contains("payroll:expense"));
        assert!(lines[1].contains(",D,"));
        assert!(lines[1].contains("1.50"));
        assert!(lines[2].contains("ach:clearing"));
        assert!(lines[2].contains(",C,"));
    }

    #[test]
    fn token_spec_parsing() {
        assert_eq!(
            parse_token_spec("0xabc=6").unwrap(),
            ("0xabc".to_string(), 6)
        );
        assert!(parse_token_spec("0xabc").is_err());
        assert!(parse_token_spec("0xabc=six").is_err());
    }
}
