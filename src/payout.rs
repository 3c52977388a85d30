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

//! Payout events and employee banking profiles.
//!
//! These types mirror the two external collaborators: the on-chain payout
//! subscription (which delivers [`PayoutEvent`]s at least once) and the
//! bank-profile store (queried read-only through [`BankDirectory`]).

use crate::base::EmployeeId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Destination account type, which selects the ACH transaction code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    /// NACHA transaction code for a credit to this account type.
    pub fn transaction_code(self) -> &'static str {
        match self {
            AccountType::Checking => "22",
            AccountType::Savings => "32",
        }
    }
}

/// How the employee has elected to be paid.
///
/// Only `Ach` routes through this pipeline; on-chain settlement bypasses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayPreference {
    Ach,
    #[serde(rename = "ONCHAIN")]
    OnChain,
}

/// Banking destination for one employee, consumed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeBankProfile {
    pub employee_id: EmployeeId,
    pub name: String,
    /// Identifier printed in the entry's individual-ID field (≤15 chars).
    pub individual_id: String,
    /// Nine-digit ABA routing number of the receiving bank.
    pub routing_number: String,
    /// Account number at the receiving bank (≤17 chars).
    pub account_number: String,
    pub account_type: AccountType,
    pub pay_preference: PayPreference,
}

/// A finalized on-chain payout, as delivered by the chain subscription.
///
/// Delivery is at-least-once; the reconciler deduplicates on
/// `(employee_id, pay_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEvent {
    pub employee_id: EmployeeId,
    /// Recipient wallet address (informational; not used for ACH routing).
    pub wallet: String,
    /// Token contract address, used to look up the configured decimals.
    pub token: String,
    /// Paid amount in token base units, as a decimal string.
    pub amount_base_units: String,
    /// Unix timestamp of the on-chain payout.
    pub pay_time: i64,
}

/// Read-only lookup of employee banking profiles.
///
/// Implemented by the external profile store; [`MemoryDirectory`] is the
/// in-process implementation used by the CLI and tests.
pub trait BankDirectory: Send + Sync {
    fn lookup(&self, employee_id: EmployeeId) -> Option<EmployeeBankProfile>;
}

/// In-memory [`BankDirectory`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    profiles: DashMap<EmployeeId, EmployeeBankProfile>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn insert(&self, profile: EmployeeBankProfile) {
        self.profiles.insert(profile.employee_id, profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl BankDirectory for MemoryDirectory {
    fn lookup(&self, employee_id: EmployeeId) -> Option<EmployeeBankProfile> {
        self.profiles.get(&employee_id).map(|p| p.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u32) -> EmployeeBankProfile {
        EmployeeBankProfile {
            employee_id: EmployeeId(id),
            name: "Ada Lovelace".to_string(),
            individual_id: format!("EMP-{id}"),
            routing_number: "123456789".to_string(),
            account_number: "000123456".to_string(),
            account_type: AccountType::Checking,
            pay_preference: PayPreference::Ach,
        }
    }

    #[test]
    fn transaction_codes_match_account_type() {
        assert_eq!(AccountType::Checking.transaction_code(), "22");
        assert_eq!(AccountType::Savings.transaction_code(), "32");
    }

    #[test]
    fn directory_lookup_returns_inserted_profile() {
        let dir = MemoryDirectory::new();
        dir.insert(profile(7));
        let found = dir.lookup(EmployeeId(7)).unwrap();
        assert_eq!(found.individual_id, "EMP-7");
        assert!(dir.lookup(EmployeeId(8)).is_none());
    }

    #[test]
    fn pay_preference_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&PayPreference::OnChain).unwrap(),
            "\"ONCHAIN\""
        );
        assert_eq!(serde_json::to_string(&PayPreference::Ach).unwrap(), "\"ACH\"");
        assert_eq!(
            serde_json::to_string(&AccountType::Savings).unwrap(),
            "\"SAVINGS\""
        );
    }
}
