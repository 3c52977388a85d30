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

//! Error types for the reconciliation and encoding pipeline.
//!
//! Configuration and data-validation problems fail fast; lookup misses and
//! non-ACH pay preferences are silent skips and never surface here.

use thiserror::Error;

/// Reconciliation and NACHA encoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AchError {
    /// Token base-unit string contains non-digit characters or is empty
    #[error("token amount is not an unsigned decimal integer")]
    InvalidBaseUnits,

    /// Token decimal precision exceeds the supported range
    #[error("token decimals out of range (max 36)")]
    DecimalsOutOfRange,

    /// Converted amount does not fit a signed 64-bit cent value
    #[error("converted amount overflows cents range")]
    AmountOverflow,

    /// Oracle conversion mode has no price feed wired up
    #[error("oracle conversion mode is not implemented")]
    OracleUnsupported,

    /// No decimal precision configured for the payout token
    #[error("no decimals configured for token {0}")]
    UnknownToken(String),

    /// Payout event carries an unrepresentable timestamp
    #[error("payout timestamp is out of range")]
    InvalidPayTime,

    /// Routing number is not exactly nine digits
    #[error("routing number must be exactly 9 digits")]
    InvalidRoutingNumber,

    /// File ID modifier is not an uppercase ASCII letter
    #[error("file ID modifier must be an uppercase letter")]
    InvalidFileIdModifier,

    /// Entry amount is zero or negative
    #[error("entry amount must be positive")]
    InvalidAmount,

    /// A numeric record field contains non-digit characters
    #[error("non-numeric value in field `{field}`")]
    NonNumericField { field: &'static str },

    /// A numeric record field value does not fit its column width
    #[error("value too wide for field `{field}`")]
    NumericOverflow { field: &'static str },

    /// File assembly was requested with no entries to render
    #[error("cannot render a NACHA file with no entries")]
    EmptyBatch,
}
