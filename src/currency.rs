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

//! Token-amount to currency-cents conversion.
//!
//! Conversion is pure integer arithmetic on `u128`. Token amounts arrive as
//! decimal strings of base units plus a decimal precision; a 1:1 stable
//! conversion divides by `10^(decimals - 2)` and rounds half away from zero.
//! No floating point is involved at any magnitude.

use crate::base::Cents;
use crate::error::AchError;
use serde::{Deserialize, Serialize};

/// Largest supported token decimal precision.
pub const MAX_TOKEN_DECIMALS: u32 = 36;

/// A token amount as received from the chain: integer base units plus the
/// token's decimal precision. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    /// Base units as a decimal digit string (e.g. `"1500000"` for 1.5 units
    /// of a 6-decimal token).
    pub base_units: String,
    /// Number of decimal places in the token's smallest unit.
    pub decimals: u32,
}

/// How a token value maps to fiat currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionMode {
    /// The token is a stablecoin: one whole token equals one currency unit.
    Stable1To1,
    /// Price-feed conversion. Unimplemented; requesting it is a
    /// configuration error, not a retryable condition.
    Oracle,
}

/// Converts a token amount to whole cents.
///
/// # Errors
///
/// - [`AchError::OracleUnsupported`] for [`ConversionMode::Oracle`].
/// - [`AchError::InvalidBaseUnits`] if `base_units` is empty or non-numeric.
/// - [`AchError::DecimalsOutOfRange`] if `decimals` exceeds 36.
/// - [`AchError::AmountOverflow`] if the result does not fit in cents.
pub fn convert_to_cents(amount: &TokenAmount, mode: ConversionMode) -> Result<Cents, AchError> {
    match mode {
        ConversionMode::Oracle => Err(AchError::OracleUnsupported),
        ConversionMode::Stable1To1 => stable_to_cents(amount),
    }
}

fn stable_to_cents(amount: &TokenAmount) -> Result<Cents, AchError> {
    if amount.decimals > MAX_TOKEN_DECIMALS {
        return Err(AchError::DecimalsOutOfRange);
    }
    let units = parse_base_units(&amount.base_units)?;

    // cents = base_units / 10^(decimals - 2), rounded half away from zero.
    // For fewer than two decimals the value scales up instead.
    let cents: u128 = if amount.decimals >= 2 {
        let divisor = 10u128.pow(amount.decimals - 2);
        let quotient = units / divisor;
        let remainder = units % divisor;
        if remainder * 2 >= divisor {
            quotient + 1
        } else {
            quotient
        }
    } else {
        let factor = 10u128.pow(2 - amount.decimals);
        units.checked_mul(factor).ok_or(AchError::AmountOverflow)?
    };

    i64::try_from(cents)
        .map(Cents)
        .map_err(|_| AchError::AmountOverflow)
}

/// Parses a base-unit digit string into `u128`.
///
/// `u128` holds 38 decimal digits, beyond any practical ERC-20 supply;
/// larger inputs are an explicit overflow error, never silently truncated.
fn parse_base_units(value: &str) -> Result<u128, AchError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AchError::InvalidBaseUnits);
    }
    value.parse().map_err(|_| AchError::AmountOverflow)
}
