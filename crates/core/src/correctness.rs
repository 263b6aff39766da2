// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Ferrum Trading Systems. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Functions for correctness checks similar to the *design by contract* philosophy.
//!
//! A condition is a predicate which must hold just prior to the execution of some section of
//! code for correct behavior. An [`anyhow::Result`] is returned with a descriptive message when
//! the condition check fails.

/// A message prefix used alongside assertion-style calls to keep failure messages consistent.
pub const FAILED: &str = "Condition failed";

/// Checks that `predicate` is true.
///
/// # Errors
///
/// Returns an error if the predicate does not hold.
#[inline(always)]
pub fn check_predicate_true(predicate: bool, fail_msg: &str) -> anyhow::Result<()> {
    if !predicate {
        anyhow::bail!("{fail_msg}")
    }
    Ok(())
}

/// Checks that `value` is not empty.
///
/// # Errors
///
/// Returns an error if `value` is empty.
#[inline(always)]
pub fn check_non_empty_string(value: &str, param: &str) -> anyhow::Result<()> {
    check_predicate_true(!value.is_empty(), &format!("{param} was empty"))
}

/// Checks that `value` is strictly positive.
///
/// # Errors
///
/// Returns an error if `value <= 0`.
#[inline(always)]
pub fn check_positive(value: rust_decimal::Decimal, param: &str) -> anyhow::Result<()> {
    check_predicate_true(
        value > rust_decimal::Decimal::ZERO,
        &format!("{param} was not positive, was {value}"),
    )
}

/// Checks that `value` is non-negative.
///
/// # Errors
///
/// Returns an error if `value < 0`.
#[inline(always)]
pub fn check_non_negative(value: rust_decimal::Decimal, param: &str) -> anyhow::Result<()> {
    check_predicate_true(
        value >= rust_decimal::Decimal::ZERO,
        &format!("{param} was negative, was {value}"),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn predicate_true_passes() {
        assert!(check_predicate_true(true, "unreachable").is_ok());
    }

    #[test]
    fn predicate_true_fails() {
        assert!(check_predicate_true(false, "bad").is_err());
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(check_positive(dec!(0), "volume").is_err());
        assert!(check_positive(dec!(1), "volume").is_ok());
    }

    #[test]
    fn non_negative_allows_zero() {
        assert!(check_non_negative(dec!(0), "volume").is_ok());
        assert!(check_non_negative(dec!(-1), "volume").is_err());
    }
}
