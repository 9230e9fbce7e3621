// lottery-core/src/types.rs

use crate::{CoreError, CoreResult};
use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Block number/height
pub type BlockNumber = u64;

/// Account nonce
pub type Nonce = u64;

/// Gas price in wei per unit of gas
pub type GasPrice = u64;

/// Gas limit/used
pub type Gas = u64;

/// Timestamp in Unix epoch seconds
pub type Timestamp = u64;

/// Decimal places of one ether
pub const ETHER_DECIMALS: u32 = 18;

/// Wei in one gwei
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Native value amount in wei (arbitrary precision)
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(BigUint);

impl Amount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(BigUint::from(value))
    }

    /// Whole ether (1 ether = 10^18 wei)
    pub fn from_ether(ether: u64) -> Self {
        Self(BigUint::from(ether) * wei_per_ether())
    }

    /// Parse a decimal ether string such as `"0.02"` or `"3"`.
    ///
    /// More than 18 fractional digits cannot be represented in wei and is
    /// rejected rather than rounded.
    pub fn parse_ether(value: &str) -> CoreResult<Self> {
        let decimal = Decimal::from_str(value.trim())
            .map_err(|e| CoreError::InvalidAmount(format!("{value:?}: {e}")))?;

        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err(CoreError::InvalidAmount(format!("{value:?} is negative")));
        }
        if decimal.scale() > ETHER_DECIMALS {
            return Err(CoreError::InvalidAmount(format!(
                "{value:?} has more than {ETHER_DECIMALS} decimal places"
            )));
        }

        let mantissa = BigUint::from(decimal.mantissa().unsigned_abs());
        let factor = BigUint::from(10u32).pow(ETHER_DECIMALS - decimal.scale());
        Ok(Self(mantissa * factor))
    }

    /// Cost of `gas` units at `gas_price` wei each
    pub fn fee(gas: Gas, gas_price: GasPrice) -> Self {
        Self::from_u128(gas as u128 * gas_price as u128)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        Some(Amount(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    /// Render as an ether decimal string without trailing zeros
    pub fn to_ether_string(&self) -> String {
        let unit = wei_per_ether();
        let whole = &self.0 / &unit;
        let fraction = &self.0 % &unit;

        if fraction.is_zero() {
            return whole.to_string();
        }

        let digits = format!("{:0>width$}", fraction.to_string(), width = ETHER_DECIMALS as usize);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

fn wei_per_ether() -> BigUint {
    BigUint::from(10u32).pow(ETHER_DECIMALS)
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, other: &'a Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, x| &acc + x)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
