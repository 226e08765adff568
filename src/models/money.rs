use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Tzs,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Tzs => "TZS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TZS" => Some(Currency::Tzs),
            _ => None,
        }
    }

    /// Minor units per whole unit.
    pub fn minor_per_unit(&self) -> i64 {
        match self {
            Currency::Tzs => 100,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::Tzs => "TSh",
        }
    }
}

/// An amount in integer minor units of its currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    pub minor: i64,
    pub currency: Currency,
}

impl Money {
    pub const fn zero() -> Self {
        Self {
            minor: 0,
            currency: Currency::Tzs,
        }
    }

    pub const fn from_minor(minor: i64) -> Self {
        Self {
            minor,
            currency: Currency::Tzs,
        }
    }

    /// Whole shillings.
    pub const fn tzs(whole: i64) -> Self {
        Self::from_minor(whole * 100)
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Whole units, rounded half-up.
    pub fn whole_units(&self) -> i64 {
        let per = self.currency.minor_per_unit();
        (self.minor + per / 2).div_euclid(per)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Money {
            minor: self.minor + rhs.minor,
            currency: self.currency,
        }
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per = self.currency.minor_per_unit();
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.abs();
        let whole = group_thousands(abs / per);
        let cents = abs % per;
        if cents == 0 {
            write!(f, "{} {sign}{whole}", self.currency.symbol())
        } else {
            write!(f, "{} {sign}{whole}.{cents:02}", self.currency.symbol())
        }
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
