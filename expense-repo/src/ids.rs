use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> $name {
                $name(Uuid::new_v4())
            }

            pub const fn from_uuid(uuid: Uuid) -> $name {
                $name(uuid)
            }

            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                $name(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map($name)
            }
        }
    };
}

id_type!(UserId);
id_type!(ExpenseId);
id_type!(
    /// Also used as the tree identifier: a tree is identified by the id of its root.
    CategoryId
);
id_type!(ProductId);
id_type!(ProductCategoryId);
id_type!(PromotionId);
id_type!(PromotionRuleId);
id_type!(PromotionApplicableProductId);
id_type!(PromotionApplicableCategoryId);

/// Monetary amount stored as `NUMERIC(10,2)`.
///
/// Values are rounded to two decimal places (half away from zero, like PostgreSQL) and must have
/// at most 8 integer digits.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} does not fit in NUMERIC(10,2)")]
pub struct MoneyOutOfRange(pub Decimal);

impl Money {
    pub const SCALE: u32 = 2;
    pub const PRECISION: u32 = 10;

    pub fn new(value: Decimal) -> Result<Money, MoneyOutOfRange> {
        let rounded = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        let limit = Decimal::from(10_i64.pow(Self::PRECISION - Self::SCALE));
        if rounded.abs() >= limit {
            return Err(MoneyOutOfRange(value));
        }
        Ok(Money(rounded))
    }

    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyOutOfRange;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
