//! 🔢 Numbers that may arrive as text.
//!
//! Environment variables are always strings, TOML numbers are always numbers, and a
//! chunk size of `"500"` should mean the same thing as `500`. These helpers plug into
//! `#[serde(deserialize_with = ...)]` on the numeric knobs.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    fn into_number<T, E>(self) -> Result<T, E>
    where
        T: TryFrom<u64> + FromStr,
        E: serde::de::Error,
    {
        match self {
            NumberOrText::Number(n) => T::try_from(n).map_err(|_| E::custom(format!("{n} is out of range"))),
            NumberOrText::Text(text) => {
                let trimmed = text.trim();
                trimmed
                    .parse::<T>()
                    .map_err(|_| E::custom(format!("expected a whole number, found '{trimmed}'")))
            }
        }
    }
}

/// 🔢 A whole number, written either as a number or as text.
pub(crate) fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + FromStr,
{
    NumberOrText::deserialize(deserializer)?.into_number()
}

/// Same as [`number`], for knobs that may be left out.
pub(crate) fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + FromStr,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_number::<T, D::Error>)
        .transpose()
}
