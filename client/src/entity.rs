//! Entity identifiers as they travel over BRP
//!
//! On the wire an entity is a single `u64`. The low 32 bits hold the bitwise
//! complement of the row (the remote app stores rows as non-max integers) and
//! the high 32 bits hold the generation.

use std::fmt;
use std::str::FromStr;

use nom::character::complete::{char, u32 as decimal_u32};
use nom::combinator::all_consuming;
use nom::sequence::separated_pair;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An entity in the remote world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Pack a row and generation
    pub const fn new(row: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (!row) as u64)
    }

    /// Wrap a packed wire value
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The packed wire value
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Row within the remote entity table
    #[allow(clippy::cast_possible_truncation, reason = "keeps the low 32 bits")]
    pub const fn row(self) -> u32 {
        !(self.0 as u32)
    }

    /// How many times the row has been reused
    #[allow(clippy::cast_possible_truncation, reason = "high 32 bits fit in u32")]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.row(), self.generation())
    }
}

fn row_and_generation(input: &str) -> IResult<&str, (u32, u32)> {
    separated_pair(decimal_u32, char('v'), decimal_u32).parse(input)
}

impl FromStr for Entity {
    type Err = error_stack::Report<Error>;

    fn from_str(input: &str) -> Result<Self> {
        let (_, (row, generation)) = all_consuming(row_and_generation)
            .parse(input)
            .map_err(|_| error_stack::Report::new(Error::invalid("entity", input)))?;
        Ok(Self::new(row, generation))
    }
}

impl From<Entity> for u64 {
    fn from(entity: Entity) -> Self {
        entity.to_bits()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_round_trip() {
        for (row, generation) in [(0, 0), (7, 1), (u32::MAX - 1, u32::MAX), (42, 3)] {
            let entity = Entity::new(row, generation);
            assert_eq!(entity.row(), row);
            assert_eq!(entity.generation(), generation);
            let parsed: Entity = entity.to_string().parse().unwrap();
            assert_eq!(parsed, entity);
        }
        assert_eq!(Entity::new(12, 1).to_string(), "12v1");
    }

    #[test]
    fn test_packing_matches_remote_layout() {
        // row 0 generation 1 is the first entity a fresh world hands out
        assert_eq!(Entity::new(0, 1).to_bits(), 0x0000_0001_FFFF_FFFF);
        assert_eq!(Entity::from_bits(0x0000_0002_FFFF_FFFE), Entity::new(1, 2));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "12", "v1", "12v", "12v1x", "-1v0", "12 v1"] {
            assert!(input.parse::<Entity>().is_err(), "{input} should not parse");
        }
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let entity = Entity::new(3, 1);
        let encoded = serde_json::to_string(&entity).unwrap();
        assert_eq!(encoded, entity.to_bits().to_string());
        let decoded: Entity = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, entity);
    }
}
