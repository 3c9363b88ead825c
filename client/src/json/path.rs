//! Paths into nested values, written as `translation.x` or `children[2].name`

use std::fmt;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res, opt};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};

use super::Json;
use crate::error::{Error, Result};

/// One step of a [`JsonPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// A sequence of keys and positions addressing a nested value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    /// The empty path, addressing the value itself
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend with an object member
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Extend with an array element
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Segments from outermost to innermost
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this path addresses the value itself
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

fn key(input: &str) -> IResult<&str, PathSegment> {
    take_while1(|c: char| c != '.' && c != '[' && c != ']')
        .map(|key: &str| PathSegment::Key(key.to_string()))
        .parse(input)
}

fn index(input: &str) -> IResult<&str, PathSegment> {
    map_res(delimited(char('['), digit1, char(']')), |digits: &str| {
        digits.parse::<usize>().map(PathSegment::Index)
    })
    .parse(input)
}

fn path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    pair(opt(key), many0(alt((preceded(char('.'), key), index))))
        .map(|(first, rest)| first.into_iter().chain(rest).collect())
        .parse(input)
}

impl FromStr for JsonPath {
    type Err = error_stack::Report<Error>;

    fn from_str(input: &str) -> Result<Self> {
        all_consuming(path)
            .parse(input)
            .map(|(_, segments)| Self(segments))
            .map_err(|e| error_stack::Report::new(Error::invalid("path", format!("{input}: {e:?}"))))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Json {
    /// Value at `path`, `Undefined` when any step is missing
    pub fn at(&self, path: &JsonPath) -> &Self {
        path.0.iter().fold(self, |value, segment| match segment {
            PathSegment::Key(key) => value.get_key(key),
            PathSegment::Index(index) => value.get_index(*index),
        })
    }

    /// Mutable value at `path` if every step exists
    pub fn at_mut(&mut self, path: &JsonPath) -> Option<&mut Self> {
        let mut value = self;
        for segment in &path.0 {
            value = match segment {
                PathSegment::Key(key) => value.as_object_mut()?.get_mut(key)?,
                PathSegment::Index(index) => value.as_array_mut()?.get_mut(*index)?,
            };
        }
        Some(value)
    }

    /// Write `value` at `path`
    ///
    /// The parent of the last step must already exist; otherwise nothing
    /// changes. The last step follows `set_key` / `set_index` rules.
    pub fn set_at(&mut self, path: &JsonPath, value: impl Into<Self>) {
        let Some((last, parents)) = path.0.split_last() else {
            *self = value.into();
            return;
        };
        let mut parent = self;
        for segment in parents {
            let next = match segment {
                PathSegment::Key(key) => parent.as_object_mut().and_then(|m| m.get_mut(key)),
                PathSegment::Index(index) => {
                    parent.as_array_mut().and_then(|items| items.get_mut(*index))
                },
            };
            let Some(next) = next else {
                return;
            };
            parent = next;
        }
        match last {
            PathSegment::Key(key) => parent.set_key(key.clone(), value),
            PathSegment::Index(index) => parent.set_index(*index, value),
        }
    }
}
