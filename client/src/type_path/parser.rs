//! Parser for Rust type paths as reported by the reflection registry
//!
//! Handles the shapes that show up in practice:
//! - `bevy_transform::components::transform::Transform`
//! - `core::option::Option<bevy_asset::handle::Handle<bevy_mesh::mesh::Mesh>>`
//! - `[glam::Vec3; 2]` and `(f32, glam::Vec2)`
//! - `my_crate::Shape::Circle`, the payload type synthesized for an enum variant

use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, opt};
use nom::multi::{separated_list0, separated_list1};
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::{IResult, Parser};

/// A parsed type expression borrowing from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr<'a> {
    /// `a::b::Name<Generics>` with an optional trailing `::Variant`
    Path {
        /// `::`-separated segments, the type name last
        segments: Vec<&'a str>,
        /// Generic arguments
        generics: Vec<Self>,
        /// Trailing `::Variant` after the generics
        variant:  Option<&'a str>,
    },
    /// `[T; N]`
    Array {
        /// Element type
        element: Box<Self>,
        /// Length as written
        len:     &'a str,
    },
    /// `(A, B, ...)`
    Tuple(Vec<Self>),
}

impl<'a> TypeExpr<'a> {
    /// Segments leading up to the type name, `None` for arrays and tuples
    pub fn module_segments(&self) -> Option<&[&'a str]> {
        match self {
            Self::Path { segments, .. } => segments.split_last().map(|(_, module)| module),
            Self::Array { .. } | Self::Tuple(_) => None,
        }
    }

    /// The bare type name, with no generics and no variant
    pub fn name(&self) -> Option<&'a str> {
        match self {
            Self::Path { segments, .. } => segments.last().copied(),
            Self::Array { .. } | Self::Tuple(_) => None,
        }
    }
}

/// Renders every path by its last segment, keeping generic structure
impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path {
                segments,
                generics,
                variant,
            } => {
                f.write_str(segments.last().copied().unwrap_or_default())?;
                if !generics.is_empty() {
                    f.write_str("<")?;
                    write_list(f, generics)?;
                    f.write_str(">")?;
                }
                if let Some(variant) = variant {
                    write!(f, "::{variant}")?;
                }
                Ok(())
            },
            Self::Array { element, len } => write!(f, "[{element}; {len}]"),
            Self::Tuple(elements) => {
                f.write_str("(")?;
                write_list(f, elements)?;
                if elements.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            },
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr<'_>]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Parse an identifier (alphanumeric + underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0).parse(input)
}

fn type_list(input: &str) -> IResult<&str, Vec<TypeExpr<'_>>> {
    terminated(separated_list0(comma, type_expr), opt(comma)).parse(input)
}

fn path_expr(input: &str) -> IResult<&str, TypeExpr<'_>> {
    let (input, segments) = separated_list1(tag("::"), identifier).parse(input)?;
    let (input, generics) = opt(delimited(char('<'), type_list, char('>'))).parse(input)?;
    let (input, variant) = match generics {
        Some(_) => opt(preceded(tag("::"), identifier)).parse(input)?,
        None => (input, None),
    };
    Ok((
        input,
        TypeExpr::Path {
            segments,
            generics: generics.unwrap_or_default(),
            variant,
        },
    ))
}

fn array_expr(input: &str) -> IResult<&str, TypeExpr<'_>> {
    delimited(
        char('['),
        separated_pair(type_expr, (multispace0, char(';'), multispace0), digit1),
        char(']'),
    )
    .map(|(element, len)| TypeExpr::Array {
        element: Box::new(element),
        len,
    })
    .parse(input)
}

fn tuple_expr(input: &str) -> IResult<&str, TypeExpr<'_>> {
    delimited(char('('), type_list, char(')'))
        .map(TypeExpr::Tuple)
        .parse(input)
}

fn type_expr(input: &str) -> IResult<&str, TypeExpr<'_>> {
    alt((array_expr, tuple_expr, path_expr)).parse(input)
}

/// Parse a complete type path, failing on trailing input
pub fn parse_type_path(input: &str) -> Result<TypeExpr<'_>, String> {
    all_consuming(type_expr)
        .parse(input.trim())
        .map(|(_, expr)| expr)
        .map_err(|e| format!("Failed to parse type path {input}: {e:?}"))
}

/// Strip module paths everywhere, keeping generic structure
///
/// Falls back to the text after the last `::` when the input is not a
/// recognizable type path.
pub fn simplify_type(input: &str) -> String {
    parse_type_path(input).map_or_else(
        |_| input.rsplit("::").next().unwrap_or(input).to_string(),
        |expr| expr.to_string(),
    )
}
