//! Fluent construction of [`Query`] values and structural column injection

use std::collections::HashSet;

use super::columns::STRUCTURAL;
use super::model::{ComponentSelector, Query};
use super::result::QueryResult;
use crate::type_path::TypePath;

fn push_unique(list: &mut Vec<TypePath>, path: TypePath) {
    if !list.contains(&path) {
        list.push(path);
    }
}

/// Builder for [`Query`]; every method consumes and returns the builder
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Builder for a query matching every entity
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `component` and fetch its value
    pub fn component(mut self, component: impl Into<TypePath>) -> Self {
        push_unique(&mut self.query.data.components, component.into());
        self
    }

    /// Require and fetch every component in `components`
    pub fn components<I, T>(self, components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypePath>,
    {
        components.into_iter().fold(self, Self::component)
    }

    /// Fetch `component` when present
    ///
    /// Has no effect once [`Self::all_optional`] was called.
    pub fn optional(mut self, component: impl Into<TypePath>) -> Self {
        if let ComponentSelector::Paths(paths) = &mut self.query.data.option {
            push_unique(paths, component.into());
        }
        self
    }

    /// Fetch every component in `components` when present
    pub fn optional_components<I, T>(self, components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypePath>,
    {
        components.into_iter().fold(self, Self::optional)
    }

    /// Fetch every reflectable component present on each entity
    pub fn all_optional(mut self) -> Self {
        self.query.data.option = ComponentSelector::All;
        self
    }

    /// Report whether each entity has `component`
    pub fn has(mut self, component: impl Into<TypePath>) -> Self {
        push_unique(&mut self.query.data.has, component.into());
        self
    }

    /// Report whether each entity has each of `components`
    pub fn has_components<I, T>(self, components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypePath>,
    {
        components.into_iter().fold(self, Self::has)
    }

    /// Only entities with `component`
    pub fn with(mut self, component: impl Into<TypePath>) -> Self {
        push_unique(&mut self.query.filter.with, component.into());
        self
    }

    /// Only entities with every component in `components`
    pub fn with_components<I, T>(self, components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypePath>,
    {
        components.into_iter().fold(self, Self::with)
    }

    /// Only entities without `component`
    pub fn without(mut self, component: impl Into<TypePath>) -> Self {
        push_unique(&mut self.query.filter.without, component.into());
        self
    }

    /// Only entities with none of `components`
    pub fn without_components<I, T>(self, components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypePath>,
    {
        components.into_iter().fold(self, Self::without)
    }

    /// Fail the query when a requested component is missing or unregistered
    pub const fn strict(mut self, strict: bool) -> Self {
        self.query.strict = strict;
        self
    }

    /// The accumulated query
    pub fn build(self) -> Query {
        self.query
    }

    /// Build and inject the hierarchy columns, see [`Query::with_structure`]
    pub fn with_structure(self) -> StructuredQuery {
        self.query.with_structure()
    }
}

impl From<QueryBuilder> for Query {
    fn from(builder: QueryBuilder) -> Self {
        builder.build()
    }
}

/// A query whose hierarchy columns were injected, with the columns to hide
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredQuery {
    /// Query to send
    pub query:    Query,
    /// Injected columns the caller did not ask for
    pub excluded: HashSet<TypePath>,
}

impl StructuredQuery {
    /// Mark the injected columns as hidden on `result`
    pub fn present(&self, result: QueryResult) -> QueryResult {
        result.excluding(self.excluded.clone())
    }
}

impl Query {
    /// Start a [`QueryBuilder`]
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Also fetch `Name`, `Children` and `ChildOf` so rows can be arranged as a tree
    ///
    /// The structural columns are appended to `option` without duplicates.
    /// Any of them the caller did not already request, mandatorily or
    /// optionally, is returned in `excluded` so it can be hidden from display.
    pub fn with_structure(mut self) -> StructuredQuery {
        let excluded: HashSet<TypePath> = STRUCTURAL
            .iter()
            .filter(|column| !self.data.fetches(column))
            .map(|column| TypePath::from(*column))
            .collect();

        if let ComponentSelector::Paths(paths) = &mut self.data.option {
            for column in STRUCTURAL {
                if !self.data.components.iter().any(|c| c.as_str() == column) {
                    push_unique(paths, TypePath::from(column));
                }
            }
        }

        StructuredQuery {
            query: self,
            excluded,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::columns::{CHILD_OF, CHILDREN, NAME};

    const TRANSFORM: &str = "bevy_transform::components::transform::Transform";

    #[test]
    fn test_builder_produces_wire_form() {
        let query = Query::builder()
            .component(TRANSFORM)
            .component(TRANSFORM)
            .optional("a::Velocity")
            .has("a::Player")
            .with("a::Visible")
            .without("a::Hidden")
            .strict(true)
            .build();
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "data": {
                    "components": [TRANSFORM],
                    "option": ["a::Velocity"],
                    "has": ["a::Player"]
                },
                "filter": {"with": ["a::Visible"], "without": ["a::Hidden"]},
                "strict": true
            })
        );
    }

    #[test]
    fn test_list_forms_match_single_forms() {
        let listed = Query::builder()
            .components([TRANSFORM, "a::Mass"])
            .optional_components(["a::Velocity", "a::Velocity"])
            .has_components(["a::Player"])
            .with_components(["a::Visible", "a::Active"])
            .without_components(["a::Hidden"])
            .build();
        let single = Query::builder()
            .component(TRANSFORM)
            .component("a::Mass")
            .optional("a::Velocity")
            .has("a::Player")
            .with("a::Visible")
            .with("a::Active")
            .without("a::Hidden")
            .build();
        assert_eq!(listed, single);
    }

    #[test]
    fn test_all_optional_ignores_later_optional() {
        let query = Query::builder().all_optional().optional("a::B").build();
        assert_eq!(query.data.option, ComponentSelector::All);
    }

    #[test]
    fn test_structure_is_injected_and_excluded() {
        let structured = Query::builder().component(TRANSFORM).with_structure();
        assert_eq!(
            structured.query.data.option,
            ComponentSelector::Paths(vec![NAME.into(), CHILDREN.into(), CHILD_OF.into()])
        );
        assert_eq!(
            structured.excluded,
            HashSet::from([NAME.into(), CHILDREN.into(), CHILD_OF.into()])
        );
    }

    #[test]
    fn test_requested_structure_stays_visible() {
        let structured = Query::builder()
            .component(NAME)
            .optional(CHILDREN)
            .with_structure();
        assert_eq!(structured.query.data.components, vec![TypePath::from(NAME)]);
        assert_eq!(
            structured.query.data.option,
            ComponentSelector::Paths(vec![CHILDREN.into(), CHILD_OF.into()])
        );
        assert_eq!(structured.excluded, HashSet::from([CHILD_OF.into()]));
    }

    #[test]
    fn test_all_optional_needs_no_injection() {
        let structured = Query::builder().all_optional().with_structure();
        assert_eq!(structured.query.data.option, ComponentSelector::All);
        assert!(structured.excluded.is_empty());
    }

    #[test]
    fn test_present_hides_excluded_columns() {
        let structured = Query::builder().component(TRANSFORM).with_structure();
        let result: QueryResult = serde_json::from_value(json!([
            {"entity": 1, "components": {(TRANSFORM): {}, (NAME): "A"}}
        ]))
        .unwrap();
        let result = structured.present(result);
        let names: Vec<String> = result
            .display_columns()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["Transform"]);
        assert_eq!(result.columns().len(), 2);
    }
}
