//! Two-pass import of a `registry.schema` response into a [`SchemaGraph`]
//!
//! The first pass creates a node for every identifier and copies its
//! metadata, so the second pass can link properties, variants and elements to
//! nodes that already exist regardless of registry order. The graph is built
//! privately and only handed out once both passes succeeded.

use std::collections::BTreeMap;

use error_stack::Report;
use tracing::{debug, error, warn};

use super::graph::{Property, SchemaGraph, Structure, TypeId, Variant};
use super::raw::{RawSchema, RawVariant, SchemaRef, SchemaShape};
use crate::error::{Error, Result};
use crate::json::Json;
use crate::type_path::TypePath;

/// Progress after each fully linked registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    /// Entries linked so far
    pub completed: usize,
    /// Entries in the registry
    pub total:     usize,
    /// Entry linked last
    pub current:   TypePath,
}

/// Import `registry` into a fresh graph
pub fn import(registry: &BTreeMap<TypePath, RawSchema>) -> Result<SchemaGraph> {
    import_with_progress(registry, |_| {})
}

/// [`import`], calling `progress` after each entry of the structural pass
pub fn import_with_progress(
    registry: &BTreeMap<TypePath, RawSchema>,
    mut progress: impl FnMut(ImportProgress),
) -> Result<SchemaGraph> {
    let mut importer = Importer::default();

    for (identifier, schema) in registry {
        if identifier.as_str().trim().is_empty() {
            return Err(Report::new(Error::SchemaImport(
                "registry entry without a type identifier".to_string(),
            )));
        }
        importer.index(identifier, schema);
    }
    debug!("Indexed {} registry types", importer.graph.len());

    let total = registry.len();
    for (completed, (identifier, schema)) in registry.iter().enumerate() {
        let id = importer.graph.intern(identifier);
        let shape = schema
            .shape()
            .map_err(|report| report.attach(format!("Type: {identifier}")))?;
        if let SchemaShape::Ref(target) = &shape {
            error!("Registry entry {identifier} is a bare reference to {target}");
            return Err(Report::new(Error::ContractViolation(format!(
                "registry entry `{identifier}` is a bare reference to `{target}`"
            ))));
        }
        importer.link(id, shape)?;
        progress(ImportProgress {
            completed: completed + 1,
            total,
            current: identifier.clone(),
        });
    }

    debug!(
        "Imported {} registry entries into {} types",
        total,
        importer.graph.len()
    );
    Ok(importer.graph)
}

#[derive(Default)]
struct Importer {
    graph: SchemaGraph,
}

impl Importer {
    fn index(&mut self, identifier: &TypePath, schema: &RawSchema) {
        let id = self.graph.intern(identifier);
        let Some(node) = self.graph.node_mut(id) else {
            return;
        };
        if let Some(name) = &schema.short_path {
            node.name.clone_from(name);
        }
        node.module.clone_from(&schema.module_path);
        node.crate_name.clone_from(&schema.crate_name);
        node.reflect_types.clone_from(&schema.reflect_types);
    }

    fn resolve(&mut self, reference: &SchemaRef) -> TypeId {
        let identifier = reference.identifier();
        if self.graph.id(identifier.as_str()).is_none() {
            debug!("Creating undescribed type {identifier}");
        }
        self.graph.intern(&identifier)
    }

    /// Record the kind and relationships of node `id`
    fn link(&mut self, id: TypeId, shape: SchemaShape) -> Result<()> {
        let Some(kind) = shape.kind() else {
            return Err(Report::new(Error::ContractViolation(
                "bare reference where a described type is required".to_string(),
            )));
        };

        let structure = match shape {
            SchemaShape::Struct {
                properties,
                required,
                ..
            } => {
                let mut fields = Vec::with_capacity(properties.len());
                for (name, value) in properties {
                    let reference = match Json::from(value).decode::<SchemaRef>() {
                        Ok(reference) => reference,
                        Err(report) => {
                            warn!(
                                "Skipping property {name} of {}: {report}",
                                self.identifier(id)
                            );
                            continue;
                        },
                    };
                    fields.push(Property {
                        ty: self.resolve(&reference),
                        required: required.contains(&name),
                        name,
                    });
                }
                Structure::Fields(fields)
            },
            SchemaShape::Enum(variants) => {
                let mut linked = Vec::with_capacity(variants.len());
                for variant in variants {
                    linked.push(self.variant(id, variant)?);
                }
                Structure::Variants(linked)
            },
            SchemaShape::Array(items) | SchemaShape::List(items) | SchemaShape::Set(items) => {
                Structure::Items(self.resolve(&items))
            },
            SchemaShape::Tuple(elements) | SchemaShape::TupleStruct(elements) => {
                Structure::Elements(elements.iter().map(|e| self.resolve(e)).collect())
            },
            SchemaShape::Map { key, value } => Structure::Entries {
                key:   self.resolve(&key),
                value: self.resolve(&value),
            },
            SchemaShape::Value | SchemaShape::Ref(_) => Structure::Leaf,
        };

        if let Some(node) = self.graph.node_mut(id) {
            node.kind = kind;
            node.structure = structure;
        }
        Ok(())
    }

    /// Link one variant of enum `parent`, giving a non-trivial payload its own node
    fn variant(&mut self, parent: TypeId, variant: RawVariant) -> Result<Variant> {
        let (short_path, type_path, fields) = match variant {
            RawVariant::Unit(name) => {
                return Ok(Variant {
                    name,
                    type_path: None,
                    ty: None,
                });
            },
            RawVariant::Detailed {
                short_path,
                type_path,
                fields,
            } => (short_path, type_path, fields),
        };

        let shape = fields.shape()?;
        let ty = if shape.is_empty() {
            None
        } else {
            let parent_node = &self.graph[parent];
            let payload = parent_node.identifier.variant_payload(&short_path);
            let module = parent_node.module.clone();
            let crate_name = parent_node.crate_name.clone();

            let id = self.graph.intern(&payload);
            self.link(id, shape)
                .map_err(|report| report.attach(format!("Variant: {payload}")))?;
            if let Some(node) = self.graph.node_mut(id) {
                node.module = module;
                node.crate_name = crate_name;
            }
            Some(id)
        };

        Ok(Variant {
            name: short_path,
            type_path: type_path.map(TypePath::from),
            ty,
        })
    }

    fn identifier(&self, id: TypeId) -> &TypePath {
        &self.graph[id].identifier
    }
}
