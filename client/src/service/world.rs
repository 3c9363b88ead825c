//! `world.*` methods: queries, entity components and resources

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{RemoteError, Result};
use crate::json::Json;
use crate::query::{Query, QueryBuilder, QueryData, QueryFilter, QueryResult, StructuredQuery};
use crate::rpc::{RpcClient, RpcMethod};
use crate::type_path::TypePath;

/// Entry point for the remote ECS world
#[derive(Debug, Clone)]
pub struct WorldService {
    client: RpcClient,
}

impl WorldService {
    /// Service over `client`
    pub const fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Start building a query
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Run `query` and return its rows
    ///
    /// With `strict` set, a missing or unregistered component fails the whole
    /// query with the server's error.
    pub async fn query(&self, query: &Query) -> Result<QueryResult> {
        self.query_inner(query, None).await
    }

    /// [`Self::query`], abandoned when `cancel` fires
    pub async fn query_cancellable(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        self.query_inner(query, Some(cancel)).await
    }

    /// Run a query assembled from its parts
    pub async fn query_with(
        &self,
        data: QueryData,
        filter: QueryFilter,
        strict: bool,
    ) -> Result<QueryResult> {
        self.query(&Query {
            data,
            filter,
            strict,
        })
        .await
    }

    /// Run `query` with the hierarchy columns injected
    ///
    /// The returned result hides the injected columns the caller did not ask
    /// for; they stay available to [`QueryResult::hierarchy`].
    pub async fn query_structured(&self, query: Query) -> Result<QueryResult> {
        self.structured_inner(query.with_structure(), None).await
    }

    /// [`Self::query_structured`], abandoned when `cancel` fires
    pub async fn query_structured_cancellable(
        &self,
        query: Query,
        cancel: &CancellationToken,
    ) -> Result<QueryResult> {
        self.structured_inner(query.with_structure(), Some(cancel))
            .await
    }

    async fn structured_inner(
        &self,
        structured: StructuredQuery,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult> {
        let result = self.query_inner(&structured.query, cancel).await?;
        Ok(structured.present(result))
    }

    async fn query_inner(
        &self,
        query: &Query,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult> {
        debug!("world.query: {query}");
        let result: QueryResult = self.client.call(RpcMethod::WorldQuery, query, cancel).await?;
        debug!("world.query matched {} entities", result.len());
        Ok(result)
    }

    /// Operations scoped to one entity
    pub fn entity(&self, entity: Entity) -> EntityService {
        EntityService {
            client: self.client.clone(),
            entity,
        }
    }

    /// Operations on world resources
    pub fn resources(&self) -> ResourceService {
        ResourceService {
            client: self.client.clone(),
        }
    }
}

impl QueryBuilder {
    /// Build and run the query on `world`
    pub async fn execute(self, world: &WorldService) -> Result<QueryResult> {
        world.query(&self.build()).await
    }

    /// Build, inject the hierarchy columns and run the query on `world`
    pub async fn execute_structured(self, world: &WorldService) -> Result<QueryResult> {
        world.query_structured(self.build()).await
    }
}

/// Operations scoped to one entity
#[derive(Debug, Clone)]
pub struct EntityService {
    client: RpcClient,
    entity: Entity,
}

impl EntityService {
    /// The entity this service is scoped to
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Component access for this entity
    pub fn components(&self) -> ComponentService {
        ComponentService {
            client: self.client.clone(),
            entity: self.entity,
        }
    }
}

#[derive(Serialize)]
struct ListComponentsParams {
    entity: Entity,
}

#[derive(Serialize)]
struct GetComponentsParams<'a> {
    entity:     Entity,
    components: &'a [TypePath],
    strict:     bool,
}

/// `world.get_components` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentValues {
    /// Values of the components that could be read
    #[serde(default)]
    pub components: HashMap<TypePath, Json>,
    /// Per-component failures in non-strict mode
    #[serde(default)]
    pub errors:     HashMap<TypePath, RemoteError>,
}

impl ComponentValues {
    /// Value of `component`, if it was read
    pub fn get(&self, component: &str) -> Option<&Json> {
        self.components.get(component)
    }

    /// Why `component` could not be read
    pub fn error(&self, component: &str) -> Option<&RemoteError> {
        self.errors.get(component)
    }
}

/// Components of one entity
#[derive(Debug, Clone)]
pub struct ComponentService {
    client: RpcClient,
    entity: Entity,
}

impl ComponentService {
    /// Type paths of every reflectable component on the entity
    pub async fn list(&self) -> Result<Vec<TypePath>> {
        self.list_with(None).await
    }

    /// [`Self::list`], abandoned when `cancel` fires
    pub async fn list_cancellable(&self, cancel: &CancellationToken) -> Result<Vec<TypePath>> {
        self.list_with(Some(cancel)).await
    }

    async fn list_with(&self, cancel: Option<&CancellationToken>) -> Result<Vec<TypePath>> {
        let params = ListComponentsParams {
            entity: self.entity,
        };
        self.client
            .call(RpcMethod::ListComponents, &params, cancel)
            .await
    }

    /// Read `components`; failures are reported per component in `errors`
    pub async fn get(&self, components: &[TypePath]) -> Result<ComponentValues> {
        self.get_with(components, false, None).await
    }

    /// Read `components`, failing the whole call if any one cannot be read
    pub async fn get_strictly(&self, components: &[TypePath]) -> Result<ComponentValues> {
        self.get_with(components, true, None).await
    }

    /// [`Self::get`] or [`Self::get_strictly`], abandoned when `cancel` fires
    pub async fn get_cancellable(
        &self,
        components: &[TypePath],
        strict: bool,
        cancel: &CancellationToken,
    ) -> Result<ComponentValues> {
        self.get_with(components, strict, Some(cancel)).await
    }

    async fn get_with(
        &self,
        components: &[TypePath],
        strict: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<ComponentValues> {
        let params = GetComponentsParams {
            entity: self.entity,
            components,
            strict,
        };
        self.client
            .call(RpcMethod::GetComponents, &params, cancel)
            .await
    }
}

#[derive(Serialize)]
struct GetResourceParams<'a> {
    resource: &'a TypePath,
}

#[derive(Deserialize)]
struct ResourceValue {
    #[serde(default)]
    value: Json,
}

/// World resources
#[derive(Debug, Clone)]
pub struct ResourceService {
    client: RpcClient,
}

impl ResourceService {
    /// Type paths of every reflectable resource
    pub async fn list(&self) -> Result<Vec<TypePath>> {
        self.list_with(None).await
    }

    /// [`Self::list`], abandoned when `cancel` fires
    pub async fn list_cancellable(&self, cancel: &CancellationToken) -> Result<Vec<TypePath>> {
        self.list_with(Some(cancel)).await
    }

    async fn list_with(&self, cancel: Option<&CancellationToken>) -> Result<Vec<TypePath>> {
        let params = Value::Object(Map::new());
        self.client
            .call(RpcMethod::ListResources, &params, cancel)
            .await
    }

    /// Current value of `resource`
    pub async fn get(&self, resource: &TypePath) -> Result<Json> {
        self.get_with(resource, None).await
    }

    /// [`Self::get`], abandoned when `cancel` fires
    pub async fn get_cancellable(
        &self,
        resource: &TypePath,
        cancel: &CancellationToken,
    ) -> Result<Json> {
        self.get_with(resource, Some(cancel)).await
    }

    async fn get_with(
        &self,
        resource: &TypePath,
        cancel: Option<&CancellationToken>,
    ) -> Result<Json> {
        let params = GetResourceParams { resource };
        let response: ResourceValue = self
            .client
            .call(RpcMethod::GetResources, &params, cancel)
            .await?;
        Ok(response.value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::query::columns::{CHILD_OF, CHILDREN, NAME};
    use crate::rpc::mock::MockTransport;

    const TRANSFORM: &str = "bevy_transform::components::transform::Transform";

    fn world(mock: &MockTransport) -> WorldService {
        WorldService::new(RpcClient::with_transport(mock.clone()))
    }

    #[tokio::test]
    async fn test_query_sends_wire_form() {
        let mock = MockTransport::new().respond(
            RpcMethod::WorldQuery,
            json!([{"entity": 4_294_967_294_u64, "components": {(TRANSFORM): {}}}]),
        );
        let world = world(&mock);
        let result = world
            .query_builder()
            .component(TRANSFORM)
            .without("a::Hidden")
            .execute(&world)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].entity, Entity::new(1, 0));

        let request = &mock.requests_for(RpcMethod::WorldQuery)[0];
        assert_eq!(
            request.params,
            Some(json!({
                "data": {"components": [TRANSFORM]},
                "filter": {"without": ["a::Hidden"]},
                "strict": false
            }))
        );
    }

    #[tokio::test]
    async fn test_strict_query_fails_as_a_whole() {
        let mock = MockTransport::new().fail(
            RpcMethod::WorldQuery,
            RemoteError {
                code:    -23402,
                message: "Unknown component type: `a::Missing`".to_string(),
                data:    None,
            },
        );
        let world = world(&mock);
        let error = world
            .query_with(
                QueryData {
                    components: vec!["a::Missing".into()],
                    ..QueryData::default()
                },
                QueryFilter::default(),
                true,
            )
            .await
            .unwrap_err();
        assert_eq!(error.current_context().remote().unwrap().code, -23402);
        assert_eq!(mock.requests()[0].params.as_ref().unwrap()["strict"], json!(true));
    }

    #[tokio::test]
    async fn test_row_without_entity_fails_decode() {
        let mock = MockTransport::new().respond(RpcMethod::WorldQuery, json!([{"components": {}}]));
        let error = world(&mock).query(&Query::default()).await.unwrap_err();
        assert!(matches!(error.current_context(), Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_structured_query_hides_injected_columns() {
        let root = Entity::new(1, 0).to_bits();
        let child = Entity::new(2, 0).to_bits();
        let mock = MockTransport::new().respond(
            RpcMethod::WorldQuery,
            json!([
                {"entity": root, "components": {(TRANSFORM): {}, (NAME): "Root", (CHILDREN): [child]}},
                {"entity": child, "components": {(TRANSFORM): {}, (CHILD_OF): root}}
            ]),
        );
        let world = world(&mock);
        let result = world
            .query_builder()
            .component(TRANSFORM)
            .execute_structured(&world)
            .await
            .unwrap();

        let shown: Vec<String> = result
            .display_columns()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(shown, vec!["Transform"]);

        let roots: Vec<Entity> = result.hierarchy().roots().map(|n| n.entity()).collect();
        assert_eq!(roots, vec![Entity::new(1, 0)]);

        let params = mock.requests()[0].params.clone().unwrap();
        assert_eq!(params["data"]["option"], json!([NAME, CHILDREN, CHILD_OF]));
    }

    #[tokio::test]
    async fn test_entity_components() {
        let entity = Entity::new(7, 2);
        let mock = MockTransport::new()
            .respond(RpcMethod::ListComponents, json!([NAME, TRANSFORM]))
            .respond(
                RpcMethod::GetComponents,
                json!({
                    "components": {(NAME): "Player"},
                    "errors": {"a::Missing": {"code": -23402, "message": "Unknown component type"}}
                }),
            );
        let components = world(&mock).entity(entity).components();

        let listed = components.list().await.unwrap();
        assert_eq!(listed, vec![TypePath::from(NAME), TypePath::from(TRANSFORM)]);

        let values = components
            .get(&[NAME.into(), "a::Missing".into()])
            .await
            .unwrap();
        assert_eq!(values.get(NAME), Some(&Json::from("Player")));
        assert_eq!(values.error("a::Missing").unwrap().code, -23402);

        components.get_strictly(&[NAME.into()]).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].params, Some(json!({"entity": entity.to_bits()})));
        assert_eq!(
            requests[1].params,
            Some(json!({"entity": entity.to_bits(), "components": [NAME, "a::Missing"], "strict": false}))
        );
        assert_eq!(requests[2].params.as_ref().unwrap()["strict"], json!(true));
    }

    #[tokio::test]
    async fn test_resources() {
        let mock = MockTransport::new()
            .respond(RpcMethod::ListResources, json!(["game::Score"]))
            .respond(RpcMethod::GetResources, json!({"value": {"points": 12}}));
        let resources = world(&mock).resources();

        assert_eq!(resources.list().await.unwrap(), vec![TypePath::from("game::Score")]);
        let value = resources.get(&"game::Score".into()).await.unwrap();
        assert_eq!(value["points"].as_u32(), Some(12));

        let requests = mock.requests();
        assert_eq!(requests[0].params, Some(json!({})));
        assert_eq!(requests[1].params, Some(json!({"resource": "game::Score"})));
    }

    #[tokio::test]
    async fn test_cancelled_query_is_discardable() {
        use crate::error::DiscardCancelled;

        let mock = MockTransport::new()
            .with_delay(std::time::Duration::from_secs(30))
            .respond(RpcMethod::WorldQuery, json!([]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = world(&mock)
            .query_cancellable(&Query::default(), &cancel)
            .await
            .discard_cancelled()
            .unwrap();
        assert!(outcome.is_none());
    }
}
