//! Junos resource types
//!
//! Each submodule implements [`Resource`] for one type. The [`Registry`]
//! erases their configuration types behind JSON values so callers such as
//! the CLI can drive any resource by name.

pub mod bgp_neighbor;
pub mod routing_options;
pub mod security_zone;
pub mod static_route;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Outcome};
use crate::engine::{Provider, ReadState, Resource, State};
use crate::error::{Error, Result};

pub use bgp_neighbor::BgpNeighbor;
pub use routing_options::RoutingOptions;
pub use security_zone::SecurityZone;
pub use static_route::StaticRoute;

/// Resource type working on JSON configuration and state
///
/// State values are the configuration object plus an `id` member.
#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn id_format(&self) -> &'static str;

    /// Decode and validate a configuration
    fn validate(&self, config: &Value) -> Result<Diagnostics>;

    /// `set` lines of a configuration
    fn render(&self, config: &Value) -> Result<Vec<String>>;

    /// `delete` and `set` lines of an update
    fn plan(&self, provider: &Provider, prior: &Value, config: &Value) -> Result<Vec<String>>;

    async fn create(&self, provider: &Provider, config: &Value) -> Outcome<Value>;

    /// `None` when the resource no longer exists
    async fn read(&self, provider: &Provider, state: &Value) -> Outcome<Option<Value>>;

    async fn update(&self, provider: &Provider, prior: &Value, config: &Value) -> Outcome<Value>;

    async fn delete(&self, provider: &Provider, state: &Value) -> Outcome<()>;

    async fn import(&self, provider: &Provider, id: &str) -> Outcome<Value>;
}

/// Adapter from a typed [`Resource`] to [`DynResource`]
pub struct Typed<R>(pub R);

impl<R: Resource> Typed<R> {
    fn decode(&self, value: &Value) -> Result<R::Config> {
        let mut value = value.clone();
        if let Value::Object(ref mut map) = value {
            map.remove("id");
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidInput {
            resource: R::TYPE_NAME.to_string(),
            message: e.to_string(),
        })
    }

    fn encode(&self, state: State<R::Config>) -> Result<Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(state.id));
        if let Value::Object(fields) = serde_json::to_value(state.config)? {
            map.extend(fields);
        }
        Ok(Value::Object(map))
    }

    fn encode_outcome(&self, outcome: Outcome<State<R::Config>>) -> Outcome<Value> {
        let Outcome { result, warnings } = outcome;
        Outcome::from_result(result.and_then(|state| self.encode(state))).with_warnings(warnings)
    }
}

#[async_trait]
impl<R: Resource> DynResource for Typed<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn id_format(&self) -> &'static str {
        R::ID_FORMAT
    }

    fn validate(&self, config: &Value) -> Result<Diagnostics> {
        let config = self.decode(config)?;
        let mut diags = Diagnostics::new();
        self.0.validate(&config, &mut diags);
        Ok(diags)
    }

    fn render(&self, config: &Value) -> Result<Vec<String>> {
        let config = self.decode(config)?;
        let mut diags = Diagnostics::new();
        self.0.validate(&config, &mut diags);
        diags.into_result()?;
        self.0.set_lines(&config)
    }

    fn plan(&self, provider: &Provider, prior: &Value, config: &Value) -> Result<Vec<String>> {
        let prior = self.decode(prior)?;
        let config = self.decode(config)?;
        provider.plan(&self.0, &prior, &config)
    }

    async fn create(&self, provider: &Provider, config: &Value) -> Outcome<Value> {
        let config = match self.decode(config) {
            Ok(config) => config,
            Err(err) => return Outcome::err(err),
        };
        self.encode_outcome(provider.create(&self.0, config).await)
    }

    async fn read(&self, provider: &Provider, state: &Value) -> Outcome<Option<Value>> {
        let prior = match self.decode(state) {
            Ok(prior) => prior,
            Err(err) => return Outcome::err(err),
        };
        let Outcome { result, warnings } = provider.read(&self.0, &prior).await;
        let result = result.and_then(|state| match state {
            ReadState::Present(state) => self.encode(state).map(Some),
            ReadState::Gone => Ok(None),
        });
        Outcome::from_result(result).with_warnings(warnings)
    }

    async fn update(&self, provider: &Provider, prior: &Value, config: &Value) -> Outcome<Value> {
        let (prior, config) = match (self.decode(prior), self.decode(config)) {
            (Ok(prior), Ok(config)) => (prior, config),
            (Err(err), _) | (_, Err(err)) => return Outcome::err(err),
        };
        self.encode_outcome(provider.update(&self.0, &prior, config).await)
    }

    async fn delete(&self, provider: &Provider, state: &Value) -> Outcome<()> {
        match self.decode(state) {
            Ok(config) => provider.delete(&self.0, &config).await,
            Err(err) => Outcome::err(err),
        }
    }

    async fn import(&self, provider: &Provider, id: &str) -> Outcome<Value> {
        self.encode_outcome(provider.import(&self.0, id).await)
    }
}

/// Resource types by name, in registration order
pub struct Registry {
    resources: IndexMap<&'static str, Arc<dyn DynResource>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            resources: IndexMap::new(),
        }
    }

    /// Create a registry with all built-in resource types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RoutingOptions);
        registry.register(SecurityZone);
        registry.register(BgpNeighbor);
        registry.register(StaticRoute);
        registry
    }

    pub fn register<R: Resource>(&mut self, resource: R) {
        self.resources
            .insert(R::TYPE_NAME, Arc::new(Typed(resource)));
    }

    /// Get a resource type by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn DynResource>> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
