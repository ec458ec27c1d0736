//! Page model: default state, actions and state composition.

use std::fmt;

use edge_core::Location;
use serde::Serialize;
use serde_json::Value;

use crate::context::PageContext;
use crate::store::{ActionTable, State};

/// Builds default state from the navigation and context.
pub type StateFactory = Box<dyn FnOnce(&Location, &PageContext) -> State + Send>;

/// Default state declared by a page.
pub enum InitialState {
    /// A fixed object.
    Value(State),
    /// Computed per navigation.
    Factory(StateFactory),
}

impl InitialState {
    /// Fixed state from any serializable value. Non-object values give an
    /// empty state.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let state = match serde_json::to_value(value)? {
            Value::Object(map) => map,
            _ => State::new(),
        };
        Ok(Self::Value(state))
    }

    /// Computed state.
    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce(&Location, &PageContext) -> State + Send + 'static,
    {
        Self::Factory(Box::new(f))
    }

    /// Produce the state for this navigation.
    pub fn resolve(self, location: &Location, context: &PageContext) -> State {
        match self {
            Self::Value(state) => state,
            Self::Factory(f) => f(location, context),
        }
    }
}

impl Default for InitialState {
    fn default() -> Self {
        Self::Value(State::new())
    }
}

impl From<State> for InitialState {
    fn from(state: State) -> Self {
        Self::Value(state)
    }
}

impl fmt::Debug for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(state) => f.debug_tuple("Value").field(state).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Default state and actions bundled together.
#[derive(Debug, Default)]
pub struct Model {
    pub initial_state: InitialState,
    pub actions: ActionTable,
}

impl Model {
    /// Create a model.
    pub fn new(initial_state: impl Into<InitialState>, actions: ActionTable) -> Self {
        Self {
            initial_state: initial_state.into(),
            actions,
        }
    }
}

/// Compose the state a store starts from. Later sources win: `defaults`,
/// then `global`, then `location`, `basename`, `publicPath` and `restapi`.
///
/// The location's history key is never written.
pub fn compose_initial_state(
    defaults: State,
    global: Option<&State>,
    location: &Location,
    context: &PageContext,
) -> State {
    let mut state = defaults;
    if let Some(global) = global {
        state.extend(global.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let location = Location {
        key: None,
        ..location.clone()
    };
    state.insert("location".to_string(), location.to_value());
    state.insert("basename".to_string(), Value::from(context.basename()));
    state.insert("publicPath".to_string(), Value::from(context.public_path()));
    state.insert("restapi".to_string(), Value::from(context.restapi()));
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::{ClientEnvironment, PageConfig};
    use edge_data::StaticFetcher;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> PageContext {
        PageContext::client(
            PageConfig::new("/shop").with_public_path("/shop/static"),
            Arc::new(StaticFetcher::new()),
            ClientEnvironment::new(),
        )
    }

    fn object(value: Value) -> State {
        match value {
            Value::Object(map) => map,
            _ => State::new(),
        }
    }

    #[test]
    fn test_initial_state_value_and_factory() {
        let ctx = context();
        let location = Location::new("/cart");

        let fixed = InitialState::from(object(json!({"items": []})));
        assert_eq!(fixed.resolve(&location, &ctx), object(json!({"items": []})));

        let computed = InitialState::factory(|loc, ctx| {
            object(json!({"path": loc.pathname, "base": ctx.basename()}))
        });
        assert_eq!(
            computed.resolve(&location, &ctx),
            object(json!({"path": "/cart", "base": "/shop"}))
        );
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Defaults {
            count: u32,
        }

        let state = InitialState::from_serialize(&Defaults { count: 2 })
            .unwrap()
            .resolve(&Location::new("/"), &context());
        assert_eq!(state.get("count"), Some(&json!(2)));

        let scalar = InitialState::from_serialize(&5).unwrap();
        assert!(scalar.resolve(&Location::new("/"), &context()).is_empty());
    }

    #[test]
    fn test_compose_later_sources_win() {
        let defaults = object(json!({"count": 0, "title": "default", "basename": "x"}));
        let global = object(json!({"count": 7}));

        let state = compose_initial_state(defaults, Some(&global), &Location::new("/a"), &context());

        assert_eq!(state["count"], json!(7));
        assert_eq!(state["title"], json!("default"));
        assert_eq!(state["basename"], json!("/shop"));
        assert_eq!(state["publicPath"], json!("/shop/static"));
        assert_eq!(state["restapi"], json!("/api"));
        assert_eq!(state["location"]["pathname"], json!("/a"));
    }

    #[test]
    fn test_compose_never_writes_key() {
        let location = Location::parse("/a?x=1").with_key("k-123");

        let state = compose_initial_state(State::new(), None, &location, &context());

        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("k-123"));
        assert!(state["location"].get("key").is_none());
    }
}
