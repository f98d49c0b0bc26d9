//! Built-in actions and the reference host actions.

mod command;
mod debug;
mod flow;
mod http;
mod rest;
mod storage;

use std::sync::Arc;

use donburi_store::ResourceStore;

pub use command::CommandAction;
pub use debug::{DebugAction, FailAction, SleepAction};
pub use flow::{BlockAction, EvalAction, ResourcesAction, VarsAction};
pub use http::HttpAction;
pub use rest::{service_endpoint, GenericRestAction, HeatAction, RestAction, AUTH_HEADER};
pub use storage::{
    register_storage_actions, DeleteAction, FetchAction, ListAction, ResourceAction, UpdateAction,
};

use crate::config::HostConfig;
use crate::http::HttpClient;
use crate::registry::ActionRegistry;

/// Register the engine built-ins: block, resources, eval, vars, debug, sleep, fail, command.
pub fn register_builtins(registry: &mut ActionRegistry) {
    registry
        .register("block", Arc::new(BlockAction))
        .register("resources", Arc::new(ResourcesAction))
        .register("eval", Arc::new(EvalAction))
        .register("vars", Arc::new(VarsAction))
        .register("debug", Arc::new(DebugAction))
        .register("sleep", Arc::new(SleepAction))
        .register("fail", Arc::new(FailAction))
        .register("command", Arc::new(CommandAction));
}

/// A registry holding only the built-ins.
pub fn builtin_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    register_builtins(&mut registry);
    registry
}

/// Collaborators for the reference host actions.
pub struct HostServices {
    pub store: Option<Arc<dyn ResourceStore>>,
    pub http: Option<Arc<dyn HttpClient>>,
    pub config: HostConfig,
}

/// Register `list`/`fetch`/`resource`/`update`/`delete` when a store is given,
/// `http` and `heat` when a client is given, and `rest` when a client and base URL are set.
pub fn register_host_actions(registry: &mut ActionRegistry, services: HostServices) {
    if let Some(store) = services.store {
        register_storage_actions(registry, store);
    }
    let Some(client) = services.http else {
        return;
    };
    let timeout = services.config.http_timeout;
    registry
        .register("http", Arc::new(HttpAction::new(Arc::clone(&client), timeout)))
        .register("heat", Arc::new(HeatAction::new(Arc::clone(&client), timeout)));
    if let Some(base) = services.config.rest_base_url {
        let generic = GenericRestAction::new(base, client, timeout);
        registry.register("rest", Arc::new(RestAction::new(generic)));
    }
}
