use serde::Serialize;

use crate::policy::ApiPolicy;
use crate::route::{GatewayKind, Route};

/// Routes and representative policy of one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackRoutes {
    pub stack_path: String,
    pub policy: ApiPolicy,
    pub routes: Vec<Route>,
}

/// Policy of one API surface, implicit or explicit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfacePolicy {
    pub stack_path: String,
    /// Explicit API logical id; `None` for a stack's implicit surface
    pub api_id: Option<String>,
    pub kind: GatewayKind,
    pub policy: ApiPolicy,
}

/// The result of one resolution pass
///
/// `stacks` holds one entry per stack that contributes routes, in caller
/// order. `routes` is the flattened union of those entries and `policy` the
/// representative aggregate policy: the last-processed explicit API's when
/// there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub stacks: Vec<StackRoutes>,
    pub routes: Vec<Route>,
    pub policy: ApiPolicy,
    pub surfaces: Vec<SurfacePolicy>,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            stacks: Vec::new(),
            routes: Vec::new(),
            policy: ApiPolicy::default(),
            surfaces: Vec::new(),
        }
    }
}

impl Resolution {
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn policy(&self) -> &ApiPolicy {
        &self.policy
    }

    /// Policy of the surface a route belongs to
    ///
    /// Routes owned by an explicit API get that API's policy, others the
    /// implicit surface of their stack and gateway kind.
    #[must_use]
    pub fn policy_for(&self, route: &Route) -> Option<&ApiPolicy> {
        let find = |api_id: Option<&str>, kind: Option<GatewayKind>| {
            self.surfaces.iter().find(|s| {
                s.stack_path == route.stack_path
                    && s.api_id.as_deref() == api_id
                    && kind.map_or(true, |k| s.kind == k)
            })
        };
        route
            .api_id
            .as_deref()
            .and_then(|id| find(Some(id), None))
            .or_else(|| find(None, Some(route.event_type)))
            .map(|s| &s.policy)
    }

    /// Route in `stack_path` answering `method` at `path`
    #[must_use]
    pub fn find(&self, stack_path: &str, path: &str, method: &http::Method) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.stack_path == stack_path && r.path == path && r.handles(method))
    }
}

impl IntoIterator for Resolution {
    type Item = StackRoutes;
    type IntoIter = std::vec::IntoIter<StackRoutes>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.into_iter()
    }
}
