//! # Route Collector Module
//!
//! Accumulates candidate routes from every stack and API surface, resolves
//! conflicts, and attaches CORS, binary media and authorizer metadata.
//!
//! ## Conflict Resolution
//!
//! Candidates are compared per `(path, method)` after `ANY` has been
//! expanded. The pass visits explicit candidates first and implicit ones
//! second, each group in stack order and then declaration order. A later
//! candidate takes a coordinate over the current holder unless the holder
//! lives in an ancestor stack:
//!
//! - an ancestor stack always keeps its coordinate over a descendant
//! - otherwise an implicit route replaces an explicit one
//! - between routes of the same origin the last one processed wins
//!
//! Surviving single-method entries are regrouped into method lists by stack,
//! function, path, owning surface and authorizer binding.
//!
//! ## Surfaces
//!
//! Every route belongs to one API surface: the explicit API it was declared
//! in (or referenced through `RestApiId` / `ApiId`), otherwise the implicit
//! surface of its stack and gateway kind. A surface's policy combines its own
//! declarations with the stack's `Globals`:
//!
//! - binary media types are the union of its own and the global ones
//! - its own CORS declaration replaces the global default entirely
//! - implicit surfaces use the global defaults and the `Prod` stage

use http::Method;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use crate::authorizer::LambdaAuthorizer;
use crate::cors::{parse_cors, CorsDeclaration};
use crate::error::ResolveResult;
use crate::methods;
use crate::policy::{collect_binary_media_types, ApiPolicy, CorsPolicy};
use crate::resolution::{Resolution, StackRoutes, SurfacePolicy};
use crate::route::{GatewayKind, Route};
use crate::template::{is_ancestor, Stack};

/// Where a candidate route was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouteOrigin {
    /// Inside an explicit API's document
    Explicit,
    /// On a function event
    Implicit,
}

/// CORS setting of an explicit API before globals are applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SurfaceCors {
    /// No declaration; use the global default
    #[default]
    Inherit,
    /// Declared, and switched off
    Disabled,
    /// Declared policy
    Custom(CorsPolicy),
}

impl SurfaceCors {
    /// Resolve an API's own CORS declaration
    pub fn from_declaration(declaration: Option<&CorsDeclaration>) -> ResolveResult<Self> {
        let Some(declaration) = declaration else {
            return Ok(SurfaceCors::Inherit);
        };
        Ok(match declaration.resolve()? {
            Some(policy) => SurfaceCors::Custom(policy),
            None => SurfaceCors::Disabled,
        })
    }
}

/// An explicit API resource, fully extracted
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitApi {
    pub api_id: String,
    pub kind: GatewayKind,
    pub stage_name: String,
    pub stage_variables: Option<BTreeMap<String, String>>,
    /// Types declared by the document and the resource, without globals
    pub binary_media_types: BTreeSet<String>,
    pub cors: SurfaceCors,
    pub authorizers: BTreeMap<String, LambdaAuthorizer>,
    pub default_authorizer: Option<String>,
}

/// `Globals` defaults of one stack, per gateway kind
#[derive(Debug, Clone, Default)]
struct StackDefaults {
    rest_binary_media_types: BTreeSet<String>,
    http_binary_media_types: BTreeSet<String>,
    rest_cors: Option<CorsPolicy>,
    http_cors: Option<CorsPolicy>,
}

impl StackDefaults {
    fn from_stack(stack: &Stack) -> ResolveResult<Self> {
        let mut defaults = StackDefaults::default();
        for kind in [GatewayKind::Rest, GatewayKind::Http] {
            let Some(globals) = stack.global_section(kind) else {
                continue;
            };
            let mut binary = BTreeSet::new();
            collect_binary_media_types(globals.get("BinaryMediaTypes"), &mut binary);
            let cors = match parse_cors(kind, globals.get(kind.cors_property()))? {
                Some(declaration) => declaration.resolve()?,
                None => None,
            };
            match kind {
                GatewayKind::Rest => {
                    defaults.rest_binary_media_types = binary;
                    defaults.rest_cors = cors;
                }
                GatewayKind::Http => {
                    defaults.http_binary_media_types = binary;
                    defaults.http_cors = cors;
                }
            }
        }
        Ok(defaults)
    }

    fn binary_media_types(&self, kind: GatewayKind) -> &BTreeSet<String> {
        match kind {
            GatewayKind::Rest => &self.rest_binary_media_types,
            GatewayKind::Http => &self.http_binary_media_types,
        }
    }

    fn cors(&self, kind: GatewayKind) -> Option<&CorsPolicy> {
        match kind {
            GatewayKind::Rest => self.rest_cors.as_ref(),
            GatewayKind::Http => self.http_cors.as_ref(),
        }
    }

    fn implicit_policy(&self, kind: GatewayKind) -> ApiPolicy {
        ApiPolicy {
            binary_media_types: self.binary_media_types(kind).clone(),
            cors: self.cors(kind).cloned(),
            ..ApiPolicy::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    origin: RouteOrigin,
    stack_index: usize,
    seq: usize,
    route: Route,
}

impl Candidate {
    /// Whether this candidate takes a `(path, method)` coordinate from `holder`
    ///
    /// Only meaningful when candidates are visited explicit-first.
    fn supersedes(&self, holder: &Candidate) -> bool {
        let (mine, theirs) = (&self.route.stack_path, &holder.route.stack_path);
        if is_ancestor(theirs, mine) {
            return false;
        }
        if is_ancestor(mine, theirs) {
            return true;
        }
        self.origin >= holder.origin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SurfaceRef {
    Explicit(usize),
    Implicit(usize, GatewayKind),
}

type GroupKey = (String, String, String, Option<String>, GatewayKind, Option<String>, bool);

fn group_key(route: &Route) -> GroupKey {
    (
        route.stack_path.clone(),
        route.function_name.clone(),
        route.path.clone(),
        route.api_id.clone(),
        route.event_type,
        route.authorizer_name.clone(),
        route.use_default_authorizer,
    )
}

/// Collects candidates stack by stack and produces the final [`Resolution`]
#[derive(Debug, Default)]
pub struct RouteCollector {
    stacks: Vec<String>,
    defaults: Vec<StackDefaults>,
    apis: Vec<(usize, ExplicitApi)>,
    candidates: Vec<Candidate>,
}

impl RouteCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stack and its `Globals` defaults
    ///
    /// Stacks must be registered in caller order, root first.
    ///
    /// # Errors
    ///
    /// Fails when a global CORS declaration is invalid.
    pub fn begin_stack(&mut self, stack: &Stack) -> ResolveResult<()> {
        let defaults = StackDefaults::from_stack(stack)?;
        match self.stacks.iter().position(|p| *p == stack.stack_path) {
            Some(index) => self.defaults[index] = defaults,
            None => {
                self.stacks.push(stack.stack_path.clone());
                self.defaults.push(defaults);
            }
        }
        Ok(())
    }

    /// Add routes declared on function events
    pub fn add_implicit_routes(&mut self, routes: Vec<Route>) {
        for route in routes {
            self.push(RouteOrigin::Implicit, route);
        }
    }

    /// Add an explicit API with the routes of its document
    ///
    /// Registration order decides which API supplies the aggregate policy.
    pub fn add_explicit_api(&mut self, stack_path: &str, api: ExplicitApi, routes: Vec<Route>) {
        let stack_index = self.stack_index(stack_path);
        for mut route in routes {
            route.api_id = Some(api.api_id.clone());
            route.event_type = api.kind;
            self.push(RouteOrigin::Explicit, route);
        }
        self.apis.push((stack_index, api));
    }

    fn push(&mut self, origin: RouteOrigin, route: Route) {
        let stack_index = self.stack_index(&route.stack_path);
        let seq = self.candidates.len();
        self.candidates.push(Candidate {
            origin,
            stack_index,
            seq,
            route,
        });
    }

    fn stack_index(&mut self, stack_path: &str) -> usize {
        if let Some(index) = self.stacks.iter().position(|p| p == stack_path) {
            return index;
        }
        self.stacks.push(stack_path.to_string());
        self.defaults.push(StackDefaults::default());
        self.stacks.len() - 1
    }

    /// Resolve conflicts and build the final table
    #[must_use]
    pub fn finish(self) -> Resolution {
        let order = self.visit_order();
        let winners = self.assign_coordinates(&order);
        let grouped = self.regroup(&order, &winners);

        let mut surface_policies: HashMap<SurfaceRef, ApiPolicy> = HashMap::new();
        let mut surface_order: Vec<SurfaceRef> = Vec::new();
        for (index, (stack_index, api)) in self.apis.iter().enumerate() {
            let surface = SurfaceRef::Explicit(index);
            surface_policies.insert(surface, self.explicit_policy(*stack_index, api));
            surface_order.push(surface);
        }

        let mut per_stack: Vec<Vec<Route>> = vec![Vec::new(); self.stacks.len()];
        for (stack_index, mut route) in grouped {
            let surface = self.surface_of(stack_index, &route);
            let policy = surface_policies.entry(surface).or_insert_with(|| {
                surface_order.push(surface);
                self.defaults[stack_index].implicit_policy(route.event_type)
            });
            if policy.cors.is_some() {
                methods::merge_into(&mut route.methods, &[Method::OPTIONS]);
            }
            if let SurfaceRef::Explicit(index) = surface {
                link_authorizer(&mut route, &self.apis[index].1);
            }
            per_stack[stack_index].push(route);
        }

        let mut stacks = Vec::new();
        for (stack_index, routes) in per_stack.into_iter().enumerate() {
            let Some(first) = routes.first() else {
                continue;
            };
            let policy = self
                .last_api_in(Some(stack_index))
                .and_then(|i| surface_policies.get(&SurfaceRef::Explicit(i)))
                .or_else(|| surface_policies.get(&SurfaceRef::Implicit(stack_index, first.event_type)))
                .cloned()
                .unwrap_or_default();
            stacks.push(StackRoutes {
                stack_path: self.stacks[stack_index].clone(),
                policy,
                routes,
            });
        }

        let policy = self
            .last_api_in(None)
            .and_then(|i| surface_policies.get(&SurfaceRef::Explicit(i)).cloned())
            .or_else(|| stacks.first().map(|s| s.policy.clone()))
            .unwrap_or_default();
        let routes = stacks.iter().flat_map(|s| s.routes.iter().cloned()).collect();
        let surfaces = surface_order
            .iter()
            .filter_map(|surface| {
                let policy = surface_policies.get(surface)?.clone();
                Some(match *surface {
                    SurfaceRef::Explicit(index) => {
                        let (stack_index, api) = &self.apis[index];
                        SurfacePolicy {
                            stack_path: self.stacks[*stack_index].clone(),
                            api_id: Some(api.api_id.clone()),
                            kind: api.kind,
                            policy,
                        }
                    }
                    SurfaceRef::Implicit(stack_index, kind) => SurfacePolicy {
                        stack_path: self.stacks[stack_index].clone(),
                        api_id: None,
                        kind,
                        policy,
                    },
                })
            })
            .collect();

        Resolution {
            stacks,
            routes,
            policy,
            surfaces,
        }
    }

    /// Explicit candidates first, then implicit; stack order, then declaration order
    fn visit_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.candidates.len()).collect();
        order.sort_by_key(|&i| {
            let c = &self.candidates[i];
            (c.origin, c.stack_index, c.seq)
        });
        order
    }

    fn assign_coordinates(&self, order: &[usize]) -> BTreeMap<(String, String), usize> {
        let mut winners: BTreeMap<(String, String), usize> = BTreeMap::new();
        for &index in order {
            let candidate = &self.candidates[index];
            for method in &candidate.route.methods {
                let key = (candidate.route.path.clone(), method.as_str().to_string());
                match winners.get(&key) {
                    Some(&holder) if !candidate.supersedes(&self.candidates[holder]) => {
                        debug!(
                            path = %candidate.route.path,
                            method = %method,
                            function = %candidate.route.function_name,
                            stack = %candidate.route.stack_path,
                            "Route shadowed by an ancestor stack"
                        );
                    }
                    _ => {
                        winners.insert(key, index);
                    }
                }
            }
        }
        winners
    }

    fn regroup(&self, order: &[usize], winners: &BTreeMap<(String, String), usize>) -> Vec<(usize, Route)> {
        let mut grouped: Vec<(usize, Route)> = Vec::new();
        let mut positions: HashMap<GroupKey, usize> = HashMap::new();
        for &index in order {
            let candidate = &self.candidates[index];
            let surviving: Vec<Method> = candidate
                .route
                .methods
                .iter()
                .filter(|m| winners.get(&(candidate.route.path.clone(), m.as_str().to_string())) == Some(&index))
                .cloned()
                .collect();
            if surviving.is_empty() {
                continue;
            }

            let key = group_key(&candidate.route);
            match positions.get(&key) {
                Some(&pos) => methods::merge_into(&mut grouped[pos].1.methods, &surviving),
                None => {
                    let mut route = candidate.route.clone();
                    route.methods = surviving;
                    positions.insert(key, grouped.len());
                    grouped.push((candidate.stack_index, route));
                }
            }
        }
        grouped
    }

    fn explicit_policy(&self, stack_index: usize, api: &ExplicitApi) -> ApiPolicy {
        let defaults = &self.defaults[stack_index];
        let mut binary_media_types = api.binary_media_types.clone();
        binary_media_types.extend(defaults.binary_media_types(api.kind).iter().cloned());
        let cors = match &api.cors {
            SurfaceCors::Inherit => defaults.cors(api.kind).cloned(),
            SurfaceCors::Disabled => None,
            SurfaceCors::Custom(policy) => Some(policy.clone()),
        };
        ApiPolicy {
            stage_name: api.stage_name.clone(),
            stage_variables: api.stage_variables.clone(),
            binary_media_types,
            cors,
        }
    }

    fn surface_of(&self, stack_index: usize, route: &Route) -> SurfaceRef {
        route
            .api_id
            .as_deref()
            .and_then(|id| {
                self.apis
                    .iter()
                    .position(|(s, api)| *s == stack_index && api.api_id == id)
            })
            .map_or(SurfaceRef::Implicit(stack_index, route.event_type), SurfaceRef::Explicit)
    }

    /// Index of the last registered explicit API, optionally within one stack
    fn last_api_in(&self, stack_index: Option<usize>) -> Option<usize> {
        self.apis
            .iter()
            .rposition(|(s, _)| stack_index.map_or(true, |wanted| *s == wanted))
    }
}

/// Attach the surface's Lambda authorizer to a route
///
/// Routes that opted out keep no authorizer. Otherwise the route's own
/// authorizer name is looked up, falling back to the API default.
fn link_authorizer(route: &mut Route, api: &ExplicitApi) {
    if route.authorizer_disabled() {
        return;
    }
    let Some(name) = route
        .authorizer_name
        .clone()
        .or_else(|| api.default_authorizer.clone())
    else {
        return;
    };

    match api.authorizers.get(&name) {
        Some(authorizer) => {
            info!(
                authorizer = %name,
                path = %route.path,
                function = %route.function_name,
                "Linking authorizer to route"
            );
            route.authorizer = Some(authorizer.clone());
        }
        None => {
            info!(
                authorizer = %name,
                path = %route.path,
                function = %route.function_name,
                "Linking authorizer skipped for route, authorizer is unsupported or not found"
            );
        }
    }
    route.authorizer_name = Some(name);
}
