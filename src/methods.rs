//! HTTP verb normalisation.
//!
//! Templates and API documents spell verbs in any casing and use `ANY` as a
//! shorthand for every verb the gateway supports. Everything downstream of
//! this module works with upper-cased [`Method`] values and never sees `ANY`.

use http::Method;
use tracing::debug;

/// Shorthand accepted in templates for "every supported verb"
pub const ANY_METHOD: &str = "ANY";

/// Swagger path-item key the gateway uses for the `ANY` shorthand
pub const ANY_METHOD_EXTENSION_KEY: &str = "x-amazon-apigateway-any-method";

/// Verbs that `ANY` expands to, in gateway order
pub const ANY_HTTP_METHODS: [Method; 7] = [
    Method::GET,
    Method::DELETE,
    Method::PUT,
    Method::POST,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
];

/// Expand a single verb declaration
///
/// `any` in any casing becomes the full verb set; anything else becomes its
/// upper-cased form. Tokens that are not valid HTTP methods expand to nothing.
#[must_use]
pub fn expand(method: &str) -> Vec<Method> {
    let upper = method.trim().to_ascii_uppercase();
    if upper == ANY_METHOD {
        return ANY_HTTP_METHODS.to_vec();
    }
    match Method::from_bytes(upper.as_bytes()) {
        Ok(m) => vec![m],
        Err(_) => {
            debug!(method = %method, "Ignoring unparseable HTTP method");
            Vec::new()
        }
    }
}

/// Merge `extra` into `base`, skipping verbs already present
///
/// First-seen order is preserved.
pub fn merge_into(base: &mut Vec<Method>, extra: &[Method]) {
    for m in extra {
        if !base.contains(m) {
            base.push(m.clone());
        }
    }
}

/// Expand every declaration and merge the results
#[must_use]
pub fn normalize<'a, I>(methods: I) -> Vec<Method>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for m in methods {
        merge_into(&mut out, &expand(m));
    }
    out
}

/// Whether `method` is one of the verbs the gateway emulates
#[must_use]
pub fn is_supported(method: &Method) -> bool {
    ANY_HTTP_METHODS.contains(method)
}

/// Comma-joined, alphabetically sorted rendering used by CORS headers
#[must_use]
pub fn canonical_list(methods: &[Method]) -> String {
    let mut names: Vec<&str> = methods.iter().map(Method::as_str).collect();
    names.sort_unstable();
    names.dedup();
    names.join(",")
}
