// Development endpoints and the script-injection middleware. Both are inert in
// production: the routes are never attached and the middleware passes responses
// through untouched.

mod middleware;
pub(crate) mod sse;

pub use middleware::InjectReloadScript;
