//! @acp:module "Registries"
//! @acp:summary "Session-scoped name tables for parsers and middleware"
//! @acp:domain routing
//! @acp:layer service

pub mod middleware;
pub mod parsers;

pub use middleware::MiddlewareRegistry;
pub use parsers::{ParserRegistry, BUILTIN_FILE};
