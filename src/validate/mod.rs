//! @acp:module "Validators"
//! @acp:summary "Signature checks for parser functions, lifecycle hooks and middleware"
//! @acp:domain analysis
//! @acp:layer service

pub mod lifecycle;
pub mod middleware;
pub mod parser;

pub use lifecycle::{check_lifecycle, LifecycleMethods};
pub use middleware::check_middleware_handle;
pub use parser::{types_compatible, validate_parser_function};
