//! Collection Hook System
//!
//! Extension points consumed by the collection engine: path admission veto,
//! file resolution and directory resolution, plus a configure-time pass.
//! The engine consumes dispatch; it never owns hook lifecycles.

pub mod error;
pub mod registry;
pub mod traits;

pub use error::{HookError, HookResult};
pub use registry::HookRegistry;
pub use traits::{CollectHook, ConfigureContext};
