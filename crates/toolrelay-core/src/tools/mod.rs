//! Tool registry and dispatch
//!
//! Every tool is exposed to the model under a qualified name,
//! `<provider_id>_<local_name>`, so identically named tools of different
//! providers stay distinct. Each turn builds a fresh `ToolCatalogue` that
//! maps qualified names back to (provider, local name) for dispatch.

mod catalogue;
mod error;
mod naming;
mod registry;

pub use catalogue::{ProviderTools, ToolCatalogue, ToolDescriptor};
pub use error::ToolDispatchError;
pub use naming::{qualify, split_qualified_name, SEPARATOR};
pub use registry::ToolRegistry;
