//! Read-side rows kept by projections, such as the product inspection history.
//!
//! Every row lives under its tenant, so a rebuild can clear and replay one
//! tenant without touching the others.

mod tenant_store;

pub use tenant_store::{InMemoryTenantStore, TenantStore};
