//! Tenant-owned state

use serde::Serialize;
use stampede_http::{SignupRequest, TargetApi};
use std::sync::Arc;
use tracing::debug;

/// A table created by one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHandle {
    pub name: String,
    pub slug: String,
}

/// Identity, connection and tables of a signed-up tenant.
///
/// The connection is released when the context is torn down or dropped,
/// whichever comes first.
pub struct TenantContext {
    index: usize,
    identity: SignupRequest,
    api: Arc<dyn TargetApi>,
    resources: Vec<ResourceHandle>,
    released: bool,
}

impl TenantContext {
    pub fn new(index: usize, identity: SignupRequest, api: Arc<dyn TargetApi>) -> Self {
        Self {
            index,
            identity,
            api,
            resources: Vec::new(),
            released: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn identity(&self) -> &SignupRequest {
        &self.identity
    }

    pub fn org_slug(&self) -> &str {
        &self.identity.org_slug
    }

    /// The tenant's connection; fan-out tasks take clones of it
    pub fn api(&self) -> &Arc<dyn TargetApi> {
        &self.api
    }

    pub fn add_resource(&mut self, resource: ResourceHandle) {
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[ResourceHandle] {
        &self.resources
    }

    /// Release the connection and return the tenant's tables
    pub fn teardown(mut self) -> Vec<ResourceHandle> {
        self.released = true;
        debug!(
            "Tenant {} torn down with {} table(s)",
            self.index,
            self.resources.len()
        );
        std::mem::take(&mut self.resources)
    }
}

impl Drop for TenantContext {
    fn drop(&mut self) {
        if !self.released {
            debug!("Tenant {} connection released on early exit", self.index);
        }
    }
}

impl std::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantContext")
            .field("index", &self.index)
            .field("org_slug", &self.identity.org_slug)
            .field("resources", &self.resources)
            .field("released", &self.released)
            .finish()
    }
}
