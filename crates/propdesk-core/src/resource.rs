//! REST resources served to the list views

use serde::{Deserialize, Serialize};

/// A kind of resource exposed by the back-office REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Property,
    Tenant,
    Invoice,
    Task,
    ServiceRequest,
    TechnicalObject,
    Dashboard,
}

impl ResourceKind {
    /// Collection endpoint, always with a trailing slash
    pub fn collection_path(&self) -> &'static str {
        match self {
            Self::Property => "/v1/properties/",
            Self::Tenant => "/v1/tenants/",
            Self::Invoice => "/v1/invoices/",
            Self::Task => "/v1/tasks/",
            Self::ServiceRequest => "/v1/service-requests/",
            Self::TechnicalObject => "/v1/technical-objects/",
            Self::Dashboard => "/v1/dashboard/",
        }
    }

    /// Endpoint of a single item
    pub fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.collection_path(), id)
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Property => "Properties",
            Self::Tenant => "Tenants",
            Self::Invoice => "Invoices",
            Self::Task => "Tasks",
            Self::ServiceRequest => "Service requests",
            Self::TechnicalObject => "Technical objects",
            Self::Dashboard => "Dashboard",
        }
    }

    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Property,
            Self::Tenant,
            Self::Invoice,
            Self::Task,
            Self::ServiceRequest,
            Self::TechnicalObject,
            Self::Dashboard,
        ]
    }

    /// Resolve the resource a URL path belongs to (query string ignored)
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or(path);
        let normalized = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        Self::all()
            .iter()
            .copied()
            .find(|kind| normalized.starts_with(kind.collection_path()))
    }
}
