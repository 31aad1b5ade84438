use serde::{Deserialize, Serialize};

use batchline_core::{Entity, uuid_newtype};

uuid_newtype! {
    /// Stock location (warehouse bin, QC area, retention shelf...).
    pub struct LocationId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUsage {
    /// Physical stock owned by the company.
    Internal,
    /// Grouping node, never holds stock.
    View,
    Supplier,
    Customer,
    Transit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub parent: Option<LocationId>,
    pub usage: LocationUsage,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Request to create a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub parent: Option<LocationId>,
    pub usage: LocationUsage,
}

impl NewLocation {
    /// Internal stock location nested under `parent`.
    pub fn internal_under(name: impl Into<String>, parent: LocationId) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            usage: LocationUsage::Internal,
        }
    }
}
