//! Interest-group records as seen by the updater.
//!
//! A group is identified by `(owner, name)`. Only the fields an update
//! document may replace are modelled individually; the rest of a stored
//! record (join/bid history etc.) belongs to the store and never passes
//! through the merge.

mod key;
mod origin;

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use url::Url;

pub use key::GroupKey;
pub use origin::{Origin, OriginError};

/// One ad (or ad component) of an interest group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub render_url: Url,
    /// Serialized JSON metadata, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl Ad {
    pub fn new(render_url: Url) -> Self {
        Self {
            render_url,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestGroup {
    pub owner: Origin,
    pub name: String,
    #[serde(with = "crate::clock::unix_millis")]
    pub expiry: SystemTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidding_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidding_wasm_helper_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_bidding_signals_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_bidding_signals_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_bidding_signals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ads: Option<Vec<Ad>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_components: Option<Vec<Ad>>,
    /// Where updates are fetched from; `None` means the group is not updatable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<Url>,
}

impl InterestGroup {
    /// Minimal group with only identity and expiry set.
    pub fn new(owner: Origin, name: impl Into<String>, expiry: SystemTime) -> Self {
        Self {
            owner,
            name: name.into(),
            expiry,
            priority: None,
            bidding_url: None,
            bidding_wasm_helper_url: None,
            trusted_bidding_signals_url: None,
            trusted_bidding_signals_keys: None,
            user_bidding_signals: None,
            ads: None,
            ad_components: None,
            update_url: None,
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey::of(self)
    }

    /// A group is live strictly before its expiry.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiry <= now
    }

    pub fn is_updatable(&self) -> bool {
        self.update_url.is_some()
    }
}
