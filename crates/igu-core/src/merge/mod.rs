//! Validation and application of update documents.
//!
//! An update document is the JSON object served at a group's update URL.
//! Recognised fields replace the stored value wholesale; absent fields leave
//! the stored value alone; unrecognised fields are ignored. `name` and
//! `owner` are identity checks only. `expiry`, `updateUrl` and
//! `userBiddingSignals` are never touched.
//!
//! Application is all-or-nothing: the merged record is built on a copy and
//! only returned once every field has validated.

mod error;
mod fields;

use serde_json::{Map, Value};

use crate::interest_group::{InterestGroup, Origin};

pub use error::ValidationError;

use fields::{ad_list, number, owner_url, string_list, OwnerUrlRules};

/// Validate `doc` against `record` and return the merged record.
///
/// On error `record` is untouched and nothing of `doc` is applied.
pub fn apply(record: &InterestGroup, doc: &Value) -> Result<InterestGroup, ValidationError> {
    let fields = doc.as_object().ok_or(ValidationError::NotAnObject)?;
    check_identity(record, fields)?;

    let mut merged = record.clone();
    let owner = &record.owner;

    if let Some(v) = fields.get("priority") {
        merged.priority = Some(number(v, "priority")?);
    }
    if let Some(v) = fields.get("biddingLogicUrl") {
        merged.bidding_url = Some(owner_url(owner, v, "biddingLogicUrl", OwnerUrlRules::default())?);
    }
    if let Some(v) = fields.get("biddingWasmHelperUrl") {
        merged.bidding_wasm_helper_url = Some(owner_url(
            owner,
            v,
            "biddingWasmHelperUrl",
            OwnerUrlRules::default(),
        )?);
    }
    if let Some(v) = fields.get("trustedBiddingSignalsUrl") {
        merged.trusted_bidding_signals_url = Some(owner_url(
            owner,
            v,
            "trustedBiddingSignalsUrl",
            OwnerUrlRules { forbid_query: true },
        )?);
    }
    if let Some(v) = fields.get("trustedBiddingSignalsKeys") {
        merged.trusted_bidding_signals_keys = Some(string_list(v, "trustedBiddingSignalsKeys")?);
    }
    if let Some(v) = fields.get("ads") {
        merged.ads = Some(ad_list(v, "ads")?);
    }
    if let Some(v) = fields.get("adComponents") {
        merged.ad_components = Some(ad_list(v, "adComponents")?);
    }

    Ok(merged)
}

fn check_identity(record: &InterestGroup, fields: &Map<String, Value>) -> Result<(), ValidationError> {
    if let Some(v) = fields.get("name") {
        let name = v
            .as_str()
            .ok_or_else(|| ValidationError::wrong_type("name", "a string"))?;
        if name != record.name {
            return Err(ValidationError::IdentityMismatch {
                field: "name",
                expected: record.name.clone(),
                found: name.to_string(),
            });
        }
    }
    if let Some(v) = fields.get("owner") {
        let raw = v
            .as_str()
            .ok_or_else(|| ValidationError::wrong_type("owner", "a string"))?;
        let matches = Origin::parse(raw).map(|o| o == record.owner).unwrap_or(false);
        if !matches {
            return Err(ValidationError::IdentityMismatch {
                field: "owner",
                expected: record.owner.to_string(),
                found: raw.to_string(),
            });
        }
    }
    Ok(())
}
