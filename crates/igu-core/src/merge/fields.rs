//! Typed extraction of individual update-document fields.

use serde_json::Value;
use url::Url;

use crate::interest_group::{Ad, Origin};

use super::error::ValidationError;

/// Which extra restrictions an owner-scoped URL must satisfy.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct OwnerUrlRules {
    pub(super) forbid_query: bool,
}

pub(super) fn number(v: &Value, field: &str) -> Result<f64, ValidationError> {
    v.as_f64()
        .ok_or_else(|| ValidationError::wrong_type(field, "a number"))
}

fn string<'a>(v: &'a Value, field: &str) -> Result<&'a str, ValidationError> {
    v.as_str()
        .ok_or_else(|| ValidationError::wrong_type(field, "a string"))
}

fn parse_url(v: &Value, field: &str) -> Result<Url, ValidationError> {
    let raw = string(v, field)?;
    Url::parse(raw).map_err(|e| ValidationError::invalid_url(field, raw, e.to_string()))
}

fn has_credentials(url: &Url) -> bool {
    !url.username().is_empty() || url.password().is_some()
}

/// URL that must live on the owner's origin (bidding logic, wasm helper,
/// trusted signals).
pub(super) fn owner_url(
    owner: &Origin,
    v: &Value,
    field: &str,
    rules: OwnerUrlRules,
) -> Result<Url, ValidationError> {
    let url = parse_url(v, field)?;
    if !owner.is_same_origin(&url) {
        return Err(ValidationError::invalid_url(
            field,
            url.as_str(),
            format!("not same-origin with {owner}"),
        ));
    }
    if has_credentials(&url) {
        return Err(ValidationError::invalid_url(field, url.as_str(), "has credentials"));
    }
    if url.fragment().is_some() {
        return Err(ValidationError::invalid_url(field, url.as_str(), "has fragment"));
    }
    if rules.forbid_query && url.query().is_some() {
        return Err(ValidationError::invalid_url(field, url.as_str(), "has query"));
    }
    Ok(url)
}

pub(super) fn string_list(v: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    let items = v
        .as_array()
        .ok_or_else(|| ValidationError::wrong_type(field, "an array of strings"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| string(item, &format!("{field}[{i}]")).map(str::to_string))
        .collect()
}

fn render_url(v: &Value, field: &str) -> Result<Url, ValidationError> {
    let url = parse_url(v, field)?;
    if url.scheme() != "https" {
        return Err(ValidationError::invalid_url(field, url.as_str(), "not https"));
    }
    if has_credentials(&url) {
        return Err(ValidationError::invalid_url(field, url.as_str(), "has credentials"));
    }
    Ok(url)
}

/// `ads` / `adComponents`: array of `{renderUrl, metadata?}`.
pub(super) fn ad_list(v: &Value, field: &str) -> Result<Vec<Ad>, ValidationError> {
    let items = v
        .as_array()
        .ok_or_else(|| ValidationError::wrong_type(field, "an array of ads"))?;
    let mut ads = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let entry = format!("{field}[{i}]");
        let obj = item
            .as_object()
            .ok_or_else(|| ValidationError::wrong_type(entry.as_str(), "an object"))?;
        let url_field = format!("{entry}.renderUrl");
        let raw_url = obj
            .get("renderUrl")
            .ok_or_else(|| ValidationError::wrong_type(url_field.as_str(), "a string"))?;
        ads.push(Ad {
            render_url: render_url(raw_url, &url_field)?,
            metadata: obj.get("metadata").map(Value::to_string),
        });
    }
    Ok(ads)
}
