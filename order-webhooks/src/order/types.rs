//! Order payload types.
//!
//! Shopify's `orders/create` payload carries hundreds of fields. Only the
//! shipping address lines and the customer email are modelled here; every
//! other field is ignored during deserialization.
//!
//! The order and its shipping address must be JSON objects. The customer
//! section is only needed when an email has to be sent, so a customer or
//! email of the wrong type reads as absent instead of failing the parse.

use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Order as delivered by the `orders/create` webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Delivery address, absent for orders that need no shipping
    #[serde(default, deserialize_with = "object_only")]
    pub shipping_address: Option<ShippingAddress>,
    /// Customer record, absent for some POS and draft orders
    #[serde(default, deserialize_with = "lenient_object")]
    pub customer: Option<Customer>,
}

/// Shipping address lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street address
    #[serde(default)]
    pub address1: Option<String>,
    /// Apartment, suite, unit
    #[serde(default)]
    pub address2: Option<String>,
}

/// Customer contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
}

/// Accept `T` only from a JSON object or `null`.
///
/// Derived struct impls also accept arrays, matching fields by position.
fn object_only<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        Some(map) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(de::Error::custom),
        None => Ok(None),
    }
}

/// Like [`object_only`], but anything that does not fit reads as `None`.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(serde_json::from_value(Value::Object(map)).ok()),
        _ => Ok(None),
    }
}

/// Any value that does not deserialize as `T` reads as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Order {
    /// Parse an order from a raw JSON body.
    ///
    /// The body must be a JSON object.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let map: Map<String, Value> = serde_json::from_slice(body)?;
        serde_json::from_value(Value::Object(map))
    }

    /// The customer's email address, if one was supplied.
    pub fn customer_email(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Whether the shipping address street lines are plain ASCII.
    ///
    /// An order without a shipping address passes.
    pub fn has_ascii_shipping_address(&self) -> bool {
        self.shipping_address
            .as_ref()
            .map(|a| super::is_ascii_address(&a.street_lines()))
            .unwrap_or(true)
    }
}

impl ShippingAddress {
    /// `address1` and `address2` joined by a single space, skipping empty lines.
    pub fn street_lines(&self) -> String {
        [self.address1.as_deref(), self.address2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
