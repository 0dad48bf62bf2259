//! Order payload module.
//!
//! This module provides:
//! - The subset of Shopify's order payload this service reads
//! - The shipping address ASCII check
//!
//! ## Flow
//!
//! ```text
//! raw body → Order::from_slice() → has_ascii_shipping_address()
//! ```

pub mod address;
pub mod types;

pub use address::is_ascii_address;
pub use types::{Customer, Order, ShippingAddress};
