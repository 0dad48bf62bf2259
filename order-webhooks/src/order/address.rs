//! Shipping address character-set check.
//!
//! Carriers and label printers downstream only accept 7-bit ASCII, so any
//! other character in the street lines needs the customer's attention.

/// Returns `false` if the address contains any non-ASCII character.
///
/// The empty string is ASCII.
pub fn is_ascii_address(address: &str) -> bool {
    address.is_ascii()
}
