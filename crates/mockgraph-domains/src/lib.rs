//! Domain catalogs for the mockgraph engine.
//!
//! Each domain is a [`Domain`]: an ordered list of table specs where child
//! tables name the parent they link to. Vocabulary pools live next to the
//! tables that use them.

pub mod restaurant;
pub mod supplier;
pub mod venue;

mod support;

use mockgraph_generate::{Domain, Result};

/// Names of the built-in domains, in generation order.
pub const DOMAIN_NAMES: &[&str] = &[restaurant::NAME, supplier::NAME, venue::NAME];

/// Every built-in domain.
pub fn all_domains() -> Result<Vec<Domain>> {
    Ok(vec![
        restaurant::domain()?,
        supplier::domain()?,
        venue::domain()?,
    ])
}

/// Look up a built-in domain by name.
pub fn domain_by_name(name: &str) -> Result<Option<Domain>> {
    let domain = match name {
        restaurant::NAME => restaurant::domain()?,
        supplier::NAME => supplier::domain()?,
        venue::NAME => venue::domain()?,
        _ => return Ok(None),
    };
    Ok(Some(domain))
}
