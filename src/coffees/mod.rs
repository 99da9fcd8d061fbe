//! The coffee catalog and the per-request loading of each coffee's flavors.

mod catalog;
mod entities;
mod flavors_by_coffee;
mod request_context;

pub use catalog::{Catalog, CatalogError};
pub use entities::{Coffee, CoffeeId, Flavor, FlavorId};
pub use flavors_by_coffee::FlavorsByCoffee;
pub use request_context::RequestContext;
