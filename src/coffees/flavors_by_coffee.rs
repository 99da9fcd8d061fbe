use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{
    catalog::Catalog,
    entities::{CoffeeId, Flavor},
};
use crate::{batch_function::BatchFunction, error::FetchError};

/// Loads the flavors of a batch of coffees with one catalog query.
///
/// Every requested coffee gets an entry; coffees without flavors map to an empty `Vec`.
pub struct FlavorsByCoffee;

#[async_trait]
impl BatchFunction<CoffeeId, Vec<Flavor>> for FlavorsByCoffee {
    type Context = Arc<Catalog>;

    async fn load(
        keys: &[CoffeeId],
        catalog: &Arc<Catalog>,
    ) -> Result<HashMap<CoffeeId, Vec<Flavor>>, FetchError> {
        let mut grouped = catalog.flavors_by_coffee_ids(keys)?;
        for key in keys {
            grouped.entry(*key).or_default();
        }
        Ok(grouped)
    }
}
