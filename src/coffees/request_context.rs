use std::future::Future;
use std::sync::Arc;

use super::{
    catalog::Catalog,
    entities::{Coffee, CoffeeId, Flavor},
    flavors_by_coffee::FlavorsByCoffee,
};
use crate::{error::LoadError, loader::Loader};

/// State scoped to a single inbound API request.
///
/// Build one per request and pass it down to the field resolvers; its loader must never serve
/// two requests. Dropping the context stops the loader's worker.
pub struct RequestContext {
    catalog: Arc<Catalog>,
    flavors_by_coffee: Loader<CoffeeId, Vec<Flavor>>,
}

impl RequestContext {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let flavors_by_coffee = Loader::new(FlavorsByCoffee, Arc::clone(&catalog));
        Self { catalog, flavors_by_coffee }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolves the `flavors` field of a coffee.
    ///
    /// Calls made for sibling coffees in the same turn share one catalog query.
    pub fn flavors_of(
        &self,
        coffee: &Coffee,
    ) -> impl Future<Output = Result<Vec<Flavor>, LoadError>> {
        self.flavors_by_coffee.load(coffee.id)
    }
}
