use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;

use super::entities::{Coffee, CoffeeId, Flavor, FlavorId};
use crate::error::FetchError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Coffee #{0} does not exist")]
    CoffeeNotFound(CoffeeId),
}

/// In-memory relational store holding coffees, flavors and the `coffee_flavors` join table
/// between them.
///
/// Rows are only added through `&mut self`; once the catalog is shared (usually behind an `Arc`)
/// it can still be taken offline, and it counts the bulk flavor queries it serves.
#[derive(Debug)]
pub struct Catalog {
    coffees: Vec<Coffee>,
    flavors: HashMap<FlavorId, Flavor>,
    coffee_flavors: Vec<(CoffeeId, FlavorId)>,
    next_coffee_id: i64,
    next_flavor_id: i64,
    available: AtomicBool,
    flavor_queries: AtomicUsize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            coffees: Vec::new(),
            flavors: HashMap::new(),
            coffee_flavors: Vec::new(),
            next_coffee_id: 1,
            next_flavor_id: 1,
            available: AtomicBool::new(true),
            flavor_queries: AtomicUsize::new(0),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_coffee(&mut self, name: &str, brand: &str) -> Coffee {
        let coffee = Coffee {
            id: CoffeeId(self.next_coffee_id),
            name: name.to_owned(),
            brand: brand.to_owned(),
        };
        self.next_coffee_id += 1;
        self.coffees.push(coffee.clone());
        coffee
    }

    pub fn insert_flavor(&mut self, name: &str) -> Flavor {
        let flavor = Flavor { id: FlavorId(self.next_flavor_id), name: name.to_owned() };
        self.next_flavor_id += 1;
        self.flavors.insert(flavor.id, flavor.clone());
        flavor
    }

    /// Attaches a flavor to a coffee. Linking the same pair twice is a no-op.
    pub fn link(&mut self, coffee: CoffeeId, flavor: FlavorId) -> Result<(), CatalogError> {
        self.find_one_coffee(coffee)?;
        if !self.coffee_flavors.contains(&(coffee, flavor)) {
            self.coffee_flavors.push((coffee, flavor));
        }
        Ok(())
    }

    pub fn find_all_coffees(&self) -> Vec<Coffee> {
        self.coffees.clone()
    }

    pub fn find_one_coffee(&self, id: CoffeeId) -> Result<Coffee, CatalogError> {
        self.coffees
            .iter()
            .find(|coffee| coffee.id == id)
            .cloned()
            .ok_or(CatalogError::CoffeeNotFound(id))
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `flavors_by_coffee_ids` queries served so far, failed ones included.
    pub fn flavor_queries(&self) -> usize {
        self.flavor_queries.load(Ordering::SeqCst)
    }

    /// Fetches the flavors of all the given coffees in a single pass over the join table.
    ///
    /// Coffees without flavors are absent from the result. Flavors are listed in the order they
    /// were linked.
    pub fn flavors_by_coffee_ids(
        &self,
        ids: &[CoffeeId],
    ) -> Result<HashMap<CoffeeId, Vec<Flavor>>, FetchError> {
        self.flavor_queries.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("catalog is offline".to_owned()));
        }
        if ids.is_empty() {
            return Err(FetchError::MalformedQuery("empty coffee id list".to_owned()));
        }

        let wanted = ids.iter().collect::<HashSet<_>>();
        let mut grouped: HashMap<CoffeeId, Vec<Flavor>> = HashMap::new();
        for (coffee_id, flavor_id) in self.coffee_flavors.iter() {
            if !wanted.contains(coffee_id) {
                continue;
            }
            if let Some(flavor) = self.flavors.get(flavor_id) {
                grouped.entry(*coffee_id).or_default().push(flavor.clone());
            }
        }
        Ok(grouped)
    }
}
