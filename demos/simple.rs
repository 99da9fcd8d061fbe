use std::sync::Arc;

use coffee_dataload::coffees::{Catalog, RequestContext};
use futures::future;

#[tokio::main]
async fn main() {
    let mut catalog = Catalog::new();
    let roast = catalog.insert_coffee("Shipwreck Roast", "Buddy Brew");
    let blend = catalog.insert_coffee("House Blend", "Nescafe");
    let chocolate = catalog.insert_flavor("chocolate");
    let vanilla = catalog.insert_flavor("vanilla");
    catalog.link(roast.id, chocolate.id).unwrap();
    catalog.link(roast.id, vanilla.id).unwrap();

    // One context per inbound request.
    let request = RequestContext::new(Arc::new(catalog));

    let (roast_flavors, blend_flavors) =
        future::join(request.flavors_of(&roast), request.flavors_of(&blend)).await;

    let roast_flavors = roast_flavors.unwrap();
    assert_eq!(
        roast_flavors.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["chocolate", "vanilla"]
    );
    assert!(blend_flavors.unwrap().is_empty());
    assert_eq!(request.catalog().flavor_queries(), 1);
}
