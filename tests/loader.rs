use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coffee_dataload::{BatchFunction, FetchError, LoadError, Loader};
use futures::future;

#[derive(Debug, PartialEq, Eq, Clone)]
struct DummyData(String);

fn data(values: &[&str]) -> Vec<DummyData> {
    values.iter().map(|v| DummyData((*v).to_owned())).collect()
}

#[derive(Default)]
struct DummyContext {
    map: HashMap<i64, Vec<DummyData>>,
    /// Keys to leave out of the returned map even though they were requested.
    omit: Vec<i64>,
    fail_with: Option<FetchError>,
    calls: Mutex<Vec<Vec<i64>>>,
}

impl DummyContext {
    fn calls(&self) -> Vec<Vec<i64>> {
        self.calls.lock().unwrap().clone()
    }
}

struct DummyDataLoader;

#[async_trait]
impl BatchFunction<i64, Vec<DummyData>> for DummyDataLoader {
    type Context = Arc<DummyContext>;
    async fn load(
        keys: &[i64],
        context: &Self::Context,
    ) -> Result<HashMap<i64, Vec<DummyData>>, FetchError> {
        let mut sorted = keys.to_vec();
        sorted.sort();
        context.calls.lock().unwrap().push(sorted);
        if let Some(error) = &context.fail_with {
            return Err(error.clone());
        }
        Ok(keys
            .iter()
            .filter(|k| !context.omit.contains(k))
            .map(|k| (*k, context.map.get(k).cloned().unwrap_or_default()))
            .collect())
    }
}

fn loader(context: DummyContext) -> (Loader<i64, Vec<DummyData>>, Arc<DummyContext>) {
    let context = Arc::new(context);
    (Loader::new(DummyDataLoader {}, context.clone()), context)
}

#[tokio::test]
async fn basic_load() {
    let mut context = DummyContext::default();
    context.map.insert(42, data(&["Foo"]));

    let (loader, _) = loader(context);
    assert_eq!(loader.load(42).await, Ok(data(&["Foo"])));
}

#[tokio::test]
async fn same_turn_loads_share_one_fetch() {
    let mut context = DummyContext::default();
    context.map.insert(1, data(&["A", "B"]));

    let (loader, context) = loader(context);
    let one = loader.load(1);
    let two = loader.load(2);

    assert_eq!(future::join(one, two).await, (Ok(data(&["A", "B"])), Ok(vec![])));
    assert_eq!(context.calls(), vec![vec![1, 2]]);
}

#[tokio::test]
async fn duplicate_keys_are_fetched_once() {
    let mut context = DummyContext::default();
    context.map.insert(3, data(&["X"]));

    let (loader, context) = loader(context);
    let results = future::join(loader.load(3), loader.load(3)).await;

    assert_eq!(results, (Ok(data(&["X"])), Ok(data(&["X"]))));
    assert_eq!(context.calls(), vec![vec![3]]);
}

#[tokio::test]
async fn fetch_error_fails_whole_frame() {
    let context = DummyContext {
        fail_with: Some(FetchError::Unavailable("db down".to_owned())),
        ..Default::default()
    };

    let (loader, context) = loader(context);
    let results =
        future::join3(loader.load(5), loader.load(6), loader.load_many(vec![5, 7])).await;

    let expected = LoadError::Fetch(FetchError::Unavailable("db down".to_owned()));
    assert_eq!(results, (Err(expected.clone()), Err(expected.clone()), Err(expected)));
    assert_eq!(context.calls(), vec![vec![5, 6, 7]]);
}

#[tokio::test]
async fn single_fetch_error_is_propagated() {
    let context = DummyContext {
        fail_with: Some(FetchError::MalformedQuery("bad".to_owned())),
        ..Default::default()
    };

    let (loader, _) = loader(context);
    assert_eq!(
        loader.load(5).await,
        Err(LoadError::Fetch(FetchError::MalformedQuery("bad".to_owned())))
    );
}

#[tokio::test]
async fn omitted_key_is_reported_as_missing() {
    let mut context = DummyContext { omit: vec![9], ..Default::default() };
    context.map.insert(8, data(&["kept"]));

    let (loader, _) = loader(context);
    let results = future::join(loader.load(8), loader.load(9)).await;

    assert_eq!(results, (Ok(data(&["kept"])), Err(LoadError::MissingKey("9".to_owned()))));
}

#[tokio::test]
async fn separate_turns_fetch_again() {
    let mut context = DummyContext::default();
    context.map.insert(42, data(&["Foo"]));

    let (loader, context) = loader(context);
    assert_eq!(loader.load(42).await, Ok(data(&["Foo"])));
    assert_eq!(loader.load(42).await, Ok(data(&["Foo"])));
    assert_eq!(context.calls(), vec![vec![42], vec![42]]);
}

#[tokio::test]
async fn basic_load_many() {
    let mut context = DummyContext::default();
    context.map.insert(42, data(&["one fish"]));
    context.map.insert(12, data(&["two fish"]));
    context.map.insert(5, data(&["red fish"]));
    context.map.insert(8, data(&["blue fish"]));

    let (loader, _) = loader(context);
    assert_eq!(
        loader.load_many(vec![5, 12, 8]).await,
        Ok(vec![data(&["red fish"]), data(&["two fish"]), data(&["blue fish"])])
    );
}

#[tokio::test]
async fn empty_load_many_skips_fetch() {
    let (loader, context) = loader(DummyContext::default());
    assert_eq!(loader.load_many(vec![]).await, Ok(vec![]));
    assert!(context.calls().is_empty());
}

#[tokio::test]
async fn load_async() {
    let mut context = DummyContext::default();
    context.map.insert(42, data(&["one fish"]));
    context.map.insert(12, data(&["two fish"]));
    context.map.insert(5, data(&["red fish"]));

    let (loader, context) = loader(context);

    let tuple = future::join4(
        loader.load(5),
        loader.load_many(vec![5, 42]),
        loader.load(99),
        loader.load(12),
    );

    assert_eq!(
        tuple.await,
        (
            Ok(data(&["red fish"])),
            Ok(vec![data(&["red fish"]), data(&["one fish"])]),
            Ok(vec![]),
            Ok(data(&["two fish"]))
        )
    );
    assert_eq!(context.calls(), vec![vec![5, 12, 42, 99]]);
}

#[tokio::test]
async fn dropped_handle_does_not_affect_others() {
    let mut context = DummyContext::default();
    context.map.insert(1, data(&["A"]));

    let (loader, context) = loader(context);
    drop(loader.load(1));
    assert_eq!(loader.load(1).await, Ok(data(&["A"])));
    assert_eq!(context.calls(), vec![vec![1]]);
}

#[tokio::test]
async fn large_turn_is_one_fetch() {
    let (loader, context) = loader(DummyContext::default());

    let handles = (0..5000).map(|k| loader.load(k % 2500)).collect::<Vec<_>>();
    let results = future::join_all(handles).await;

    assert!(results.iter().all(|r| r == &Ok(vec![])));
    assert_eq!(context.calls(), vec![(0..2500).collect::<Vec<_>>()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn multi_thread_turn_is_not_split() {
    let mut context = DummyContext::default();
    context.map.insert(1, data(&["A"]));

    let (loader, context) = loader(context);
    let one = loader.load(1);
    // Blocks this worker thread without reaching an await point.
    std::thread::sleep(std::time::Duration::from_millis(20));
    let two = loader.load(2);

    assert_eq!(future::join(one, two).await, (Ok(data(&["A"])), Ok(vec![])));
    assert_eq!(context.calls(), vec![vec![1, 2]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn multi_thread_large_turn_is_one_fetch() {
    let (loader, context) = loader(DummyContext::default());

    let handles = (0..20000).map(|k| loader.load(k)).collect::<Vec<_>>();
    let results = future::join_all(handles).await;

    assert_eq!(results.len(), 20000);
    assert_eq!(context.calls().len(), 1);
    assert_eq!(context.calls()[0].len(), 20000);
}

#[tokio::test]
async fn spawned_resolvers_share_one_fetch() {
    let mut context = DummyContext::default();
    context.map.insert(1, data(&["one"]));
    context.map.insert(3, data(&["three"]));

    let (loader, context) = loader(context);
    let loader = Arc::new(loader);

    let tasks = (1..=4)
        .map(|k| {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.load(k).await })
        })
        .collect::<Vec<_>>();
    let results = future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect::<Vec<_>>();

    assert_eq!(results, vec![Ok(data(&["one"])), Ok(vec![]), Ok(data(&["three"])), Ok(vec![])]);
    assert_eq!(context.calls(), vec![vec![1, 2, 3, 4]]);
}

#[tokio::test]
async fn dropped_loader_stops_pending_handles() {
    let (loader, context) = loader(DummyContext::default());

    let pending = loader.load(1);
    drop(loader);

    assert_eq!(pending.await, Err(LoadError::WorkerStopped));
    assert!(context.calls().is_empty());
}
