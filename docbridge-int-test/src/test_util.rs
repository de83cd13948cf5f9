use docbridge::client::DatabaseClient;
use docbridge::errors::{DbError, DbResult, ErrorKind};
use docbridge::reference::Endpoint;
use docbridge::store::memory::{MemoryStore, MemoryStoreConfig, MemoryStoreModule};
use docbridge::store::{DocumentStore, StoreModule, StoreTarget};
use docbridge::subscription::Subscription;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::future::Future;
use std::thread;
use std::time::{Duration, Instant};

/// Runs an async test with retry logic and error handling.
/// Every attempt gets its own current-thread runtime so tests do not share timers.
pub fn run_test<T, F, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> F + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    F: Future<Output = DbResult<()>>,
    B: Fn() -> DbResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DbResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => return Err((format!("Runtime failed: {:?}", e), backtrace.to_string())),
            };

            match before() {
                Ok(ctx) => match runtime.block_on(test(ctx.clone())) {
                    Ok(_) => match after(ctx) {
                        Ok(_) => Ok(()),
                        Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                    },
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Panic: {}", err_msg);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    endpoint: Endpoint,
    client: DatabaseClient,
    store: MemoryStore,
}

impl TestContext {
    pub fn new(endpoint: Endpoint, client: DatabaseClient, store: MemoryStore) -> Self {
        Self {
            endpoint,
            client,
            store,
        }
    }

    /// A collection name no other test uses.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn client(&self) -> DatabaseClient {
        self.client.clone()
    }

    /// The store behind [TestContext::client], for fault injection.
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }
}

/// Hands an existing memory store to the client builder.
struct SharedStoreModule(MemoryStore);

impl StoreModule for SharedStoreModule {
    fn get_store(&self) -> DbResult<DocumentStore> {
        Ok(DocumentStore::new(self.0.clone()))
    }
}

pub fn random_endpoint() -> DbResult<Endpoint> {
    Endpoint::new(&format!("test_{}", uuid::Uuid::new_v4().simple()))
}

pub fn create_test_context() -> DbResult<TestContext> {
    create_test_context_with(MemoryStoreConfig::new())
}

pub fn create_test_context_with(config: MemoryStoreConfig) -> DbResult<TestContext> {
    let store = MemoryStore::new(config);
    let client = DatabaseClient::builder()
        .target(StoreTarget::for_site("emulated_site", "docbridge-test"))
        .load_module(SharedStoreModule(store.clone()))
        .build()?;
    Ok(TestContext::new(random_endpoint()?, client, store))
}

/// A context whose store accepts at most `max_batch_size` writes per batch.
pub fn create_batch_limited_context(max_batch_size: usize) -> DbResult<TestContext> {
    let module = MemoryStoreModule::with_config()
        .max_batch_size(max_batch_size)
        .build()?;
    create_test_context_with(module.config().clone())
}

/// A context whose store rejects every write.
pub fn create_read_only_context() -> DbResult<TestContext> {
    let module = MemoryStoreModule::with_config().read_only(true).build()?;
    create_test_context_with(module.config().clone())
}

pub fn cleanup(ctx: TestContext) -> DbResult<()> {
    let store = ctx.store();
    if !store.is_available() {
        store.restore();
    }
    if store.watch_count() > 0 {
        log::warn!("{} watches still registered after test", store.watch_count());
    }
    Ok(())
}

/// Waits at most `timeout_ms` for the next item of `subscription`.
pub async fn next_within<T>(subscription: &mut Subscription<T>, timeout_ms: u64) -> DbResult<Option<DbResult<T>>> {
    Ok(tokio::time::timeout(Duration::from_millis(timeout_ms), subscription.next_snapshot()).await?)
}

/// Waits until `subscription` yields a snapshot satisfying `check`.
pub async fn wait_for_snapshot<T, C>(subscription: &mut Subscription<T>, timeout_ms: u64, check: C) -> DbResult<T>
where
    C: Fn(&T) -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let remaining_ms = remaining.as_millis().max(1) as u64;
        match next_within(subscription, remaining_ms).await? {
            Some(Ok(snapshot)) if check(&snapshot) => return Ok(snapshot),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e),
            None => {
                return Err(DbError::new(
                    "Subscription ended before the expected snapshot",
                    ErrorKind::SubscriptionClosed,
                ))
            }
        }
    }
}

/// `true` if `subscription` yields nothing for `window_ms`.
pub async fn stays_silent<T>(subscription: &mut Subscription<T>, window_ms: u64) -> bool {
    match next_within(subscription, window_ms).await {
        Err(_) => true,
        Ok(None) => true,
        Ok(Some(_)) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub country: String,
    pub age: u32,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Profile {
    pub fn new(id: &str, username: &str, country: &str, age: u32) -> Self {
        Profile {
            id: id.to_string(),
            username: username.to_string(),
            country: country.to_string(),
            age,
            verified: false,
            interests: Vec::new(),
        }
    }

    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    pub fn interested_in(mut self, interests: &[&str]) -> Self {
        self.interests = interests.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// `count` distinct profiles with ids `p0000`, `p0001`, ...
pub fn create_test_profiles(count: usize) -> Vec<Profile> {
    const COUNTRIES: [&str; 4] = ["NL", "DE", "FR", "UK"];
    (0..count)
        .map(|i| {
            let profile = Profile::new(
                &format!("p{:04}", i),
                &format!("user{}", i),
                COUNTRIES[i % COUNTRIES.len()],
                18 + (i % 50) as u32,
            );
            if i % 3 == 0 {
                profile.verified()
            } else {
                profile
            }
        })
        .collect()
}
