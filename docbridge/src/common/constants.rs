// doc constants
pub const DOC_ID: &str = "_id";

// query constants
pub const DEFAULT_QUERY_LIMIT: u64 = 1000;
pub const MAX_DISJUNCTION_VALUES: usize = 10;

// store constants
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;
pub const EMULATED_SITE: &str = "emulated_site";
pub const EMULATOR_HOST: &str = "localhost";
pub const EMULATOR_PORT: u16 = 4003;

// event constants
pub const STORE_CHANGE_EVENT: &str = "docbridge_store_change";
