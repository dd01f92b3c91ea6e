/// Base URL of the private TimeTree API.
pub const DEFAULT_API_URL: &str = "https://timetreeapp.com/api/v1";

/// Client agent sent in the `X-Timetreea` header.
pub const DEFAULT_AGENT: &str = "web/2.1.0/en";

pub const AGENT_HEADER: &str = "X-Timetreea";

pub const SESSION_COOKIE: &str = "_session_id";

/// Total attempts for a remote call before the cycle is given up.
pub const MAX_ATTEMPTS: u32 = 3;

/// How far before calendar creation a default fetch window reaches.
pub const DEFAULT_LOOKBACK_WEEKS: i64 = 52;

/// Stand-in for an unbounded future in a default fetch window.
pub const DEFAULT_LOOKAHEAD_WEEKS: i64 = 1000;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
