// src/config/consts.rs

// Source
pub const DEFAULT_URL: &str = "https://valueinvesting.io/nancy-pelosi-stock-trades-tracker";
pub const FETCH_TIMEOUT_SECS: u64 = 15;
pub const USER_AGENT: &str = concat!("trade_watch/", env!("CARGO_PKG_VERSION"));

// The one column every row is ordered by.
pub const DEFAULT_DATE_COLUMN: &str = "Transaction Date";

// Snapshot
pub const DEFAULT_SNAPSHOT_FILE: &str = "trades.csv";

// Local scratch (interactive page dumps, debug log)
pub const STORE_DIR: &str = ".store";
pub const LAST_PAGE_FILE: &str = "last_page.html";

// Notification
pub const DEFAULT_SUBJECT: &str = "Pelosi Trades Update";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const UPDATE_DATE_COLUMN: &str = "Update Date";

// Credential keys read from the environment (or .env)
pub const ENV_EMAIL_USER: &str = "EMAIL_USER";
pub const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
