//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Window title when none is configured.
pub const DEFAULT_TITLE: &str = "SIG-SEL - Bid Evaluation";

/// Phase a case must be in to show up in the selector.
pub const DEFAULT_PENDING_PHASE: &str = "Evaluando Ofertas";

/// Label prefixed to every monetary amount.
pub const CURRENCY_LABEL: &str = "S/";

/// How long cached reads stay fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on a single scoring trigger call.
pub const DEFAULT_TRIGGER_TIMEOUT: Duration = Duration::from_secs(60);

/// Path of the scoring function, relative to the store URL.
pub const TRIGGER_FUNCTION_PATH: &str = "/functions/v1/evaluar_ofertas_sigsel";

/// REST prefix for table reads, relative to the store URL.
pub const REST_PATH: &str = "/rest/v1";

pub const CASES_TABLE: &str = "expedientes_contratacion";
pub const BIDS_TABLE: &str = "ofertas_recibidas";

/// Default settings path: `~/.sigsel/sigsel.db`.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sigsel").join("sigsel.db"))
}

/// Format a whole number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
