//! Startup banner.

use crate::config::{DashboardConfig, redact};
use crate::consts::AUTHOR;

/// Session facts shown once at startup and by `/config`.
pub struct BannerInfo<'a> {
    pub title: &'a str,
    pub mode: &'a str,
    pub store: String,
    pub trigger: String,
    pub read_key: String,
    pub write_key: String,
    pub phase: &'a str,
    pub cache_ttl_secs: u64,
    pub trigger_timeout_secs: u64,
}

impl<'a> BannerInfo<'a> {
    pub fn from_config(config: &'a DashboardConfig, mode: &'a str) -> Self {
        Self {
            title: &config.title,
            mode,
            store: config
                .store_url
                .clone()
                .unwrap_or_else(|| "not configured".to_string()),
            trigger: config
                .trigger_url()
                .unwrap_or_else(|_| "not configured".to_string()),
            read_key: redact(config.read_key.as_deref()),
            write_key: redact(config.write_key.as_deref()),
            phase: &config.pending_phase,
            cache_ttl_secs: config.cache_ttl.as_secs(),
            trigger_timeout_secs: config.trigger_timeout.as_secs(),
        }
    }
}

/// The key/value block shared by the banner and `/config`.
pub fn session_lines(info: &BannerInfo) -> String {
    format!(
        "   mode      {}\n   store     {}\n   scorer    {}\n   read key  {}\n   write key {}\n   phase     {}\n   cache     {}s\n   timeout   {}s\n",
        info.mode,
        info.store,
        info.trigger,
        info.read_key,
        info.write_key,
        info.phase,
        info.cache_ttl_secs,
        info.trigger_timeout_secs,
    )
}

pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║             S I G - S E L             ║
   ║      committee evaluation console     ║
   ╚═══════════════════════════════════════╝

   {}
   version   {} by {}
{}
   type /help for commands"#,
        info.title,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        session_lines(info),
    );
}
