//! Reconciliation timing configuration

use std::time::Duration;

/// Timing knobs for the bank-transfer polling loop. The countdown shown to
/// the customer and the expiry check both derive from `payment_window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Delay between transfer-lookup polls.
    pub poll_interval: Duration,
    /// How long a pending bank-transfer order stays payable.
    pub payment_window: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            payment_window: Duration::from_secs(5 * 60),
        }
    }
}

impl ReconcileConfig {
    /// Defaults overridden by `PAYMENT_POLL_INTERVAL_SECS` and
    /// `PAYMENT_WINDOW_SECS` when set; malformed or zero values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(interval) = env_secs("PAYMENT_POLL_INTERVAL_SECS") {
            cfg.poll_interval = interval;
        }
        if let Some(window) = env_secs("PAYMENT_WINDOW_SECS") {
            cfg.payment_window = window;
        }
        cfg
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ReconcileConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_secs(3));
        assert_eq!(cfg.payment_window, Duration::from_secs(300));
    }

    #[test]
    fn test_env_secs_rejects_garbage() {
        std::env::set_var("STOREFRONT_TEST_SECS_OK", "45");
        std::env::set_var("STOREFRONT_TEST_SECS_BAD", "soon");
        std::env::set_var("STOREFRONT_TEST_SECS_ZERO", "0");
        assert_eq!(env_secs("STOREFRONT_TEST_SECS_OK"), Some(Duration::from_secs(45)));
        assert_eq!(env_secs("STOREFRONT_TEST_SECS_BAD"), None);
        assert_eq!(env_secs("STOREFRONT_TEST_SECS_ZERO"), None);
        assert_eq!(env_secs("STOREFRONT_TEST_SECS_UNSET"), None);
    }
}
