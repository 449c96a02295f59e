//! Cross-cycle failure bookkeeping.
//!
//! Failed purchases stay pending on chain and are re-fetched every cycle.
//! [`AttemptLedger`] counts failed pipeline runs per `(network, purchase)`
//! so a purchase that keeps failing stops consuming generation credits
//! once it reaches the limit. Counts live in memory only and reset on
//! restart.

use std::collections::{HashMap, HashSet};

use donkeys_core::types::PurchaseId;

#[derive(Debug)]
pub struct AttemptLedger {
    max_attempts: u32,
    failures: HashMap<(String, PurchaseId), u32>,
}

impl AttemptLedger {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            failures: HashMap::new(),
        }
    }

    /// Failed runs recorded for a purchase.
    pub fn failures(&self, network: &str, id: PurchaseId) -> u32 {
        self.failures
            .get(&(network.to_string(), id))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the purchase has used up its attempts.
    pub fn is_exhausted(&self, network: &str, id: PurchaseId) -> bool {
        self.failures(network, id) >= self.max_attempts
    }

    /// Record one failed run; returns the new count.
    pub fn record_failure(&mut self, network: &str, id: PurchaseId) -> u32 {
        let count = self.failures.entry((network.to_string(), id)).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Mark a purchase as exhausted at once (errors no retry can fix).
    pub fn exhaust(&mut self, network: &str, id: PurchaseId) {
        self.failures
            .insert((network.to_string(), id), self.max_attempts);
    }

    /// Forget a purchase, e.g. after it was minted.
    pub fn clear(&mut self, network: &str, id: PurchaseId) {
        self.failures.remove(&(network.to_string(), id));
    }

    /// Drop entries of `network` that the chain no longer reports.
    pub fn retain_pending(&mut self, network: &str, pending: &HashSet<PurchaseId>) {
        self.failures
            .retain(|(net, id), _| net != network || pending.contains(id));
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_after_max_attempts() {
        let mut ledger = AttemptLedger::new(2);
        assert!(!ledger.is_exhausted("sepolia", 4));
        assert_eq!(ledger.record_failure("sepolia", 4), 1);
        assert!(!ledger.is_exhausted("sepolia", 4));
        assert_eq!(ledger.record_failure("sepolia", 4), 2);
        assert!(ledger.is_exhausted("sepolia", 4));
    }

    #[test]
    fn networks_are_independent() {
        let mut ledger = AttemptLedger::new(1);
        ledger.record_failure("sepolia", 4);
        assert!(ledger.is_exhausted("sepolia", 4));
        assert!(!ledger.is_exhausted("base", 4));
    }

    #[test]
    fn exhaust_and_clear() {
        let mut ledger = AttemptLedger::new(5);
        ledger.exhaust("sepolia", 1);
        assert!(ledger.is_exhausted("sepolia", 1));
        ledger.clear("sepolia", 1);
        assert!(!ledger.is_exhausted("sepolia", 1));
        assert!(ledger.is_empty());
    }

    #[test]
    fn retain_pending_only_touches_network() {
        let mut ledger = AttemptLedger::new(5);
        ledger.record_failure("sepolia", 1);
        ledger.record_failure("sepolia", 2);
        ledger.record_failure("base", 1);

        let pending: HashSet<PurchaseId> = [2].into_iter().collect();
        ledger.retain_pending("sepolia", &pending);

        assert_eq!(ledger.failures("sepolia", 1), 0);
        assert_eq!(ledger.failures("sepolia", 2), 1);
        assert_eq!(ledger.failures("base", 1), 1);
        assert_eq!(ledger.len(), 2);
    }
}
