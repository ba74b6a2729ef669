//! In-memory collaborator fakes with failure injection.

use crate::application::ports::{
    LoginHistoryStore, StoreUnavailable, VendorLedger, WriteProtection,
};
use crate::domain::fraud::VendorRecord;
use crate::domain::travel::LoginEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory vendor ledger.
///
/// `set_unavailable(true)` makes every lookup fail, for exercising the
/// cold-start fallback path.
#[derive(Debug, Default)]
pub struct InMemoryVendorLedger {
    records: Mutex<HashMap<String, VendorRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryVendorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record under a vendor display name.
    pub fn insert(&self, name: &str, record: VendorRecord) {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .insert(name.to_string(), record);
    }

    /// Make subsequent lookups fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl VendorLedger for InMemoryVendorLedger {
    fn find_by_name(&self, name: &str) -> Result<Option<VendorRecord>, StoreUnavailable> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreUnavailable::new("vendor ledger unreachable"));
        }
        Ok(self
            .records
            .lock()
            .expect("ledger mutex poisoned")
            .get(name)
            .cloned())
    }
}

/// In-memory login-history store.
#[derive(Debug, Default)]
pub struct InMemoryLoginHistory {
    last: Mutex<HashMap<String, LoginEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryLoginHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` as the identity's last login, the way the calling
    /// layer would after an assessment.
    pub fn record_login(&self, event: LoginEvent) {
        self.last
            .lock()
            .expect("history mutex poisoned")
            .insert(event.identity.clone(), event);
    }

    /// Make subsequent lookups fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl LoginHistoryStore for InMemoryLoginHistory {
    fn last_login(&self, identity: &str) -> Result<Option<LoginEvent>, StoreUnavailable> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreUnavailable::new("login history unreachable"));
        }
        Ok(self
            .last
            .lock()
            .expect("history mutex poisoned")
            .get(identity)
            .cloned())
    }
}

/// Fake backing-store write-protection switch.
#[derive(Debug, Default)]
pub struct MockWriteProtection {
    read_only: AtomicBool,
    fail: AtomicBool,
}

impl MockWriteProtection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the fake store currently believes it is read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    /// Make subsequent propagation attempts fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl WriteProtection for MockWriteProtection {
    fn set_read_only(&self, enabled: bool) -> Result<(), StoreUnavailable> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreUnavailable::new("write-protection switch unreachable"));
        }
        self.read_only.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_ledger_lookup_and_failure_injection() {
        let ledger = InMemoryVendorLedger::new();
        ledger.insert(
            "Acme",
            VendorRecord {
                vendor_id: "v1".to_string(),
                known_bank_fingerprint: "H1".to_string(),
                historical_average_amount: Some(1000.0),
            },
        );

        assert!(ledger.find_by_name("Acme").unwrap().is_some());
        assert!(ledger.find_by_name("Unknown").unwrap().is_none());

        ledger.set_unavailable(true);
        assert!(ledger.find_by_name("Acme").is_err());

        ledger.set_unavailable(false);
        assert!(ledger.find_by_name("Acme").unwrap().is_some());
    }

    #[test]
    fn test_history_roundtrip() {
        let history = InMemoryLoginHistory::new();
        assert_eq!(history.last_login("alice").unwrap(), None);

        let event = LoginEvent {
            identity: "alice".to_string(),
            source_address: "203.0.113.9".to_string(),
            latitude: Some(50.0),
            longitude: Some(30.0),
            timestamp: Utc::now(),
        };
        history.record_login(event.clone());

        assert_eq!(history.last_login("alice").unwrap(), Some(event));
    }

    #[test]
    fn test_write_protection_flag() {
        let protection = MockWriteProtection::new();
        protection.set_read_only(true).unwrap();
        assert!(protection.is_read_only());

        protection.set_failing(true);
        assert!(protection.set_read_only(false).is_err());
        // Failed call leaves the flag untouched.
        assert!(protection.is_read_only());
    }
}
