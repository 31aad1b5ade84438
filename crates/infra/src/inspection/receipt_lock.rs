//! Per-receipt mutual exclusion for report creation.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use batchline_inventory::ReceiptId;

/// Keyed lock: at most one holder per receipt id, unrelated receipts never
/// wait on each other.
#[derive(Debug, Default)]
pub struct ReceiptLocks {
    held: Mutex<HashSet<ReceiptId>>,
    released: Condvar,
}

impl ReceiptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `receipt_id` is free, then hold it until the guard drops.
    pub fn lock(&self, receipt_id: ReceiptId) -> ReceiptLockGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&receipt_id) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(receipt_id);
        ReceiptLockGuard {
            locks: self,
            receipt_id,
        }
    }

    pub fn is_locked(&self, receipt_id: ReceiptId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&receipt_id)
    }
}

/// Held lock on one receipt.
#[derive(Debug)]
pub struct ReceiptLockGuard<'a> {
    locks: &'a ReceiptLocks,
    receipt_id: ReceiptId,
}

impl ReceiptLockGuard<'_> {
    pub fn receipt_id(&self) -> ReceiptId {
        self.receipt_id
    }
}

impl Drop for ReceiptLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.receipt_id);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn guard_releases_on_drop() {
        let locks = ReceiptLocks::new();
        let receipt = ReceiptId::new();
        {
            let guard = locks.lock(receipt);
            assert_eq!(guard.receipt_id(), receipt);
            assert!(locks.is_locked(receipt));
        }
        assert!(!locks.is_locked(receipt));
    }

    #[test]
    fn different_receipts_do_not_block() {
        let locks = ReceiptLocks::new();
        let _a = locks.lock(ReceiptId::new());
        let _b = locks.lock(ReceiptId::new());
    }

    #[test]
    fn same_receipt_is_serialized() {
        let locks = Arc::new(ReceiptLocks::new());
        let receipt = ReceiptId::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.lock(receipt);
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
