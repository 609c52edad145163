//! Lock access for in-process tables that keeps serving after a panicking writer.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Take the guard out of `result`, logging when the lock was poisoned.
pub(crate) fn recover<G>(result: LockResult<G>, table: &'static str, op: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target = "seo_svc::util::lock",
            table,
            op,
            "lock poisoned by an earlier panic; continuing with current contents"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn read<'a, T>(
    lock: &'a RwLock<T>,
    table: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), table, op)
}

pub(crate) fn write<'a, T>(
    lock: &'a RwLock<T>,
    table: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), table, op)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn writes_survive_a_poisoned_table() {
        let lock = Arc::new(RwLock::new(vec!["home".to_string()]));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.write().expect("lock");
            panic!("writer panicked");
        })
        .join();

        assert!(lock.is_poisoned());
        write(&lock, "pages", "create_page").push("about".to_string());
        assert_eq!(read(&lock, "pages", "list_pages").len(), 2);
    }
}
