/// Helper macro for locking items; a poisoned lock becomes [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let _guard = lock!(my_mutex)?;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)
    };
}
