use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Write-once guard embedded in objects that become immutable after commit.
///
/// A fresh `Sealable` is unsealed. After [`Sealable::seal`] every call to
/// [`Sealable::ensure_unsealed`] panics. Cloning always yields an unsealed
/// guard, so a copy of a sealed object can be edited again.
#[derive(Default)]
pub struct Sealable {
    sealed: AtomicBool,
}

impl Sealable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the owner immutable. Sealing twice is allowed.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Panics when the owner has already been sealed.
    #[track_caller]
    pub fn ensure_unsealed(&self, operation: &str) {
        if self.is_sealed() {
            panic!("attempt to {operation} on a sealed object");
        }
    }
}

impl Clone for Sealable {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sealable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sealable")
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Sealable;

    #[test]
    fn seal_is_idempotent() {
        let sealable = Sealable::new();
        assert!(!sealable.is_sealed());
        sealable.seal();
        sealable.seal();
        assert!(sealable.is_sealed());
    }

    #[test]
    #[should_panic(expected = "sealed object")]
    fn ensure_unsealed_panics_after_seal() {
        let sealable = Sealable::new();
        sealable.seal();
        sealable.ensure_unsealed("mutate");
    }

    #[test]
    fn clone_of_sealed_is_unsealed() {
        let sealable = Sealable::new();
        sealable.seal();
        let copy = sealable.clone();
        assert!(!copy.is_sealed());
        copy.ensure_unsealed("mutate");
    }
}
