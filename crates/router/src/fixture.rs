use parking_lot::RwLock;
use std::sync::Arc;

/// Mutable context shared between a test fixture and its generators.
///
/// Clone it into each generator closure that needs it. The lock serializes
/// mutations when simulated commands run concurrently; the dispatcher itself
/// never touches this state.
#[derive(Debug, Default)]
pub struct FixtureState<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for FixtureState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> FixtureState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Run `f` with shared access to the state.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the state.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn set(&self, value: T) {
        *self.inner.write() = value;
    }
}

impl<T: Clone> FixtureState<T> {
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let branch = FixtureState::new("main".to_string());
        let seen_by_generator = branch.clone();

        branch.set("feature".to_string());
        assert_eq!(seen_by_generator.get(), "feature");

        seen_by_generator.update(|b| b.push_str("-2"));
        assert_eq!(branch.read(|b| b.len()), "feature-2".len());
    }
}
