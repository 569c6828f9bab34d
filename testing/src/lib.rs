//! # KeyStore Testing
//!
//! Testing utilities and helpers for the KeyStore reducer architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//! - A resolver that turns effect descriptions into the actions they produce
//!
//! ## Example
//!
//! ```ignore
//! use keystore_testing::ReducerTest;
//!
//! ReducerTest::new(CartReducer::<()>::new())
//!     .with_env(())
//!     .when_action(CartAction::RemoveItem { id: ProductId::new(9) })
//!     .then_state_unchanged()
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use keystore_core::environment::Clock;

/// Ergonomic reducer testing
pub mod reducer_test;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time until [`FixedClock::advance`] moves it.
    ///
    /// # Example
    ///
    /// ```
    /// use keystore_testing::mocks::FixedClock;
    /// use keystore_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        ///
        /// # Panics
        ///
        /// Panics if another test thread panicked while holding the clock.
        #[allow(clippy::unwrap_used)]
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }
    }

    impl Clone for FixedClock {
        fn clone(&self) -> Self {
            Self::new(self.now())
        }
    }

    impl Clock for FixedClock {
        #[allow(clippy::unwrap_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice: the timestamp is hardcoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Effect resolution helpers
pub mod helpers {
    use keystore_core::effect::Effect;

    /// Run effect descriptions to completion and collect the actions they
    /// would feed back, in order
    ///
    /// Delays resolve immediately. `Cancel` effects produce nothing.
    /// Actions fed back are not reduced again.
    pub async fn resolve_effects<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A> {
        let mut pending: Vec<Effect<A>> = effects.into_iter().collect();
        pending.reverse();

        let mut actions = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::None | Effect::Cancel(_) => {},
                Effect::Delay { action, .. } => actions.push(*action),
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        actions.push(action);
                    }
                },
                Effect::Cancellable { effect, .. } => pending.push(*effect),
                Effect::Parallel(children) | Effect::Sequential(children) => {
                    pending.extend(children.into_iter().rev());
                },
            }
        }
        actions
    }
}

// Re-export commonly used items
pub use helpers::resolve_effects;
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};
