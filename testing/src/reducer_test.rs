//! Given/When/Then harness for a single reducer step.
//!
//! The state under test is built either directly with `given_state` or by
//! replaying earlier actions with `given_actions`, whose effects are
//! discarded. Only the effects of the `when_action` step are checked.

#![allow(clippy::module_name_repetitions)]

use keystore_core::{effect::Effect, reducer::Reducer};
use std::fmt::Debug;

type StateCheck<S> = Box<dyn FnOnce(&S, &S)>;

type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// One reducer step under test
///
/// ```ignore
/// ReducerTest::new(CartReducer::<()>::new())
///     .with_env(())
///     .given_actions([CartAction::AddItem { product: home.clone() }])
///     .when_action(CartAction::AddItem { product: home })
///     .then_state(|cart| assert_eq!(cart.item_count(), 2))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
    history: Vec<R::Action>,
    action: Option<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::State: Clone + Default,
{
    /// Starts a test of `reducer` from the default state
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
            history: Vec::new(),
            action: None,
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment passed to every reduce call
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state, instead of the default
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Actions replayed onto the starting state before the step under test
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = R::Action>) -> Self {
        self.history.extend(actions);
        self
    }

    /// The step under test
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Checks the state after the step
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(move |_, after| check(after)));
        self
    }

    /// Checks the effects returned by the step
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Runs the step and every check
    ///
    /// # Panics
    ///
    /// Panics if the environment or the action is missing, or a check fails.
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        let env = self.environment.expect("Environment must be set with with_env()");
        let action = self.action.expect("Action must be set with when_action()");

        let mut state = self.state.unwrap_or_default();
        for earlier in self.history {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }

        let before = state.clone();
        let effects = self.reducer.reduce(&mut state, action, &env);

        for check in self.state_checks {
            check(&before, &state);
        }
        for check in self.effect_checks {
            check(&effects);
        }
    }
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::State: Clone + Default + PartialEq + Debug + 'static,
{
    /// Checks that the step left the state exactly as it was
    #[must_use]
    pub fn then_state_unchanged(mut self) -> Self {
        self.state_checks.push(Box::new(|before, after| {
            assert_eq!(after, before, "expected the state to be unchanged");
        }));
        self
    }
}

/// Helper assertions for effects
pub mod assertions {
    use keystore_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }

    /// Assert that effects contain a Cancellable effect registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if no such effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellable_effect<A>(effects: &[Effect<A>], id: &str) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: found, .. } if found.as_str() == id)),
            "Expected a Cancellable effect with id {id:?}, but none found"
        );
    }

    /// Assert that effects cancel the effects registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if no matching Cancel effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: &str) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancel(found) if found.as_str() == id)),
            "Expected Effect::Cancel({id:?}), but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystore_core::effect::{Effect, EffectId};
    use keystore_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tally {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TallyAction {
        Increment,
        Stop,
        Ignore,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TallyAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TallyAction::Stop => smallvec![Effect::Cancel(EffectId::new("tally"))],
                TallyAction::Ignore => SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_replays_history_before_the_step() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_actions([TallyAction::Increment, TallyAction::Increment])
            .when_action(TallyAction::Increment)
            .then_state(|tally| assert_eq!(tally.count, 3))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_only_checks_effects_of_the_step() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally { count: 5 })
            .given_actions([TallyAction::Increment])
            .when_action(TallyAction::Stop)
            .then_state_unchanged()
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_cancels(effects, "tally");
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "expected the state to be unchanged")]
    fn test_unchanged_check_catches_a_change() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .when_action(TallyAction::Increment)
            .then_state_unchanged()
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .when_action(TallyAction::Ignore)
            .then_effects(assertions::assert_no_effects)
            .run();
        assertions::assert_no_effects::<TallyAction>(&[Effect::None]);
    }
}
