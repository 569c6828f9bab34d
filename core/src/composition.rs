//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope`**: Embed a feature reducer in a larger application state and
//!   action type
//!
//! # Example
//!
//! ```
//! use keystore_core::composition::{combine_reducers, scope};
//! use keystore_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! #[derive(Clone)]
//! enum CounterAction {
//!     Add(i32),
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Counter, action: CounterAction, _env: &()) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         let CounterAction::Add(n) = action;
//!         state.value += n;
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Clone, Default)]
//! struct App {
//!     left: Counter,
//!     right: Counter,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Left(CounterAction),
//!     Right(CounterAction),
//! }
//!
//! let app = combine_reducers(vec![
//!     Box::new(scope(
//!         CounterReducer,
//!         |s: &mut App| &mut s.left,
//!         |a| match a { AppAction::Left(a) => Some(a), AppAction::Right(_) => None },
//!         AppAction::Left,
//!     )),
//!     Box::new(scope(
//!         CounterReducer,
//!         |s: &mut App| &mut s.right,
//!         |a| match a { AppAction::Right(a) => Some(a), AppAction::Left(_) => None },
//!         AppAction::Right,
//!     )),
//! ]);
//!
//! let mut state = App::default();
//! let _ = app.reduce(&mut state, AppAction::Right(CounterAction::Add(2)), &());
//! assert_eq!(state.left.value, 0);
//! assert_eq!(state.right.value, 2);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// A boxed reducer that can be shared across threads
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
/// Later reducers observe the state changes made by earlier ones for the same action.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer {
        reducers: reducers.into(),
    }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`]. Cloning is cheap: the reducers are shared.
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: 'static,
    E: 'static,
{
    reducers: Arc<[BoxedReducer<S, A, E>]>,
}

impl<S: 'static, A: 'static, E: 'static> Clone for CombinedReducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reducers: Arc::clone(&self.reducers),
        }
    }
}

impl<S: 'static, A: 'static, E: 'static> std::fmt::Debug for CombinedReducer<S, A, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in self.reducers.iter() {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|e| !e.is_none()));
        }

        all_effects
    }
}

/// Embeds a child reducer into a parent state and action type.
///
/// - `state` focuses the parent state on the child's slice
/// - `extract` picks the child's action out of a parent action (or `None`
///   when the action belongs to another feature)
/// - `embed` wraps actions produced by the child's effects back into the
///   parent action type
pub fn scope<S, A, E, LS, LA, R>(
    reducer: R,
    state: fn(&mut S) -> &mut LS,
    extract: fn(A) -> Option<LA>,
    embed: fn(LA) -> A,
) -> ScopedReducer<S, A, E, LS, LA, R>
where
    R: Reducer<State = LS, Action = LA, Environment = E>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        _phantom: std::marker::PhantomData,
    }
}

/// A reducer focused on one feature of a larger state.
///
/// Created by [`scope`].
pub struct ScopedReducer<S, A, E, LS, LA, R> {
    reducer: R,
    state: fn(&mut S) -> &mut LS,
    extract: fn(A) -> Option<LA>,
    embed: fn(LA) -> A,
    _phantom: std::marker::PhantomData<fn() -> E>,
}

impl<S, A, E, LS, LA, R> Reducer for ScopedReducer<S, A, E, LS, LA, R>
where
    R: Reducer<State = LS, Action = LA, Environment = E>,
    A: 'static,
    LA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(local) = (self.extract)(action) else {
            return SmallVec::new();
        };

        self.reducer
            .reduce((self.state)(state), local, env)
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
