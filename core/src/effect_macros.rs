//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use keystore_core::async_effect;
///
/// async_effect! {
///     let receipt = gateway.charge(request).await;
///     Some(CheckoutAction::from(receipt))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use keystore_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(1),
///     action: ReviewAction::ReviewPublished { review }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Wrap an effect so it can be aborted later with `Effect::Cancel`
///
/// # Example
///
/// ```rust,ignore
/// use keystore_core::{async_effect, cancellable};
///
/// cancellable! {
///     id: "checkout-payment",
///     effect: async_effect! { Some(CheckoutAction::PaymentFailed { reason }) }
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $crate::effect::EffectId::new($id),
            effect: ::std::boxed::Box::new($effect),
        }
    };
}
