//! Constant/value dependencies: pure, memoized values computed from the
//! container itself. No boot or destroy lifecycle applies.

use crate::container::Container;

/// Key type for a memoized container-derived value.
///
/// The value is computed once, on first access through
/// [`Container::constant`], from the container alone; components are not in
/// scope. [`Container::set_constant`] overwrites the cache directly.
///
/// # Example
/// ```
/// use bootwire::{ConstantKey, Container};
///
/// enum PoolSize {}
///
/// impl ConstantKey for PoolSize {
///     type Value = usize;
///
///     fn create(env: &Container) -> usize {
///         if env.debug() { 1 } else { 8 }
///     }
/// }
///
/// let env = Container::new();
/// assert_eq!(env.constant::<PoolSize>(), env.constant::<PoolSize>());
/// ```
pub trait ConstantKey: 'static {
    type Value: Clone + 'static;

    /// Compute the value. Must be pure: same container, same value.
    fn create(env: &Container) -> Self::Value;
}

/// Convenience for constant keys whose value does not depend on the
/// container at all.
pub trait StaticConstant: 'static {
    type Value: Clone + 'static;

    fn value() -> Self::Value;
}

impl<K: StaticConstant> ConstantKey for K {
    type Value = K::Value;

    fn create(_env: &Container) -> Self::Value {
        K::value()
    }
}

/// Built-in key: true in debug builds. Exposed as [`Container::debug`].
pub enum DebugMode {}

impl StaticConstant for DebugMode {
    type Value = bool;

    fn value() -> bool {
        cfg!(debug_assertions)
    }
}
