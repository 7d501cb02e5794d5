use crate::component::{Component, Shared};
use crate::constant::ConstantKey;
use crate::container::Container;
use crate::teardown::DestroyError;

/// Builder for configuring a container before first resolve.
///
/// Pure convenience over [`Container`]'s own surface, in fluent form.
///
/// # Example
/// ```
/// use bootwire::{Component, ContainerBuilder};
///
/// #[derive(Default)]
/// struct Cache;
///
/// impl Component for Cache {
///     type Interface = Self;
/// }
///
/// let mut env = ContainerBuilder::new()
///     .register_type::<Cache>()
///     .build();
///
/// assert!(env.resolve::<Cache>().is_ok());
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register a component instance.
    pub fn register<C: Component>(mut self, component: C) -> Self {
        self.container.register(component);
        self
    }

    /// Register a component by type, default-constructing the instance.
    pub fn register_type<C: Component + Default>(mut self) -> Self {
        self.container.register_type::<C>();
        self
    }

    /// Bind a trait contract to a registered component.
    pub fn bind<I, C, F>(mut self, caster: F) -> Self
    where
        I: ?Sized + 'static,
        C: Component,
        F: Fn(Shared<C>) -> Shared<I> + 'static,
    {
        self.container.bind::<I, C, F>(caster);
        self
    }

    /// Seed a constant, bypassing its compute function.
    pub fn constant<K: ConstantKey>(self, value: K::Value) -> Self {
        self.container.set_constant::<K>(value);
        self
    }

    /// Set the hook invoked once per failed destroy during teardown.
    pub fn on_destroy_failure<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&DestroyError) + 'static,
    {
        self.container.on_destroy_failure(hook);
        self
    }

    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
