//! The container: registration, resolution, and the boot state machine.

use crate::component::{Component, Dep, Lifecycle, Shared};
use crate::constant::{ConstantKey, DebugMode};
use crate::error::{BootwireError, Result};
use crate::registry::{BootState, Registry, RegistryEntry};
use crate::teardown::{self, DestroyError, DestroyFailureHook};
use std::any::{self, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type CasterFn = Box<dyn Fn(Rc<dyn Any>) -> Option<Rc<dyn Any>>>;

/// A trait-object contract registered with [`Container::bind`]: the
/// interface key of the backing component plus an unsizing caster.
struct Binding {
    target: &'static str,
    concrete: &'static str,
    caster: CasterFn,
}

/// Lazily wires, boots, and tears down a graph of registered components.
///
/// The container is single-owner and single-threaded: `resolve` is a plain
/// re-entrant call chain, and all bookkeeping is mutated exclusively through
/// `register`, `resolve`, and disposal. Each interface key maps to exactly
/// one instance for the container's lifetime; a component boots at most
/// once, only after its dependency slots are wired, and is destroyed in
/// exact reverse boot order when the container is disposed or dropped.
///
/// # Example
/// ```
/// use bootwire::{Component, Container, Dep};
///
/// #[derive(Default)]
/// struct Database {
///     url: String,
/// }
///
/// impl Component for Database {
///     type Interface = Self;
///
///     fn boot(&mut self) -> anyhow::Result<()> {
///         self.url = "postgres://localhost".into();
///         Ok(())
///     }
/// }
///
/// #[derive(Default)]
/// struct UserService {
///     db: Dep<Database>,
/// }
///
/// impl Component for UserService {
///     type Interface = Self;
///
///     fn wire(&mut self, env: &mut Container) -> bootwire::Result<()> {
///         env.inject(&mut self.db)
///     }
/// }
///
/// let mut env = Container::new();
/// env.register_type::<Database>();
/// env.register_type::<UserService>();
///
/// let users = env.resolve::<UserService>()?;
/// assert!(users.borrow().db.with(|db| db.url.starts_with("postgres")));
/// # Ok::<(), bootwire::BootwireError>(())
/// ```
pub struct Container {
    pub(crate) registry: Registry,
    bindings: HashMap<&'static str, Rc<Binding>>,
    constants: RefCell<HashMap<&'static str, Rc<dyn Any>>>,
    resolving: Vec<&'static str>,
    pub(crate) on_destroy_failure: DestroyFailureHook,
}

pub(crate) fn interface_key<C: Component>() -> &'static str {
    any::type_name::<C::Interface>()
}

impl Container {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            bindings: HashMap::new(),
            constants: RefCell::new(HashMap::new()),
            resolving: Vec::new(),
            on_destroy_failure: teardown::log_destroy_failure(),
        }
    }

    /// Register a component instance under its declared interface key.
    ///
    /// The instance is constructed by the caller; its dependency slots are
    /// wired lazily, on first non-reference-only resolve.
    ///
    /// # Panics
    /// Registering a second component under an already-taken interface key
    /// is a configuration error and panics immediately.
    pub fn register<C: Component>(&mut self, component: C) {
        let key = interface_key::<C>();
        let cell = Rc::new(RefCell::new(component));
        let entry = RegistryEntry {
            instance: cell.clone() as Rc<dyn Any>,
            lifecycle: cell,
            concrete: any::type_name::<C>(),
        };
        self.registry.insert(key, entry);
        tracing::debug!(key, "registered component");
    }

    /// Register a component by type, default-constructing the instance.
    /// All of its inputs arrive later through injection.
    pub fn register_type<C: Component + Default>(&mut self) {
        self.register(C::default());
    }

    /// Bind an additional contract key `I` (typically a `dyn Trait`) to a
    /// registered component, with `caster` performing the unsizing.
    ///
    /// # Example
    /// ```
    /// # use bootwire::{Component, Container, Shared};
    /// trait Clock {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// #[derive(Default)]
    /// struct FixedClock;
    ///
    /// impl Component for FixedClock {
    ///     type Interface = Self;
    /// }
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 {
    ///         42
    ///     }
    /// }
    ///
    /// let mut env = Container::new();
    /// env.register_type::<FixedClock>();
    /// env.bind::<dyn Clock, FixedClock, _>(|c| c as Shared<dyn Clock>);
    ///
    /// let clock = env.resolve_trait::<dyn Clock>()?;
    /// assert_eq!(clock.borrow().now(), 42);
    /// # Ok::<(), bootwire::BootwireError>(())
    /// ```
    pub fn bind<I, C, F>(&mut self, caster: F)
    where
        I: ?Sized + 'static,
        C: Component,
        F: Fn(Shared<C>) -> Shared<I> + 'static,
    {
        let erased: CasterFn = Box::new(move |instance: Rc<dyn Any>| {
            let cell = instance.downcast::<RefCell<C>>().ok()?;
            Some(Rc::new(caster(cell)) as Rc<dyn Any>)
        });
        self.bindings.insert(
            any::type_name::<I>(),
            Rc::new(Binding {
                target: interface_key::<C>(),
                concrete: any::type_name::<C>(),
                caster: erased,
            }),
        );
    }

    /// Resolve a component, wiring and booting it (and, transitively, its
    /// whole dependency subgraph) if it has not booted yet.
    ///
    /// # Errors
    /// [`BootwireError::DependencyNotFound`] if the interface key was never
    /// registered (no state is mutated), [`BootwireError::DowncastFailed`]
    /// if the registered component is not a `C`, and
    /// [`BootwireError::BootFailed`] if the component's own boot hook fails.
    pub fn resolve<C: Component>(&mut self) -> Result<Shared<C>> {
        self.resolve_entry::<C>(false)
    }

    /// Resolve a component without triggering wiring, boot, or any state
    /// transition. Safe to call from inside another component's wiring pass
    /// to break a cycle; the returned instance may not have booted yet.
    pub fn resolve_ref_only<C: Component>(&mut self) -> Result<Shared<C>> {
        self.resolve_entry::<C>(true)
    }

    /// Resolve a contract previously registered with [`Container::bind`],
    /// booting the backing component if needed.
    pub fn resolve_trait<I: ?Sized + 'static>(&mut self) -> Result<Shared<I>> {
        let key = any::type_name::<I>();
        let binding = self
            .bindings
            .get(key)
            .cloned()
            .ok_or_else(|| BootwireError::DependencyNotFound { key: key.to_owned() })?;
        let entry = self.registry.lookup(binding.target).ok_or_else(|| {
            BootwireError::DependencyNotFound {
                key: binding.target.to_owned(),
            }
        })?;
        self.boot_if_needed(binding.target, &entry)?;

        let cast = (binding.caster)(entry.instance.clone()).ok_or_else(|| {
            BootwireError::DowncastFailed {
                key: key.to_owned(),
                expected: binding.concrete.to_owned(),
                found: entry.concrete.to_owned(),
            }
        })?;
        let shared = cast
            .downcast::<Shared<I>>()
            .expect("caster produced a foreign handle type; this is a bug in bootwire");
        Ok((*shared).clone())
    }

    /// Fill one dependency slot: resolve the slot's target (honoring its
    /// ref-only flag) and store the non-owning handle. Called once per
    /// declared slot from a component's [`Component::wire`] pass.
    pub fn inject<C: Component>(&mut self, dep: &mut Dep<C>) -> Result<()> {
        let shared = self.resolve_entry::<C>(dep.is_ref_only())?;
        dep.fill(Rc::downgrade(&shared));
        Ok(())
    }

    fn resolve_entry<C: Component>(&mut self, ref_only: bool) -> Result<Shared<C>> {
        let key = interface_key::<C>();
        let entry = self
            .registry
            .lookup(key)
            .ok_or_else(|| BootwireError::DependencyNotFound { key: key.to_owned() })?;
        let shared = entry.instance.clone().downcast::<RefCell<C>>().map_err(|_| {
            BootwireError::DowncastFailed {
                key: key.to_owned(),
                expected: any::type_name::<C>().to_owned(),
                found: entry.concrete.to_owned(),
            }
        })?;
        if !ref_only {
            self.boot_if_needed(key, &entry)?;
        }
        Ok(shared)
    }

    /// The boot state machine. Invariants: a component's wiring pass runs at
    /// most once per resolution chain, its boot hook at most once per
    /// container lifetime, and it joins the boot-order list only after its
    /// boot hook returns `Ok`.
    fn boot_if_needed(&mut self, key: &'static str, entry: &RegistryEntry) -> Result<()> {
        match self.registry.state(key) {
            Some(BootState::Booted) => return Ok(()),
            Some(BootState::Booting) if self.resolving.contains(&key) => {
                // Re-entered while this key's own wiring is still on the
                // stack: a genuine cycle. Hand back the in-progress instance
                // without wiring or booting it again.
                let mut chain = self.resolving.clone();
                chain.push(key);
                tracing::warn!(
                    key,
                    chain = %chain.join(" -> "),
                    "circular dependency detected; mark one side of the cycle ref-only"
                );
                return Ok(());
            }
            // `Booting` with no frame on the stack means an earlier boot
            // attempt failed; wire and boot again from scratch.
            Some(BootState::Booting) | None => {}
        }

        self.registry.begin_boot(key);
        self.resolving.push(key);
        tracing::debug!(key, "wiring component");
        let wired = entry.lifecycle.borrow_mut().wire(self);
        let booted = wired.and_then(|()| {
            tracing::debug!(key, "booting component");
            entry
                .lifecycle
                .borrow_mut()
                .boot()
                .map_err(|source| BootwireError::BootFailed {
                    key: key.to_owned(),
                    source,
                })
        });
        self.resolving.pop();
        booted?;
        self.registry.mark_booted(key, entry.lifecycle.clone());
        Ok(())
    }

    /// Memoized constant for `K`: computed on first access, cached for the
    /// container's lifetime. Constants have no lifecycle and never appear on
    /// the teardown list.
    pub fn constant<K: ConstantKey>(&self) -> K::Value {
        let key = any::type_name::<K>();
        if let Some(cached) = self.constants.borrow().get(key) {
            return cached
                .downcast_ref::<K::Value>()
                .expect("constant cache holds a mismatched value; this is a bug in bootwire")
                .clone();
        }
        let value = K::create(self);
        self.constants
            .borrow_mut()
            .insert(key, Rc::new(value.clone()));
        value
    }

    /// Overwrite the cached constant for `K`, bypassing its compute
    /// function.
    pub fn set_constant<K: ConstantKey>(&self, value: K::Value) {
        self.constants
            .borrow_mut()
            .insert(any::type_name::<K>(), Rc::new(value));
    }

    /// Whether the crate was built with debug assertions.
    pub fn debug(&self) -> bool {
        self.constant::<DebugMode>()
    }

    /// Replace the hook invoked once per failed destroy during teardown.
    /// The default hook logs the failure and moves on.
    pub fn on_destroy_failure<F>(&mut self, hook: F)
    where
        F: FnMut(&DestroyError) + 'static,
    {
        self.on_destroy_failure = Box::new(hook);
    }

    /// Whether a component is registered under `C`'s interface key.
    pub fn contains<C: Component>(&self) -> bool {
        self.registry.contains(interface_key::<C>())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default, Debug)]
    struct TestService {
        value: i32,
    }

    impl Component for TestService {
        type Interface = Self;

        fn boot(&mut self) -> anyhow::Result<()> {
            self.value = 42;
            Ok(())
        }
    }

    trait Greeter: std::fmt::Debug {
        fn greet(&self) -> String;
    }

    #[derive(Default, Debug)]
    struct EnglishGreeter {
        greeting: String,
    }

    impl Component for EnglishGreeter {
        type Interface = Self;

        fn boot(&mut self) -> anyhow::Result<()> {
            self.greeting = "hello".to_owned();
            Ok(())
        }
    }

    impl Greeter for EnglishGreeter {
        fn greet(&self) -> String {
            self.greeting.clone()
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut env = Container::new();
        env.register_type::<TestService>();
        assert!(env.contains::<TestService>());

        let service = env.resolve::<TestService>().unwrap();
        assert_eq!(service.borrow().value, 42);
    }

    #[test]
    fn register_and_resolve_trait() {
        let mut env = Container::new();
        env.register_type::<EnglishGreeter>();
        env.bind::<dyn Greeter, EnglishGreeter, _>(|c| c as Shared<dyn Greeter>);

        let greeter = env.resolve_trait::<dyn Greeter>().unwrap();
        assert_eq!(greeter.borrow().greet(), "hello");
    }

    #[test]
    fn resolve_trait_without_binding_fails() {
        let mut env = Container::new();
        env.register_type::<EnglishGreeter>();

        let err = env.resolve_trait::<dyn Greeter>().unwrap_err();
        assert!(matches!(err, BootwireError::DependencyNotFound { .. }));
    }

    #[test]
    fn mismatched_component_fails_with_typed_error() {
        // Claims TestService's interface without being one.
        #[derive(Default)]
        struct Impostor;

        impl Component for Impostor {
            type Interface = TestService;
        }

        let mut env = Container::new();
        env.register_type::<Impostor>();

        let err = env.resolve::<TestService>().unwrap_err();
        assert!(matches!(err, BootwireError::DowncastFailed { .. }));
    }

    #[test]
    fn constants_are_computed_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        enum Answer {}

        impl ConstantKey for Answer {
            type Value = u32;

            fn create(_env: &Container) -> u32 {
                CALLS.fetch_add(1, Ordering::SeqCst);
                41
            }
        }

        let env = Container::new();
        assert_eq!(env.constant::<Answer>(), 41);
        assert_eq!(env.constant::<Answer>(), 41);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);

        env.set_constant::<Answer>(7);
        assert_eq!(env.constant::<Answer>(), 7);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_constant_matches_build_profile() {
        let env = Container::new();
        assert_eq!(env.debug(), cfg!(debug_assertions));
    }
}
