use crate::container::Container;
use crate::error::Result;
use std::any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a container-owned component instance.
pub type Shared<T> = Rc<RefCell<T>>;

/// Trait for units managed by the DI container.
///
/// A component declares the contract it is registered under via the
/// `Interface` associated type (usually `Self`, or a `dyn Trait` contract
/// shared by several implementations), lists its dependency slots in
/// [`Component::wire`], and opts into the boot/destroy lifecycle by
/// overriding the hook defaults.
///
/// # Example
/// ```
/// use bootwire::{Component, Container, Dep};
///
/// #[derive(Default)]
/// struct Database;
///
/// impl Component for Database {
///     type Interface = Self;
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
/// ```
pub trait Component: 'static {
    /// The public contract this component is registered under. The interface
    /// key is derived from this type, never from the concrete type.
    type Interface: ?Sized + 'static;

    /// Fill this component's dependency slots.
    ///
    /// Call [`Container::inject`] exactly once per declared [`Dep`] field.
    /// Each call re-enters `resolve`, so wiring a component can boot an
    /// entire connected subgraph before this method returns.
    ///
    /// # Errors
    /// Propagates the failure of any nested resolve.
    fn wire(&mut self, _env: &mut Container) -> Result<()> {
        Ok(())
    }

    /// One-time initialization, run after [`Component::wire`] completes.
    ///
    /// # Errors
    /// A failed boot unwinds the whole resolve chain and keeps the
    /// component off the teardown list.
    fn boot(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Teardown hook, run once in reverse boot order at container disposal.
    ///
    /// # Errors
    /// Reported through the container's destroy-failure hook; never aborts
    /// the remaining teardown sequence.
    fn destroy(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Object-safe view of a component's lifecycle, used by the registry to
/// store heterogeneous components behind one handle type.
pub(crate) trait Lifecycle {
    fn wire(&mut self, env: &mut Container) -> Result<()>;
    fn boot(&mut self) -> anyhow::Result<()>;
    fn destroy(&mut self) -> anyhow::Result<()>;
}

impl<C: Component> Lifecycle for C {
    fn wire(&mut self, env: &mut Container) -> Result<()> {
        Component::wire(self, env)
    }

    fn boot(&mut self) -> anyhow::Result<()> {
        Component::boot(self)
    }

    fn destroy(&mut self) -> anyhow::Result<()> {
        Component::destroy(self)
    }
}

/// A dependency slot, filled by the container during the owning component's
/// wiring pass.
///
/// `Dep` is a non-owning handle: the registry keeps the only strong
/// references, so reference cycles between components never outlive the
/// container. Reading a slot that was never wired is a programming error and
/// panics with the dependency's type name rather than handing out a default.
///
/// A slot created with [`Dep::ref_only`] is resolved without construction
/// side effects, state transitions, or booting; use it on one side of a
/// dependency cycle. A dependency obtained through a cycle may be held
/// freely, but must not be borrowed until the peer's own boot has completed.
pub struct Dep<C> {
    ref_only: bool,
    slot: Option<Weak<RefCell<C>>>,
}

impl<C: Component> Dep<C> {
    /// An empty slot resolved with full boot semantics.
    pub fn new() -> Self {
        Self {
            ref_only: false,
            slot: None,
        }
    }

    /// An empty slot resolved reference-only, without triggering injection
    /// or boot of the target.
    pub fn ref_only() -> Self {
        Self {
            ref_only: true,
            slot: None,
        }
    }

    /// Whether this slot has been wired and its target is still alive.
    pub fn is_wired(&self) -> bool {
        matches!(&self.slot, Some(weak) if weak.strong_count() > 0)
    }

    /// The wired instance.
    ///
    /// # Panics
    /// Panics if the slot was never wired, or if the owning container has
    /// already been dropped.
    pub fn get(&self) -> Shared<C> {
        let slot = self.slot.as_ref().unwrap_or_else(|| {
            panic!(
                "dependency `{}` accessed before it was wired",
                any::type_name::<C>()
            )
        });
        slot.upgrade().unwrap_or_else(|| {
            panic!(
                "dependency `{}` outlived its container",
                any::type_name::<C>()
            )
        })
    }

    /// Run `f` against a shared borrow of the wired instance.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        let shared = self.get();
        let guard = shared.borrow();
        f(&guard)
    }

    /// Run `f` against an exclusive borrow of the wired instance.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let shared = self.get();
        let mut guard = shared.borrow_mut();
        f(&mut guard)
    }

    pub(crate) fn is_ref_only(&self) -> bool {
        self.ref_only
    }

    pub(crate) fn fill(&mut self, handle: Weak<RefCell<C>>) {
        self.slot = Some(handle);
    }
}

impl<C: Component> Default for Dep<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Dep<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("ref_only", &self.ref_only)
            .field("wired", &self.slot.is_some())
            .finish()
    }
}
