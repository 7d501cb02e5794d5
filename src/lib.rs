//! # Bootwire
//!
//! A lazy, lifecycle-aware dependency injection container for Rust.
//!
//! Bootwire holds a registry of mutually-referencing components and wires
//! them on demand: each component boots at most once, only after its own
//! dependencies are ready, and is destroyed in the exact reverse of boot
//! order when the container goes away — even when components reference each
//! other in cycles.
//!
//! ## Features
//!
//! - **Lazy lifecycle**: components are wired and booted on first resolve,
//!   and a single top-level resolve boots an entire connected subgraph
//! - **Deterministic teardown**: destroy hooks run in exact reverse boot
//!   order, with per-component failure isolation
//! - **Cycle breaking**: reference-only dependency slots resolve without
//!   booting, so mutual references never recurse infinitely
//! - **Trait Object Support**: bind `dyn Trait` contracts to concrete
//!   components and resolve through either key
//! - **Constant cache**: memoized, lifecycle-free values computed from the
//!   container itself
//!
//! ## Quick Start
//!
//! ```rust
//! use bootwire::{Component, Container, Dep};
//!
//! #[derive(Default)]
//! struct Database {
//!     url: String,
//! }
//!
//! impl Component for Database {
//!     type Interface = Self;
//!
//!     fn boot(&mut self) -> anyhow::Result<()> {
//!         self.url = "postgres://localhost".into();
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct UserService {
//!     db: Dep<Database>,
//! }
//!
//! impl Component for UserService {
//!     type Interface = Self;
//!
//!     fn wire(&mut self, env: &mut Container) -> bootwire::Result<()> {
//!         env.inject(&mut self.db)
//!     }
//! }
//!
//! let mut env = Container::new();
//! env.register_type::<Database>();
//! env.register_type::<UserService>();
//!
//! // Booting UserService boots Database first.
//! let users = env.resolve::<UserService>()?;
//! assert!(users.borrow().db.with(|db| db.url.starts_with("postgres")));
//!
//! // Dropping the container destroys UserService, then Database.
//! drop(env);
//! # Ok::<(), bootwire::BootwireError>(())
//! ```
//!
//! The container is single-owner and single-threaded: resolution is a plain
//! re-entrant call chain with no locking and no background work.

mod builder;
mod component;
mod constant;
mod container;
mod registry;
mod teardown;

pub mod error;

pub use builder::ContainerBuilder;
pub use component::{Component, Dep, Shared};
pub use constant::{ConstantKey, DebugMode, StaticConstant};
pub use container::Container;
pub use error::{BootwireError, Result};
pub use teardown::DestroyError;

/// Prelude module for convenient imports
///
/// ```
/// use bootwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::builder::ContainerBuilder;
    pub use crate::component::{Component, Dep, Shared};
    pub use crate::constant::{ConstantKey, DebugMode, StaticConstant};
    pub use crate::container::Container;
    pub use crate::error::{BootwireError, Result};
    pub use crate::teardown::DestroyError;
}
