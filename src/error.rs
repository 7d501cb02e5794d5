use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootwireError>;

#[derive(Debug, Error)]
pub enum BootwireError {
    /// The interface key was never registered. Resolution fails without
    /// mutating any container state.
    #[error("dependency not found: {key}")]
    DependencyNotFound { key: String },

    /// The component stored under the interface key is not the requested
    /// concrete type.
    #[error("component registered for `{key}` is `{found}`, not `{expected}`")]
    DowncastFailed {
        key: String,
        expected: String,
        found: String,
    },

    /// A component's boot hook failed. The component stays off the teardown
    /// list; a later resolve re-attempts its wiring and boot from scratch.
    #[error("boot hook failed for `{key}`")]
    BootFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}
