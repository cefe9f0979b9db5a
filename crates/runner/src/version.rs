/// Version from `git describe`, or the crate version outside a checkout.
pub const GIT_VERSION: &str = env!("FROG_GIT_VERSION");

pub const GIT_HASH: &str = env!("FROG_GIT_HASH");

/// Shown by `frog --version`.
pub const VERSION: &str =
    concat!(env!("FROG_GIT_VERSION"), " (", env!("FROG_GIT_HASH"), ")");
