//! Effective-user check.

/// Returns `true` if the process runs with an effective UID of root.
pub fn is_root() -> bool {
    rustix::process::geteuid().is_root()
}
