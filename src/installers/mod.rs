// This module is the central hub for the installer backends, one per way
// the catalog can ask for something to land on the machine.

/// The apt backend: index refresh, the base toolset bootstrap, and the
/// declarative batch install of the catalog's system packages.
pub(crate) mod apt;

/// The per-repository installer: clone a git URL under the programs
/// directory and populate an isolated Python environment from whichever
/// dependency manifest the repository ships.
pub(crate) mod git_repo;

/// The Ruby gem backend. Optional: skipped with a warning when `gem` is
/// not on the PATH.
pub(crate) mod gem;

/// The Go toolchain installer: resolves the latest release, downloads the
/// tarball, unpacks it, and records GOROOT/PATH in the environment record.
pub(crate) mod golang;

/// MongoDB setup: vendor signing key, apt source list, and the
/// `mongodb-org` install.
pub(crate) mod mongodb;

/// The snap backend. Optional, like gems: absent `snap` means a warning
/// and a skipped section, never a failed run.
pub(crate) mod snap;
