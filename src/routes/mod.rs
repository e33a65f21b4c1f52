/// Router Module Index
///
/// Routes are grouped by who may reach them. The global access gate enforces
/// page-level classification for every group; the admin API additionally
/// runs the role guard inside each handler.

/// Health, docs and anything else reachable without a session.
pub mod public;

/// Routes for any signed-in role.
pub mod authenticated;

/// The client portal under `/home`.
pub mod client;

/// The staff area under `/admin` and the user administration API.
pub mod admin;
