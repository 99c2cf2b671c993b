/// Router Module Index
///
/// Splits the HTTP surface by who may reach it. Authentication is applied at
/// the router layer for `authenticated`; role checks happen inside the
/// handlers through the `policy` module.

/// Routes accessible to anonymous readers.
/// Handlers only ever return articles whose window is currently open.
pub mod public;

/// Article management routes, protected by the `AuthUser` middleware.
/// Requires the Admin or Contributor role.
pub mod authenticated;

/// User and role management, restricted to the Admin role.
pub mod admin;
