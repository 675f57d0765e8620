//! `homeroom-service` — wiring and the administrative facade.
//!
//! The [`api::AdminApi`] is the surface the conversational front-end calls
//! into: every operation takes the acting user's id and is permission-checked
//! before it touches the store. The `homeroomd` binary assembles the store,
//! scheduler, executor, and notifier and runs them until shutdown.

pub mod api;

pub use api::AdminApi;
