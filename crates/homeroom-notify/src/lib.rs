//! `homeroom-notify` — turns a fired reminder back into messages.
//!
//! At fire time the notifier re-fetches the assignment and its group fresh
//! from the store (the referenced rows may have changed or vanished since
//! the job was armed), resolves the roster, and delivers one formatted
//! message per reachable member plus a summary to the group owner. Every
//! failure is contained here: one bad recipient never blocks the rest, and
//! nothing is retried.

pub mod error;
pub mod format;
pub mod notifier;
pub mod sender;

pub use error::{NotifyError, Result};
pub use notifier::{DeliveryReport, Notifier};
pub use sender::{TextSender, WebhookSender};
