//! Turns pending-notification rows into push notifications.

pub mod dispatcher;
pub mod registry;
