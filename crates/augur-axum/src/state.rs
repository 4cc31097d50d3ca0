//! Shared application state type.

use std::sync::Arc;

use crate::bootstrap::RelayContext;

/// State shared across all connection handlers: an Arc-wrapped
/// [`RelayContext`] holding the dispatcher and the session registry.
pub type AppState = Arc<RelayContext>;
