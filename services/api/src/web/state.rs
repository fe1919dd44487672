//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::cache::TtlCache;
use crate::config::Config;
use chrono::{DateTime, NaiveDate, Utc};
use duotrack_core::domain::Category;
use duotrack_core::ports::{CategoryClassifier, Clock, DatabaseService, NotificationService};
use duotrack_core::Calendar;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub notifier: Arc<dyn NotificationService>,
    pub classifier: Arc<dyn CategoryClassifier>,
    pub clock: Arc<dyn Clock>,
    pub calendar: Calendar,
    /// Category suggestions keyed by lower-cased task text.
    pub category_cache: Arc<TtlCache<String, Category>>,
}

impl AppState {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(self.now())
    }
}
