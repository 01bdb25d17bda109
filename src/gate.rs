/*!
 * Maintenance Gate
 * Decides whether visitors see the site or the maintenance view
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::content::schema::MaintenanceRecord;

/// Paths that stay reachable during maintenance so it can be switched off.
pub const ADMIN_PATHS: &[&str] = &["/admin", "/web-admin"];

/// Session cookie set by the admin bypass endpoint.
pub const BYPASS_COOKIE: &str = "maintenance_bypass";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteState {
    Online,
    Maintenance,
}

/// What a visitor on a given path gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Site,
    Admin,
    Maintenance,
}

/// Maintenance applies while the record is active and `now` is inside
/// `[start_date, end_date]`; a missing bound is open on that side.
pub fn evaluate(record: &MaintenanceRecord, now: DateTime<Utc>, bypass: bool) -> SiteState {
    if bypass || !record.is_globally_active {
        return SiteState::Online;
    }
    if record.start_date.is_some_and(|start| now < start) {
        return SiteState::Online;
    }
    if record.end_date.is_some_and(|end| now > end) {
        return SiteState::Online;
    }
    SiteState::Maintenance
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_admin_path(path: &str) -> bool {
    ADMIN_PATHS.iter().any(|prefix| matches_prefix(path, prefix))
}

/// Admin entry, API and health routes are never replaced by the maintenance view.
pub fn is_ungated_path(path: &str) -> bool {
    is_admin_path(path) || matches_prefix(path, "/api") || matches_prefix(path, "/health")
}

/// Per-session gate. Once the admin bypass is set it holds for the
/// lifetime of the session.
#[derive(Debug, Default)]
pub struct MaintenanceGate {
    bypass: AtomicBool,
}

impl MaintenanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_admin_bypass(&self) {
        self.bypass.store(true, Ordering::SeqCst);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass.load(Ordering::SeqCst)
    }

    pub fn state(&self, record: &MaintenanceRecord, now: DateTime<Utc>) -> SiteState {
        evaluate(record, now, self.is_bypassed())
    }

    pub fn resolve(&self, path: &str, record: &MaintenanceRecord, now: DateTime<Utc>) -> View {
        if is_admin_path(path) {
            return View::Admin;
        }
        match self.state(record, now) {
            SiteState::Online => View::Site,
            SiteState::Maintenance => View::Maintenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> MaintenanceRecord {
        MaintenanceRecord {
            is_globally_active: true,
            start_date: start,
            end_date: end,
            ..Default::default()
        }
    }

    #[test]
    fn test_inactive_record_is_online() {
        let record = MaintenanceRecord::default();
        assert_eq!(evaluate(&record, Utc::now(), false), SiteState::Online);
    }

    #[test]
    fn test_active_inside_window_is_maintenance() {
        let now = Utc::now();
        let record = active(Some(now - Duration::hours(1)), Some(now + Duration::hours(1)));
        assert_eq!(evaluate(&record, now, false), SiteState::Maintenance);
    }

    #[test]
    fn test_elapsed_window_is_online() {
        let now = Utc::now();
        let record = active(None, Some(now - Duration::hours(1)));
        assert_eq!(evaluate(&record, now, false), SiteState::Online);
    }

    #[test]
    fn test_future_window_is_online() {
        let now = Utc::now();
        let record = active(Some(now + Duration::hours(1)), None);
        assert_eq!(evaluate(&record, now, false), SiteState::Online);
    }

    #[test]
    fn test_unbounded_active_is_maintenance() {
        assert_eq!(evaluate(&active(None, None), Utc::now(), false), SiteState::Maintenance);
    }

    #[test]
    fn test_bypass_forces_online() {
        let gate = MaintenanceGate::new();
        let record = active(None, None);
        let now = Utc::now();
        assert_eq!(gate.state(&record, now), SiteState::Maintenance);
        gate.enable_admin_bypass();
        assert_eq!(gate.state(&record, now), SiteState::Online);
        assert_eq!(gate.resolve("/", &record, now), View::Site);
    }

    #[test]
    fn test_admin_path_stays_reachable() {
        let gate = MaintenanceGate::new();
        let record = active(None, None);
        let now = Utc::now();
        assert_eq!(gate.resolve("/web-admin", &record, now), View::Admin);
        assert_eq!(gate.resolve("/admin/settings", &record, now), View::Admin);
        assert_eq!(gate.resolve("/", &record, now), View::Maintenance);
        assert_eq!(gate.resolve("/administrator", &record, now), View::Maintenance);
    }

    #[test]
    fn test_ungated_paths() {
        assert!(is_ungated_path("/api/content"));
        assert!(is_ungated_path("/health"));
        assert!(is_ungated_path("/admin"));
        assert!(!is_ungated_path("/"));
        assert!(!is_ungated_path("/apiary"));
    }
}
