//! Detects when the host navigates to a different video.

use tracing::info;

#[derive(Debug, Default)]
pub struct IdentityWatcher {
    last_seen: Option<String>,
}

impl IdentityWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `current` with the last identity seen.
    /// An absent identity is never a change; a new one is recorded and reported.
    pub fn check_identity(&mut self, current: Option<&str>) -> bool {
        let Some(current) = current else {
            return false;
        };
        if self.last_seen.as_deref() == Some(current) {
            return false;
        }
        info!(previous = ?self.last_seen, current, "watcher: new video detected");
        self.last_seen = Some(current.to_string());
        true
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensure only a different, present identity counts as a change.
    #[test]
    fn reports_changes_once() {
        let mut watcher = IdentityWatcher::new();
        assert!(!watcher.check_identity(None));
        assert!(watcher.check_identity(Some("abc")));
        assert!(!watcher.check_identity(Some("abc")));
        assert!(!watcher.check_identity(None));
        assert_eq!(watcher.last_seen(), Some("abc"));
        assert!(watcher.check_identity(Some("xyz")));
        assert_eq!(watcher.last_seen(), Some("xyz"));
    }
}
