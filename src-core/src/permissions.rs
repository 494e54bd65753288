//! Permission gate.
//!
//! Caches the grant status of the OS capabilities the core depends on and
//! pushes a notification to subscribers whenever a refresh changes it.
//! Polling the OS can block, so refreshes run on the blocking pool.

use crate::error::PermissionError;
use crate::platform::PermissionChecker;
use serde::Serialize;
use std::sync::Arc;
use stowbar_types::{PermissionStatus, PermissionType};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cached status of every permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PermissionSnapshot {
    pub accessibility: PermissionStatus,
    pub screen_recording: PermissionStatus,
}

impl PermissionSnapshot {
    pub fn status(&self, permission: PermissionType) -> PermissionStatus {
        match permission {
            PermissionType::Accessibility => self.accessibility,
            PermissionType::ScreenRecording => self.screen_recording,
        }
    }

    fn set(&mut self, permission: PermissionType, status: PermissionStatus) {
        match permission {
            PermissionType::Accessibility => self.accessibility = status,
            PermissionType::ScreenRecording => self.screen_recording = status,
        }
    }

    pub fn has_all_permissions(&self) -> bool {
        PermissionType::ALL
            .iter()
            .all(|p| self.status(*p).is_granted())
    }

    /// Permission types that are not granted, in prompt order.
    pub fn missing(&self) -> Vec<PermissionType> {
        PermissionType::ALL
            .iter()
            .copied()
            .filter(|p| !self.status(*p).is_granted())
            .collect()
    }
}

/// Tracks which OS capabilities are granted.
pub struct PermissionGate {
    checker: Arc<dyn PermissionChecker>,
    statuses: Arc<watch::Sender<PermissionSnapshot>>,
}

impl PermissionGate {
    /// Create a gate with every status `Unknown` until the first refresh.
    pub fn new(checker: Arc<dyn PermissionChecker>) -> Self {
        let (tx, _rx) = watch::channel(PermissionSnapshot::default());
        Self {
            checker,
            statuses: Arc::new(tx),
        }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<PermissionSnapshot> {
        self.statuses.subscribe()
    }

    /// The cached snapshot.
    pub fn snapshot(&self) -> PermissionSnapshot {
        *self.statuses.borrow()
    }

    pub fn status(&self, permission: PermissionType) -> PermissionStatus {
        self.snapshot().status(permission)
    }

    pub fn is_granted(&self, permission: PermissionType) -> bool {
        self.status(permission).is_granted()
    }

    /// Fail with `NotGranted` unless `permission` is granted.
    pub fn require(&self, permission: PermissionType) -> Result<(), PermissionError> {
        if self.is_granted(permission) {
            Ok(())
        } else {
            Err(PermissionError::NotGranted(permission))
        }
    }

    /// Derived on every read from the cached statuses.
    pub fn has_all_permissions(&self) -> bool {
        self.snapshot().has_all_permissions()
    }

    pub fn is_missing_permissions(&self) -> bool {
        !self.has_all_permissions()
    }

    pub fn missing_permissions(&self) -> Vec<PermissionType> {
        self.snapshot().missing()
    }

    /// Re-poll every permission and publish the result.
    ///
    /// Subscribers are notified only when a status actually changed.
    /// Concurrent refreshes are last-writer-wins.
    pub async fn refresh_all_statuses(&self) -> PermissionSnapshot {
        refresh(Arc::clone(&self.checker), Arc::clone(&self.statuses)).await
    }

    /// Start the OS consent flow for `permission`.
    ///
    /// Returns immediately. The cached status is only updated by the refresh
    /// that runs once the request has been handed to the OS; await the
    /// returned handle to observe it. Must be called within a tokio runtime.
    pub fn request(&self, permission: PermissionType) -> JoinHandle<()> {
        let checker = Arc::clone(&self.checker);
        let statuses = Arc::clone(&self.statuses);

        tokio::spawn(async move {
            info!("Requesting {} permission", permission.display_name());
            let request_checker = Arc::clone(&checker);
            match tokio::task::spawn_blocking(move || request_checker.request(permission)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Permission request failed: {}", e),
                Err(e) => warn!("Permission request task failed: {}", e),
            }
            refresh(checker, statuses).await;
        })
    }
}

async fn refresh(
    checker: Arc<dyn PermissionChecker>,
    statuses: Arc<watch::Sender<PermissionSnapshot>>,
) -> PermissionSnapshot {
    let polled = tokio::task::spawn_blocking(move || {
        let mut snapshot = PermissionSnapshot::default();
        for permission in PermissionType::ALL {
            snapshot.set(permission, checker.status(permission));
        }
        snapshot
    })
    .await;

    let snapshot = match polled {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Permission poll task failed: {}", e);
            return *statuses.borrow();
        }
    };

    let changed = statuses.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
    if changed {
        info!(
            "Permissions: accessibility={}, screen_recording={}",
            snapshot.accessibility.as_str(),
            snapshot.screen_recording.as_str()
        );
    } else {
        debug!("Permissions unchanged after refresh");
    }
    snapshot
}
