//! Stowbar core: menu bar visibility, hidden icon capture and click forwarding.
//!
//! [`MenuBarCore`] owns every component and is the one place platform
//! services are wired in. Components can also be built individually with
//! their own service handles.

pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod hover;
pub mod layout;
pub mod logging;
pub mod overlay;
pub mod permissions;
pub mod platform;
pub mod sections;
pub mod store;
pub mod timer;

pub use capture::{
    CapturedIcon, FixedRegion, HiddenRegionSource, IconCaptureEngine, MenuBarCaptureResult,
};
pub use config::{AppConfig, DisplayMode};
pub use error::{CaptureError, EventError, LayoutError, PermissionError, PlacementError, StoreError};
pub use events::EventForwarder;
pub use hover::{HoverIntent, HoverState, HoverTriggerMonitor};
pub use layout::{DragSession, LayoutStore};
pub use overlay::OverlayPositioner;
pub use permissions::{PermissionGate, PermissionSnapshot};
pub use platform::{MouseButton, PlatformServices, UiExecutor};
pub use sections::{SectionSnapshot, SectionState, SectionStateMachine};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};

use platform::run_on_ui;
use std::sync::Arc;
use stowbar_types::SettingsLayoutItem;
use tracing::{debug, info, warn};

/// Composition root owning every menu bar component.
///
/// Build it inside a tokio runtime so timers and hover polling are available.
/// The async operations post every section transition to the platform's UI
/// executor; the synchronous ones must be called on the UI sequence.
pub struct MenuBarCore {
    config: AppConfig,
    ui: Arc<dyn UiExecutor>,
    permissions: Arc<PermissionGate>,
    sections: Arc<SectionStateMachine>,
    capture: IconCaptureEngine,
    events: EventForwarder,
    hover: Arc<HoverTriggerMonitor>,
    overlay: OverlayPositioner,
    layout: LayoutStore,
}

impl MenuBarCore {
    pub fn new(services: PlatformServices, config: AppConfig, store: Arc<dyn SettingsStore>) -> Self {
        let permissions = Arc::new(PermissionGate::new(services.permissions.clone()));
        let sections = SectionStateMachine::new(
            services.menu_bar.clone(),
            store.clone(),
            services.displays.clone(),
            &config.sections,
            services.ui.clone(),
        );
        let capture = IconCaptureEngine::new(
            permissions.clone(),
            sections.clone(),
            services.snapshotter.clone(),
            services.displays.clone(),
            config.capture.clone(),
        );
        let events = EventForwarder::new(
            permissions.clone(),
            services.input.clone(),
            services.displays.clone(),
        );
        let hover = HoverTriggerMonitor::new(
            services.pointer.clone(),
            services.displays.clone(),
            config.hover.poll_interval(),
        );
        let overlay = OverlayPositioner::new(services.overlay.clone(), services.displays.clone());

        Self {
            config,
            ui: services.ui,
            permissions,
            sections,
            capture,
            events,
            hover,
            overlay,
            layout: LayoutStore::new(store),
        }
    }

    /// Core wired to this OS's native services and the default settings file.
    pub fn native(config: AppConfig) -> Option<Self> {
        let services = platform::native_services()?;
        Some(Self::new(services, config, Arc::new(JsonFileStore::open_default())))
    }

    /// Poll permissions, create the control items and start hover tracking
    /// if enabled.
    pub async fn init(&self) -> Result<(), PlacementError> {
        let snapshot = self.permissions.refresh_all_statuses().await;
        if !snapshot.has_all_permissions() {
            warn!(
                "Missing permissions: {:?}",
                snapshot
                    .missing()
                    .iter()
                    .map(|p| p.display_name())
                    .collect::<Vec<_>>()
            );
        }

        let sections = Arc::clone(&self.sections);
        run_on_ui(self.ui.as_ref(), move || sections.initialize())
            .await
            .unwrap_or_else(|| Err(PlacementError::Unavailable("UI executor stopped".to_string())))?;
        if self.config.hover.enabled {
            self.hover.start();
        }
        info!("Menu bar core initialized ({:?} mode)", self.config.display.mode);
        Ok(())
    }

    /// Stop tracking, drop any running capture and remove the control items.
    pub fn shutdown(&self) {
        self.hover.stop();
        self.capture.cancel();
        self.overlay.hide();
        self.sections.shutdown();
        info!("Menu bar core shut down");
    }

    /// Expand just long enough to snapshot the hidden icons, then restore the
    /// previous state.
    ///
    /// The collapse also happens if this future is dropped midway. It is
    /// skipped when the section was expanded or collapsed by anyone else in
    /// the meantime.
    pub async fn reveal_hidden_icons(&self) -> capture::CaptureOutcome {
        let sections = Arc::clone(&self.sections);
        let expanded_at = run_on_ui(self.ui.as_ref(), move || {
            if !sections.is_collapsed() {
                return None;
            }
            sections.expand();
            (sections.state() == SectionState::Expanded).then(|| sections.revision())
        })
        .await
        .flatten();

        let restore = expanded_at.map(|revision| RevealRestore {
            sections: Arc::clone(&self.sections),
            ui: Arc::clone(&self.ui),
            revision,
        });
        if restore.is_some() {
            tokio::time::sleep(self.config.capture.settle_delay()).await;
        }

        let result = self.capture.capture().await;
        drop(restore);

        match &result {
            Ok(r) => debug!("Revealed {} hidden icons", r.len()),
            Err(e) => warn!("Hidden icon capture failed: {}", e),
        }
        result
    }

    /// Capture the hidden icons and show them in the drawer.
    pub async fn show_drawer(&self) -> capture::CaptureOutcome {
        let result = self.reveal_hidden_icons().await?;
        if let Some(frame) = self.overlay.show(result.len(), result.region.min_x()) {
            self.hover.set_drawer_frame(frame);
            self.hover.set_drawer_visible(true);
        }
        Ok(result)
    }

    pub fn hide_drawer(&self) {
        self.overlay.hide();
        self.hover.set_drawer_visible(false);
    }

    /// Act on a hover intent from [`HoverTriggerMonitor::intents`].
    pub async fn handle_hover_intent(&self, intent: HoverIntent) {
        match intent {
            HoverIntent::Reveal => match self.config.display.mode {
                DisplayMode::MenuBar => {
                    let sections = Arc::clone(&self.sections);
                    run_on_ui(self.ui.as_ref(), move || sections.expand()).await;
                }
                DisplayMode::Drawer => {
                    let _ = self.show_drawer().await;
                }
            },
            HoverIntent::Hide => match self.config.display.mode {
                DisplayMode::MenuBar => {
                    let sections = Arc::clone(&self.sections);
                    run_on_ui(self.ui.as_ref(), move || sections.collapse()).await;
                }
                DisplayMode::Drawer => self.hide_drawer(),
            },
        }
    }

    /// Forward a click to the real icon behind `icon`.
    pub fn click_icon(&self, icon: &CapturedIcon, button: MouseButton) -> Result<(), EventError> {
        self.sections.note_user_interaction();
        self.events.click_icon(icon, button)
    }

    /// Display list for `section` from the stored layout.
    pub fn layout_for(&self, section: stowbar_types::Section) -> Vec<SettingsLayoutItem> {
        layout::items_for_display(
            &self.layout.load(),
            section,
            self.config.layout.always_hidden_enabled,
        )
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn permissions(&self) -> &Arc<PermissionGate> {
        &self.permissions
    }

    pub fn sections(&self) -> &Arc<SectionStateMachine> {
        &self.sections
    }

    pub fn capture_engine(&self) -> &IconCaptureEngine {
        &self.capture
    }

    pub fn events(&self) -> &EventForwarder {
        &self.events
    }

    pub fn hover(&self) -> &Arc<HoverTriggerMonitor> {
        &self.hover
    }

    pub fn overlay(&self) -> &OverlayPositioner {
        &self.overlay
    }

    pub fn layout(&self) -> &LayoutStore {
        &self.layout
    }
}

/// Collapses the section a reveal expanded, unless it changed since.
struct RevealRestore {
    sections: Arc<SectionStateMachine>,
    ui: Arc<dyn UiExecutor>,
    revision: u64,
}

impl Drop for RevealRestore {
    fn drop(&mut self) {
        let sections = Arc::clone(&self.sections);
        let revision = self.revision;
        self.ui.post(Box::new(move || {
            if sections.revision() == revision {
                sections.collapse();
            } else {
                debug!("Section changed during reveal, leaving it {:?}", sections.state());
            }
        }));
    }
}
