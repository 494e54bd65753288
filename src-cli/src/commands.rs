//! CLI command implementations.

use crate::colors;
use crate::exit_codes::ExitCode;
use crate::platform;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use stowbar_lib::capture::{composite_image, encode_png, CapturedIconInfo};
use stowbar_lib::config::load_config;
use stowbar_lib::layout::{self, LayoutStore};
use stowbar_lib::{
    CaptureError, EventError, EventForwarder, FixedRegion, IconCaptureEngine, JsonFileStore,
    LayoutError, MouseButton, PermissionGate,
};
use stowbar_types::{primary_display, PermissionType, Point, Section, SettingsLayoutItem};

/// Gap between icons in the composite PNG written by `capture`.
const COMPOSITE_SPACING: u32 = 4;

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", colors::error(&format!("Failed to encode JSON: {}", e)));
            ExitCode::GeneralError
        }
    }
}

fn report(quiet: bool, msg: &str) {
    if !quiet {
        eprintln!("{}", colors::error(msg));
    }
}

/// List connected displays.
pub async fn list_displays(json: bool, quiet: bool) -> ExitCode {
    let services = match platform::require_services(quiet) {
        Ok(services) => services,
        Err(code) => return code,
    };
    let displays = services.displays.displays();

    if json {
        return print_json(&displays);
    }
    if displays.is_empty() {
        if !quiet {
            println!("{}", colors::dim("No displays found."));
        }
        return ExitCode::Success;
    }

    let id_width = displays.iter().map(|d| d.id.len()).max().unwrap_or(2).max(2);
    let name_width = displays.iter().map(|d| d.name.len()).max().unwrap_or(4).max(4);

    println!(
        "{}  {}  {}  {}  {}  {}",
        colors::pad_left("ID", id_width, colors::header),
        colors::pad_left("NAME", name_width, colors::header),
        colors::pad_left("FRAME", 24, colors::header),
        colors::pad_left("SCALE", 5, colors::header),
        colors::pad_left("BAR", 4, colors::header),
        colors::header("PRIMARY")
    );
    println!(
        "{}  {}  {}  {}  {}  {}",
        "-".repeat(id_width),
        "-".repeat(name_width),
        "-".repeat(24),
        "-".repeat(5),
        "-".repeat(4),
        "-".repeat(7)
    );

    for display in &displays {
        let frame = format!(
            "{}x{} @ {},{}",
            display.frame.width(),
            display.frame.height(),
            display.frame.min_x(),
            display.frame.min_y()
        );
        let primary = if display.is_primary {
            colors::yes()
        } else {
            colors::no()
        };
        println!(
            "{}  {:<name_width$}  {:<24}  {:<5}  {:<4}  {}",
            colors::pad_left(&display.id, id_width, colors::number),
            display.name,
            frame,
            display.scale_factor,
            display.menu_bar_height,
            primary
        );
    }
    ExitCode::Success
}

#[derive(Debug, Serialize)]
struct PermissionRow {
    permission: &'static str,
    name: &'static str,
    status: &'static str,
}

/// Show permission statuses, optionally requesting one first.
pub async fn permissions(request: Option<String>, json: bool, quiet: bool) -> ExitCode {
    let requested = match request.as_deref().map(PermissionType::from_str) {
        None => None,
        Some(Some(permission)) => Some(permission),
        Some(None) => {
            report(
                quiet,
                &format!(
                    "Unknown permission '{}'. Expected one of: {}",
                    request.unwrap_or_default(),
                    PermissionType::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
            return ExitCode::InvalidArguments;
        }
    };

    let services = match platform::require_services(quiet) {
        Ok(services) => services,
        Err(code) => return code,
    };
    let gate = PermissionGate::new(services.permissions.clone());

    if let Some(permission) = requested {
        if gate.request(permission).await.is_err() {
            report(quiet, "Permission request task failed");
            return ExitCode::GeneralError;
        }
    }
    let snapshot = gate.refresh_all_statuses().await;

    if json {
        let rows: Vec<PermissionRow> = PermissionType::ALL
            .iter()
            .map(|p| PermissionRow {
                permission: p.as_str(),
                name: p.display_name(),
                status: snapshot.status(*p).as_str(),
            })
            .collect();
        return print_json(&rows);
    }

    if !quiet {
        println!(
            "{}  {}",
            colors::pad_left("PERMISSION", 18, colors::header),
            colors::header("STATUS")
        );
        println!("{}  {}", "-".repeat(18), "-".repeat(7));
        for permission in PermissionType::ALL {
            println!(
                "{:<18}  {}",
                permission.display_name(),
                colors::permission_status(snapshot.status(permission))
            );
        }
    }

    if snapshot.has_all_permissions() {
        ExitCode::Success
    } else {
        if !quiet {
            eprintln!(
                "{}",
                colors::warning("Grant missing permissions in System Settings > Privacy & Security")
            );
        }
        ExitCode::PermissionDenied
    }
}

#[derive(Debug, Serialize)]
struct CaptureReport {
    count: usize,
    captured_at: String,
    output: Option<String>,
    icons: Vec<CapturedIconInfo>,
}

/// Capture the right end of the primary menu bar and slice it into icons.
pub async fn capture(output: Option<String>, json: bool, quiet: bool) -> ExitCode {
    let services = match platform::require_services(quiet) {
        Ok(services) => services,
        Err(code) => return code,
    };
    let config = load_config();

    let displays = services.displays.displays();
    let Some(strip) = primary_display(&displays).map(|d| d.menu_bar_frame()) else {
        report(quiet, "No display found");
        return ExitCode::CaptureFailed;
    };

    let gate = Arc::new(PermissionGate::new(services.permissions.clone()));
    gate.refresh_all_statuses().await;

    let engine = IconCaptureEngine::new(
        gate,
        Arc::new(FixedRegion(strip)),
        services.snapshotter.clone(),
        services.displays.clone(),
        config.capture,
    );

    let result = match engine.capture().await {
        Ok(result) => result,
        Err(CaptureError::PermissionDenied) => {
            report(
                quiet,
                "Screen recording permission required (run 'stowbar permissions --request screen_recording')",
            );
            return ExitCode::PermissionDenied;
        }
        Err(e) => {
            report(quiet, &e.to_string());
            return ExitCode::CaptureFailed;
        }
    };

    if let Some(path) = output.as_deref() {
        if let Err(e) = write_composite(&result.icons, Path::new(path)) {
            report(quiet, &e);
            return ExitCode::CaptureFailed;
        }
    }

    if json {
        return print_json(&CaptureReport {
            count: result.len(),
            captured_at: result.captured_at.to_rfc3339(),
            output,
            icons: result.icons.iter().map(|i| i.info()).collect(),
        });
    }

    if !quiet {
        println!(
            "{} {} icons",
            colors::success("Captured"),
            colors::number(&result.len().to_string())
        );
        for icon in &result.icons {
            let click = icon.click_point();
            println!(
                "  {}  click at {},{}  ({}x{} px)",
                colors::pad_left(&format!("#{}", icon.index), 4, colors::number),
                click.x,
                click.y,
                icon.image.width(),
                icon.image.height()
            );
        }
        if let Some(path) = &output {
            println!("{} {}", colors::dim("Saved to"), colors::path(path));
        }
    }
    ExitCode::Success
}

fn write_composite(icons: &[stowbar_lib::CapturedIcon], path: &Path) -> Result<(), String> {
    let image = composite_image(icons, COMPOSITE_SPACING)
        .ok_or_else(|| "Nothing to write: no icons captured".to_string())?;
    let png = encode_png(&image)?;
    std::fs::write(path, png).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Post a click at a UI-space point and restore the pointer.
pub async fn click(x: f64, y: f64, right: bool, json: bool, quiet: bool) -> ExitCode {
    let services = match platform::require_services(quiet) {
        Ok(services) => services,
        Err(code) => return code,
    };
    let gate = Arc::new(PermissionGate::new(services.permissions.clone()));
    gate.refresh_all_statuses().await;

    let forwarder = EventForwarder::new(gate, services.input.clone(), services.displays.clone());
    let button = if right {
        MouseButton::Right
    } else {
        MouseButton::Left
    };
    let point = Point::new(x, y);

    let outcome = tokio::task::spawn_blocking(move || forwarder.simulate_click_with(point, button))
        .await
        .unwrap_or_else(|e| Err(EventError::EventPostingFailed(e.to_string())));

    match outcome {
        Ok(()) => {
            if json {
                print_json(&serde_json::json!({ "clicked": true, "x": x, "y": y, "right": right }))
            } else {
                if !quiet {
                    println!("{} {},{}", colors::success("Clicked"), x, y);
                }
                ExitCode::Success
            }
        }
        Err(EventError::AccessibilityNotGranted) => {
            report(
                quiet,
                "Accessibility permission required (run 'stowbar permissions --request accessibility')",
            );
            ExitCode::PermissionDenied
        }
        Err(e @ EventError::InvalidCoordinates(_)) => {
            report(quiet, &e.to_string());
            ExitCode::InvalidArguments
        }
        Err(e) => {
            report(quiet, &e.to_string());
            ExitCode::ClickFailed
        }
    }
}

fn parse_section(name: &str, quiet: bool) -> Result<Section, ExitCode> {
    Section::from_str(name).ok_or_else(|| {
        report(
            quiet,
            &format!(
                "Unknown section '{}'. Expected one of: visible, hidden, alwaysHidden",
                name
            ),
        );
        ExitCode::InvalidArguments
    })
}

fn default_layout_store() -> LayoutStore {
    LayoutStore::new(Arc::new(JsonFileStore::open_default()))
}

/// Print the stored layout, one section or all of them.
pub fn layout_show(section: Option<String>, json: bool, quiet: bool) -> ExitCode {
    let sections = match section.as_deref() {
        Some(name) => match parse_section(name, quiet) {
            Ok(section) => vec![section],
            Err(code) => return code,
        },
        None => Section::ALL.to_vec(),
    };
    let always_hidden_enabled = load_config().layout.always_hidden_enabled;
    show_layout(
        &default_layout_store(),
        &sections,
        always_hidden_enabled,
        json,
        quiet,
    )
}

fn show_layout(
    store: &LayoutStore,
    sections: &[Section],
    always_hidden_enabled: bool,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let items = store.load();
    let lists: Vec<(Section, Vec<SettingsLayoutItem>)> = sections
        .iter()
        .map(|s| (*s, layout::items_for_display(&items, *s, always_hidden_enabled)))
        .collect();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = lists
            .iter()
            .map(|(s, list)| {
                let ids = list
                    .iter()
                    .map(|i| serde_json::Value::String(i.icon_identifier.clone()))
                    .collect();
                (s.as_str().to_string(), serde_json::Value::Array(ids))
            })
            .collect();
        return print_json(&map);
    }

    if quiet {
        return ExitCode::Success;
    }
    for (section, list) in &lists {
        println!("{}", colors::header(section.as_str()));
        if list.is_empty() {
            println!("  {}", colors::dim("(empty)"));
        }
        for (i, item) in list.iter().enumerate() {
            println!(
                "  {}  {}",
                colors::pad_left(&i.to_string(), 3, colors::number),
                item.icon_identifier
            );
        }
    }
    ExitCode::Success
}

/// Move an icon to `section` at `index`, adding it if it is not stored yet.
pub fn layout_move(
    icon_identifier: String,
    section: String,
    index: Option<usize>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let section = match parse_section(&section, quiet) {
        Ok(section) => section,
        Err(code) => return code,
    };
    move_in_layout(
        &default_layout_store(),
        &icon_identifier,
        section,
        index,
        json,
        quiet,
    )
}

fn move_in_layout(
    store: &LayoutStore,
    icon_identifier: &str,
    section: Section,
    index: Option<usize>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let mut items = store.load();
    let index = index.unwrap_or(usize::MAX);

    let added = match layout::move_item(&mut items, icon_identifier, section, index) {
        Ok(()) => false,
        Err(LayoutError::UnknownItem(_)) => {
            if let Err(e) = layout::insert_item(&mut items, icon_identifier, section, index) {
                report(quiet, &e.to_string());
                return ExitCode::LayoutFailed;
            }
            true
        }
        Err(e) => {
            report(quiet, &e.to_string());
            return ExitCode::LayoutFailed;
        }
    };

    if let Err(e) = store.save(&items) {
        report(quiet, &e.to_string());
        return ExitCode::LayoutFailed;
    }

    let order = items
        .iter()
        .find(|i| i.icon_identifier == icon_identifier)
        .map(|i| i.order)
        .unwrap_or_default();

    if json {
        return print_json(&serde_json::json!({
            "iconIdentifier": icon_identifier,
            "section": section.as_str(),
            "order": order,
            "added": added,
        }));
    }
    if !quiet {
        let verb = if added { "Added" } else { "Moved" };
        println!(
            "{} {} to {} at {}",
            colors::success(verb),
            colors::bold(icon_identifier),
            section.as_str(),
            colors::number(&order.to_string())
        );
    }
    ExitCode::Success
}

/// Show version information.
pub fn version(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        let _ = print_json(&serde_json::json!({
            "version": version,
            "backend": platform::backend_name(),
            "config": stowbar_lib::config::get_config_path(),
            "logs": stowbar_types::logging::log_dir(),
        }));
    } else {
        println!("stowbar {}", colors::bold(version));
        println!("{} {}", colors::dim("backend:"), platform::backend_name());
        println!(
            "{} {}",
            colors::dim("config: "),
            colors::path(&stowbar_lib::config::get_config_path().display().to_string())
        );
    }
}
