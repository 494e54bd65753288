//! Icon layout across sections.
//!
//! Each icon carries a section and an `order` within it. These functions turn
//! the stored list into what each section displays, and apply reorders so that
//! `order` stays `0..n` within every section.

use crate::error::{LayoutError, StoreError};
use crate::store::SettingsStore;
use std::sync::Arc;
use stowbar_types::{Point, Rect, Section, SettingsLayoutItem};
use tracing::warn;

/// Store key holding the serialized item list.
pub const LAYOUT_KEY: &str = "layout.items";

fn sorted_in(items: &[SettingsLayoutItem], section: Section) -> Vec<SettingsLayoutItem> {
    let mut list: Vec<_> = items.iter().filter(|i| i.section == section).cloned().collect();
    list.sort_by_key(|i| i.order);
    list
}

/// Items `section` shows, in display order.
///
/// With the always-hidden tier disabled its items are listed first in the
/// hidden section and the always-hidden section shows nothing. The stored
/// assignment is left alone, so enabling the tier again restores it.
pub fn items_for_display(
    items: &[SettingsLayoutItem],
    section: Section,
    always_hidden_enabled: bool,
) -> Vec<SettingsLayoutItem> {
    match (section, always_hidden_enabled) {
        (Section::AlwaysHidden, false) => Vec::new(),
        (Section::Hidden, false) => {
            let mut list = sorted_in(items, Section::AlwaysHidden);
            list.extend(sorted_in(items, Section::Hidden));
            list
        }
        _ => sorted_in(items, section),
    }
}

/// Index at which an item dropped at `drop_point` lands.
///
/// Items are ordered by horizontal midpoint; the result is the position of the
/// first one whose midpoint is right of the drop point, or the count if none is.
pub fn compute_insert_index(drop_point: Point, item_frames: &[Rect]) -> usize {
    let mut midpoints: Vec<f64> = item_frames.iter().map(|f| f.mid_x()).collect();
    midpoints.sort_by(|a, b| a.total_cmp(b));
    midpoints.partition_point(|mid| *mid <= drop_point.x)
}

/// Rewrite `order` in `section` to `0..n`, keeping relative order.
pub fn renumber(items: &mut [SettingsLayoutItem], section: Section) {
    let mut positions: Vec<usize> = (0..items.len())
        .filter(|&i| items[i].section == section)
        .collect();
    positions.sort_by_key(|&i| items[i].order);
    for (order, i) in positions.into_iter().enumerate() {
        items[i].order = order as u32;
    }
}

pub fn renumber_all(items: &mut [SettingsLayoutItem]) {
    for section in Section::ALL {
        renumber(items, section);
    }
}

/// Rewrite `section` so its items appear in `ids` order.
fn apply_order(items: &mut [SettingsLayoutItem], ids: &[String]) {
    for (order, id) in ids.iter().enumerate() {
        if let Some(item) = items.iter_mut().find(|i| &i.icon_identifier == id) {
            item.order = order as u32;
        }
    }
}

/// Add a new icon to `section` at `index` (clamped to the section's length).
pub fn insert_item(
    items: &mut Vec<SettingsLayoutItem>,
    icon_identifier: &str,
    section: Section,
    index: usize,
) -> Result<(), LayoutError> {
    if items.iter().any(|i| i.icon_identifier == icon_identifier) {
        return Err(LayoutError::DuplicateItem(icon_identifier.to_string()));
    }

    let mut ids: Vec<String> = sorted_in(items, section)
        .into_iter()
        .map(|i| i.icon_identifier)
        .collect();
    ids.insert(index.min(ids.len()), icon_identifier.to_string());

    items.push(SettingsLayoutItem::new(icon_identifier, section, 0));
    apply_order(items, &ids);
    Ok(())
}

/// Remove an icon and close the gap it leaves.
pub fn remove_item(
    items: &mut Vec<SettingsLayoutItem>,
    icon_identifier: &str,
) -> Result<SettingsLayoutItem, LayoutError> {
    let position = items
        .iter()
        .position(|i| i.icon_identifier == icon_identifier)
        .ok_or_else(|| LayoutError::UnknownItem(icon_identifier.to_string()))?;
    let removed = items.remove(position);
    renumber(items, removed.section);
    Ok(removed)
}

/// Move an icon to `index` within `to_section`. Both the source and the
/// destination section end up numbered `0..n`.
pub fn move_item(
    items: &mut Vec<SettingsLayoutItem>,
    icon_identifier: &str,
    to_section: Section,
    index: usize,
) -> Result<(), LayoutError> {
    remove_item(items, icon_identifier)?;
    insert_item(items, icon_identifier, to_section, index)
}

/// Section and index an item inserted at `index` of `section`'s display list
/// is stored under.
///
/// With the always-hidden tier folded into hidden, indices inside the leading
/// always-hidden run land in that tier and the rest are shifted past it.
pub fn display_slot(
    items: &[SettingsLayoutItem],
    section: Section,
    index: usize,
    always_hidden_enabled: bool,
) -> (Section, usize) {
    if section != Section::Hidden || always_hidden_enabled {
        return (section, index);
    }
    let folded = items.iter().filter(|i| i.section == Section::AlwaysHidden).count();
    if index < folded {
        (Section::AlwaysHidden, index)
    } else {
        (Section::Hidden, index - folded)
    }
}

/// Like [`move_item`], but `index` counts positions in the display list
/// [`items_for_display`] builds without the moved icon.
pub fn move_item_to_display_index(
    items: &mut Vec<SettingsLayoutItem>,
    icon_identifier: &str,
    section: Section,
    index: usize,
    always_hidden_enabled: bool,
) -> Result<(), LayoutError> {
    remove_item(items, icon_identifier)?;
    let (section, index) = display_slot(items, section, index, always_hidden_enabled);
    insert_item(items, icon_identifier, section, index)
}

/// An icon being dragged between positions.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub icon_identifier: String,
    pub source_section: Section,
    pub target_section: Section,
    /// Where the insertion indicator is drawn, in display-list positions
    pub insertion_index: Option<usize>,
    /// Whether sections are laid out with the always-hidden tier separate
    pub always_hidden_enabled: bool,
}

impl DragSession {
    pub fn begin(
        icon_identifier: impl Into<String>,
        source_section: Section,
        always_hidden_enabled: bool,
    ) -> Self {
        Self {
            icon_identifier: icon_identifier.into(),
            source_section,
            target_section: source_section,
            insertion_index: None,
            always_hidden_enabled,
        }
    }

    /// Track the pointer over `section`, whose other displayed items are at
    /// `item_frames`.
    pub fn update(&mut self, section: Section, pointer: Point, item_frames: &[Rect]) -> usize {
        let index = compute_insert_index(pointer, item_frames);
        self.target_section = section;
        self.insertion_index = Some(index);
        index
    }

    /// Apply the drop. A session that never hovered a position changes nothing.
    pub fn finish(self, items: &mut Vec<SettingsLayoutItem>) -> Result<bool, LayoutError> {
        let Some(index) = self.insertion_index else {
            return Ok(false);
        };
        move_item_to_display_index(
            items,
            &self.icon_identifier,
            self.target_section,
            index,
            self.always_hidden_enabled,
        )?;
        Ok(true)
    }
}

/// Persists the item list through a [`SettingsStore`].
#[derive(Clone)]
pub struct LayoutStore {
    store: Arc<dyn SettingsStore>,
}

impl LayoutStore {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Stored items, renumbered. Missing or malformed data yields an empty list.
    pub fn load(&self) -> Vec<SettingsLayoutItem> {
        let Some(value) = self.store.get(LAYOUT_KEY) else {
            return Vec::new();
        };
        match serde_json::from_value::<Vec<SettingsLayoutItem>>(value) {
            Ok(mut items) => {
                renumber_all(&mut items);
                items
            }
            Err(e) => {
                warn!("Ignoring malformed layout data: {}", e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, items: &[SettingsLayoutItem]) -> Result<(), StoreError> {
        self.store.set(LAYOUT_KEY, serde_json::to_value(items)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn ids(items: &[SettingsLayoutItem]) -> Vec<&str> {
        items.iter().map(|i| i.icon_identifier.as_str()).collect()
    }

    fn orders(items: &[SettingsLayoutItem], section: Section) -> Vec<u32> {
        sorted_in(items, section).iter().map(|i| i.order).collect()
    }

    fn frame_at(mid: f64) -> Rect {
        Rect::new(mid - 5.0, 0.0, 10.0, 24.0)
    }

    #[test]
    fn test_always_hidden_folds_into_hidden_when_disabled() {
        let items = vec![
            SettingsLayoutItem::new("A", Section::AlwaysHidden, 0),
            SettingsLayoutItem::new("B", Section::Hidden, 0),
        ];

        assert_eq!(ids(&items_for_display(&items, Section::Hidden, false)), vec!["A", "B"]);
        assert!(items_for_display(&items, Section::AlwaysHidden, false).is_empty());

        assert_eq!(ids(&items_for_display(&items, Section::Hidden, true)), vec!["B"]);
        assert_eq!(ids(&items_for_display(&items, Section::AlwaysHidden, true)), vec!["A"]);
    }

    #[test]
    fn test_items_sorted_by_order() {
        let items = vec![
            SettingsLayoutItem::new("c", Section::Visible, 2),
            SettingsLayoutItem::new("a", Section::Visible, 0),
            SettingsLayoutItem::new("x", Section::Hidden, 0),
            SettingsLayoutItem::new("b", Section::Visible, 1),
        ];
        assert_eq!(ids(&items_for_display(&items, Section::Visible, true)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_compute_insert_index() {
        let frames = [frame_at(10.0), frame_at(30.0), frame_at(50.0)];
        assert_eq!(compute_insert_index(Point::new(25.0, 0.0), &frames), 1);
        assert_eq!(compute_insert_index(Point::new(60.0, 0.0), &frames), 3);
        assert_eq!(compute_insert_index(Point::new(-5.0, 0.0), &frames), 0);
        assert_eq!(compute_insert_index(Point::new(5.0, 0.0), &[]), 0);

        let shuffled = [frame_at(50.0), frame_at(10.0), frame_at(30.0)];
        assert_eq!(compute_insert_index(Point::new(35.0, 0.0), &shuffled), 2);
    }

    #[test]
    fn test_orders_contiguous_after_insert_and_remove() {
        for size in 0..8usize {
            for index in 0..=size + 1 {
                let mut items: Vec<_> = (0..size)
                    .map(|i| SettingsLayoutItem::new(format!("i{}", i), Section::Hidden, (i * 3) as u32))
                    .collect();

                insert_item(&mut items, "new", Section::Hidden, index).unwrap();
                let expected: Vec<u32> = (0..=size as u32).collect();
                assert_eq!(orders(&items, Section::Hidden), expected);
                let position = sorted_in(&items, Section::Hidden)
                    .iter()
                    .position(|i| i.icon_identifier == "new")
                    .unwrap();
                assert_eq!(position, index.min(size));

                remove_item(&mut items, "new").unwrap();
                if size > 0 {
                    remove_item(&mut items, "i0").unwrap();
                }
                let expected: Vec<u32> = (0..size.saturating_sub(1) as u32).collect();
                assert_eq!(orders(&items, Section::Hidden), expected);
            }
        }
    }

    #[test]
    fn test_move_between_sections_renumbers_both() {
        let mut items = vec![
            SettingsLayoutItem::new("a", Section::Visible, 0),
            SettingsLayoutItem::new("b", Section::Visible, 1),
            SettingsLayoutItem::new("c", Section::Visible, 2),
            SettingsLayoutItem::new("h", Section::Hidden, 0),
        ];
        move_item(&mut items, "b", Section::Hidden, 0).unwrap();

        assert_eq!(ids(&items_for_display(&items, Section::Visible, true)), vec!["a", "c"]);
        assert_eq!(orders(&items, Section::Visible), vec![0, 1]);
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, true)), vec!["b", "h"]);
        assert_eq!(orders(&items, Section::Hidden), vec![0, 1]);
    }

    #[test]
    fn test_unknown_and_duplicate_items() {
        let mut items = vec![SettingsLayoutItem::new("a", Section::Visible, 0)];
        assert_eq!(
            move_item(&mut items, "zzz", Section::Hidden, 0),
            Err(LayoutError::UnknownItem("zzz".to_string()))
        );
        assert_eq!(
            insert_item(&mut items, "a", Section::Hidden, 0),
            Err(LayoutError::DuplicateItem("a".to_string()))
        );
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_drag_session_moves_to_indicator() {
        let mut items = vec![
            SettingsLayoutItem::new("a", Section::Visible, 0),
            SettingsLayoutItem::new("b", Section::Hidden, 0),
            SettingsLayoutItem::new("c", Section::Hidden, 1),
        ];

        let mut drag = DragSession::begin("a", Section::Visible, true);
        let index = drag.update(Section::Hidden, Point::new(40.0, 0.0), &[frame_at(10.0), frame_at(50.0)]);
        assert_eq!(index, 1);
        assert!(drag.finish(&mut items).unwrap());
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, true)), vec!["b", "a", "c"]);

        let untouched = DragSession::begin("b", Section::Hidden, true);
        assert!(!untouched.finish(&mut items).unwrap());
    }

    #[test]
    fn test_drag_into_folded_hidden_lands_where_shown() {
        let folded = || {
            vec![
                SettingsLayoutItem::new("A", Section::AlwaysHidden, 0),
                SettingsLayoutItem::new("B", Section::Hidden, 0),
                SettingsLayoutItem::new("X", Section::Visible, 0),
            ]
        };

        let mut items = folded();
        let mut drag = DragSession::begin("X", Section::Visible, false);
        let index = drag.update(Section::Hidden, Point::new(20.0, 0.0), &[frame_at(10.0), frame_at(30.0)]);
        assert_eq!(index, 1);
        assert!(drag.finish(&mut items).unwrap());
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, false)), vec!["A", "X", "B"]);
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, true)), vec!["X", "B"]);

        let mut items = folded();
        let mut drag = DragSession::begin("X", Section::Visible, false);
        drag.update(Section::Hidden, Point::new(0.0, 0.0), &[frame_at(10.0), frame_at(30.0)]);
        drag.finish(&mut items).unwrap();
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, false)), vec!["X", "A", "B"]);
        assert_eq!(ids(&items_for_display(&items, Section::AlwaysHidden, true)), vec!["X", "A"]);

        let mut items = folded();
        let mut drag = DragSession::begin("A", Section::Hidden, false);
        drag.update(Section::Hidden, Point::new(40.0, 0.0), &[frame_at(10.0)]);
        drag.finish(&mut items).unwrap();
        assert_eq!(ids(&items_for_display(&items, Section::Hidden, false)), vec!["B", "A"]);
    }

    #[test]
    fn test_display_slot_only_remaps_folded_hidden() {
        let items = vec![
            SettingsLayoutItem::new("A", Section::AlwaysHidden, 0),
            SettingsLayoutItem::new("C", Section::AlwaysHidden, 1),
            SettingsLayoutItem::new("B", Section::Hidden, 0),
        ];
        assert_eq!(display_slot(&items, Section::Hidden, 1, false), (Section::AlwaysHidden, 1));
        assert_eq!(display_slot(&items, Section::Hidden, 2, false), (Section::Hidden, 0));
        assert_eq!(display_slot(&items, Section::Hidden, 3, false), (Section::Hidden, 1));
        assert_eq!(display_slot(&items, Section::Hidden, 1, true), (Section::Hidden, 1));
        assert_eq!(display_slot(&items, Section::Visible, 0, false), (Section::Visible, 0));
    }

    #[test]
    fn test_layout_store_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let layout = LayoutStore::new(store.clone());
        assert!(layout.load().is_empty());

        let items = vec![
            SettingsLayoutItem::new("a", Section::Hidden, 4),
            SettingsLayoutItem::new("b", Section::Hidden, 9),
        ];
        layout.save(&items).unwrap();
        assert_eq!(
            store.get(LAYOUT_KEY).unwrap()[0],
            json!({"iconIdentifier": "a", "section": "hidden", "order": 4})
        );

        let loaded = layout.load();
        assert_eq!(orders(&loaded, Section::Hidden), vec![0, 1]);

        store.set(LAYOUT_KEY, json!({"not": "a list"})).unwrap();
        assert!(layout.load().is_empty());
    }
}
