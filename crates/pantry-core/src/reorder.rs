//! Drag-to-reorder gestures.
//!
//! A [`ReorderSession`] tracks one drag at a time. While the pointer moves it
//! only computes where the dragged item *would* land, for visual feedback;
//! the list itself is touched once, on [`ReorderSession::commit`].

use crate::list::ListItem;

/// Displacement below which a gesture counts as no movement.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 10.0;

/// Geometry of the list being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderConfig {
    /// Extent of one item along the drag axis.
    pub item_extent: f64,
    /// Minimum absolute displacement before a move is recognized.
    pub threshold: f64,
}

impl ReorderConfig {
    pub fn new(item_extent: f64) -> Self {
        Self {
            item_extent,
            threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// State of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub source_index: usize,
    /// `None` until the displacement crosses the threshold.
    pub preview_target: Option<usize>,
    pub item_count: usize,
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderCommit<T> {
    pub list: Vec<T>,
    pub from_index: usize,
    pub to_index: usize,
}

impl<T> ReorderCommit<T> {
    /// True if the list order changed.
    pub fn changed(&self) -> bool {
        self.from_index != self.to_index
    }
}

/// Manages a single drag gesture over a list.
#[derive(Debug, Clone)]
pub struct ReorderSession {
    config: ReorderConfig,
    active: Option<DragSession>,
}

impl ReorderSession {
    pub fn new(config: ReorderConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// The gesture in progress, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start dragging the item at `source_index`. Supersedes any gesture in progress.
    ///
    /// # Panics
    ///
    /// Panics if `source_index` is not a valid index into a list of `item_count` items.
    pub fn begin(&mut self, source_index: usize, item_count: usize) {
        assert!(
            source_index < item_count,
            "drag source {} out of bounds for {} items",
            source_index,
            item_count
        );
        if self.active.is_some() {
            tracing::debug!("Drag superseded by new gesture at {}", source_index);
        }
        self.active = Some(DragSession {
            source_index,
            preview_target: None,
            item_count,
        });
    }

    /// Update the preview for the current displacement and return the
    /// index the item would land at, or `None` while under the threshold.
    ///
    /// Never touches the list. Returns `None` if no gesture is active.
    pub fn preview(&mut self, pointer_delta: f64) -> Option<usize> {
        let config = self.config;
        let session = self.active.as_mut()?;

        session.preview_target = if crosses_threshold(&config, pointer_delta) {
            Some(target_index(&config, session, pointer_delta))
        } else {
            None
        };
        session.preview_target
    }

    /// Visual displacement for the sibling at `index` under the current preview.
    ///
    /// Items between the source and the preview target move one extent
    /// against the drag direction; everything else, including the dragged
    /// item itself, stays put.
    pub fn sibling_offset(&self, index: usize) -> f64 {
        let Some(session) = &self.active else {
            return 0.0;
        };
        let Some(target) = session.preview_target else {
            return 0.0;
        };
        let source = session.source_index;

        if target > source && index > source && index <= target {
            -self.config.item_extent
        } else if target < source && index >= target && index < source {
            self.config.item_extent
        } else {
            0.0
        }
    }

    /// Finish the gesture, moving the dragged item if it crossed into a new slot.
    ///
    /// When the target equals the source the list is handed back untouched.
    ///
    /// # Panics
    ///
    /// Panics if no gesture was started with [`begin`](Self::begin).
    pub fn commit<T: ListItem>(&mut self, mut list: Vec<T>, pointer_delta: f64) -> ReorderCommit<T> {
        let Some(session) = self.active.take() else {
            panic!("ReorderSession::commit called without an active drag");
        };

        let from_index = session.source_index;
        let mut to_index = if crosses_threshold(&self.config, pointer_delta) {
            target_index(&self.config, &session, pointer_delta)
        } else {
            from_index
        };

        if list.len() != session.item_count {
            tracing::warn!(
                "List changed size during drag ({} -> {} items)",
                session.item_count,
                list.len()
            );
            if from_index >= list.len() {
                to_index = from_index;
            } else {
                to_index = to_index.min(list.len() - 1);
            }
        }

        if from_index == to_index {
            return ReorderCommit {
                list,
                from_index,
                to_index,
            };
        }

        let item = list.remove(from_index);
        tracing::debug!("Moved {} from {} to {}", item.id(), from_index, to_index);
        list.insert(to_index, item);

        ReorderCommit {
            list,
            from_index,
            to_index,
        }
    }

    /// Abandon the gesture without producing a new list.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("Drag cancelled");
        }
    }
}

fn crosses_threshold(config: &ReorderConfig, pointer_delta: f64) -> bool {
    pointer_delta.is_finite() && pointer_delta.abs() >= config.threshold
}

fn target_index(config: &ReorderConfig, session: &DragSession, pointer_delta: f64) -> usize {
    let steps = (pointer_delta / config.item_extent).round() as i64;
    let last = session.item_count.saturating_sub(1) as i64;
    (session.source_index as i64 + steps).clamp(0, last) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Section;

    fn list(ids: &[&str]) -> Vec<Section> {
        ids.iter().map(|id| Section::new(*id, id.to_uppercase())).collect()
    }

    fn ids(list: &[Section]) -> Vec<&str> {
        list.iter().map(|s| s.id.as_str()).collect()
    }

    fn session() -> ReorderSession {
        ReorderSession::new(ReorderConfig::new(50.0))
    }

    #[test]
    fn test_scenario_move_up_one() {
        let mut reorder = session();
        reorder.begin(2, 3);

        assert_eq!(reorder.preview(-60.0), Some(1));

        let commit = reorder.commit(list(&["a", "b", "c"]), -60.0);
        assert_eq!(ids(&commit.list), vec!["a", "c", "b"]);
        assert_eq!(commit.from_index, 2);
        assert_eq!(commit.to_index, 1);
        assert!(commit.changed());
        assert!(!reorder.is_active());
    }

    #[test]
    fn test_move_down_two_extents() {
        let mut reorder = session();
        reorder.begin(0, 5);

        let commit = reorder.commit(list(&["a", "b", "c", "d", "e"]), 100.0);

        assert_eq!(ids(&commit.list), vec!["b", "c", "a", "d", "e"]);
        assert_eq!((commit.from_index, commit.to_index), (0, 2));
    }

    #[test]
    fn test_below_threshold_is_noop() {
        let original = list(&["a", "b", "c"]);
        let mut reorder = session();
        reorder.begin(1, 3);

        assert_eq!(reorder.preview(9.0), None);
        let commit = reorder.commit(original.clone(), -9.5);

        assert_eq!(commit.list, original);
        assert_eq!(commit.from_index, commit.to_index);
        assert!(!commit.changed());
    }

    #[test]
    fn test_preview_activates_at_threshold_without_moving() {
        let mut reorder = session();
        reorder.begin(1, 3);

        // Past the jitter threshold but less than half an item.
        assert_eq!(reorder.preview(20.0), Some(1));
        assert_eq!(reorder.session().unwrap().preview_target, Some(1));
    }

    #[test]
    fn test_target_is_clamped() {
        let mut reorder = session();
        reorder.begin(1, 3);
        assert_eq!(reorder.preview(10_000.0), Some(2));
        assert_eq!(reorder.preview(-10_000.0), Some(0));

        let commit = reorder.commit(list(&["a", "b", "c"]), -10_000.0);
        assert_eq!(ids(&commit.list), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_preview_does_not_touch_list_and_is_repeatable() {
        let mut reorder = session();
        reorder.begin(0, 4);

        for delta in [30.0, 80.0, 140.0, 80.0] {
            reorder.preview(delta);
        }
        assert_eq!(reorder.preview(80.0), Some(2));
        assert_eq!(reorder.preview(80.0), Some(2));
    }

    #[test]
    fn test_sibling_offsets_dragging_down() {
        let mut reorder = session();
        reorder.begin(1, 5);
        reorder.preview(100.0); // target 3

        let offsets: Vec<f64> = (0..5).map(|i| reorder.sibling_offset(i)).collect();
        assert_eq!(offsets, vec![0.0, 0.0, -50.0, -50.0, 0.0]);
    }

    #[test]
    fn test_sibling_offsets_dragging_up() {
        let mut reorder = session();
        reorder.begin(3, 5);
        reorder.preview(-100.0); // target 1

        let offsets: Vec<f64> = (0..5).map(|i| reorder.sibling_offset(i)).collect();
        assert_eq!(offsets, vec![0.0, 50.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sibling_offsets_idle_before_threshold() {
        let mut reorder = session();
        reorder.begin(0, 3);
        reorder.preview(5.0);

        assert!((0..3).all(|i| reorder.sibling_offset(i) == 0.0));
    }

    #[test]
    fn test_cancel_discards_session() {
        let mut reorder = session();
        reorder.begin(0, 3);
        reorder.preview(60.0);
        reorder.cancel();

        assert!(!reorder.is_active());
        assert_eq!(reorder.preview(60.0), None);
    }

    #[test]
    fn test_begin_supersedes_previous_gesture() {
        let mut reorder = session();
        reorder.begin(0, 3);
        reorder.preview(60.0);
        reorder.begin(2, 3);

        let s = reorder.session().unwrap();
        assert_eq!(s.source_index, 2);
        assert_eq!(s.preview_target, None);
    }

    #[test]
    fn test_list_shrunk_during_drag_is_clamped() {
        let mut reorder = session();
        reorder.begin(0, 4);

        let commit = reorder.commit(list(&["a", "b"]), 150.0);
        assert_eq!(ids(&commit.list), vec!["b", "a"]);
        assert_eq!(commit.to_index, 1);
    }

    #[test]
    #[should_panic(expected = "without an active drag")]
    fn test_commit_without_begin_panics() {
        let mut reorder = session();
        reorder.commit(list(&["a"]), 0.0);
    }
}
