//! Percentage scroll mirroring between the editor and viewer panes
//!
//! Every programmatic scroll carries a generation number. The pane tags the
//! movement it observes after applying a command with that generation, and the
//! coordinator ignores tagged reports, so a mirrored scroll never bounces back
//! to the pane that started it.

/// One of the two synchronized panes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Editor,
    Viewer,
}

impl Pane {
    pub fn other(self) -> Self {
        match self {
            Self::Editor => Self::Viewer,
            Self::Viewer => Self::Editor,
        }
    }
}

/// Identifies one programmatic scroll command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScrollGeneration(u64);

/// A pane that can be told where to scroll
pub trait ScrollTarget {
    fn scroll_to_percentage(&mut self, percentage: f32, generation: ScrollGeneration);
}

/// A scroll position observed on a pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollReport {
    pub pane: Pane,
    pub percentage: f32,
    /// Set when the movement came from a programmatic command
    pub generation: Option<ScrollGeneration>,
}

/// `scroll_top / (scroll_height - client_height)`, clamped to `[0, 1]`
pub fn scroll_percentage(scroll_top: f32, scroll_height: f32, client_height: f32) -> f32 {
    let max_scroll = scroll_height - client_height;
    if max_scroll <= 0.0 || !scroll_top.is_finite() {
        return 0.0;
    }
    (scroll_top / max_scroll).clamp(0.0, 1.0)
}

/// Mirrors user scrolling from one pane onto the other
#[derive(Debug, Default)]
pub struct ScrollSyncCoordinator {
    active: bool,
    generation: u64,
}

impl ScrollSyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync runs only while both panes are visible
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handle a scroll on `report.pane`, commanding `other` (the opposite pane).
    /// Returns whether a command was issued.
    pub fn on_scroll(&mut self, report: ScrollReport, other: &mut dyn ScrollTarget) -> bool {
        if !self.active {
            return false;
        }

        if let Some(generation) = report.generation {
            if generation.0 <= self.generation {
                // Echo of our own command
                return false;
            }
        }

        self.generation += 1;
        tracing::trace!(
            "Mirroring {:?} scroll {:.3} to {:?}",
            report.pane,
            report.percentage,
            report.pane.other()
        );
        other.scroll_to_percentage(report.percentage.clamp(0.0, 1.0), ScrollGeneration(self.generation));
        true
    }
}

/// Scroll bookkeeping for one pane, independent of the UI toolkit.
///
/// The pane takes pending commands before laying out, then reports the offset
/// it ended up at; movement caused by a command is tagged with its generation.
#[derive(Debug, Default)]
pub struct PaneScrollState {
    pending: Option<(f32, Option<ScrollGeneration>)>,
    applied: Option<ScrollGeneration>,
    last_percentage: Option<f32>,
}

const MOVEMENT_EPSILON: f32 = 0.0005;

impl PaneScrollState {
    /// Jump as if the user had scrolled (anchor links, search hits)
    pub fn jump_to(&mut self, percentage: f32) {
        self.pending = Some((percentage.clamp(0.0, 1.0), None));
    }

    /// The command to apply this frame, if any
    pub fn take_command(&mut self) -> Option<f32> {
        let (percentage, generation) = self.pending.take()?;
        self.applied = generation;
        Some(percentage)
    }

    /// Record where the pane is now; returns a report when it moved
    pub fn observe(&mut self, pane: Pane, percentage: f32) -> Option<ScrollReport> {
        let generation = self.applied.take();
        let moved = self
            .last_percentage
            .map_or(true, |last| (last - percentage).abs() > MOVEMENT_EPSILON);
        let first_observation = self.last_percentage.is_none();
        self.last_percentage = Some(percentage);

        if !moved || (first_observation && generation.is_none()) {
            return None;
        }

        Some(ScrollReport {
            pane,
            percentage,
            generation,
        })
    }

    /// Forget the last position, e.g. after a new document is shown
    pub fn reset(&mut self) {
        self.pending = None;
        self.applied = None;
        self.last_percentage = None;
    }
}

impl ScrollTarget for PaneScrollState {
    fn scroll_to_percentage(&mut self, percentage: f32, generation: ScrollGeneration) {
        self.pending = Some((percentage, Some(generation)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPane {
        calls: Vec<(f32, ScrollGeneration)>,
    }

    impl ScrollTarget for RecordingPane {
        fn scroll_to_percentage(&mut self, percentage: f32, generation: ScrollGeneration) {
            self.calls.push((percentage, generation));
        }
    }

    fn user_scroll(pane: Pane, percentage: f32) -> ScrollReport {
        ScrollReport {
            pane,
            percentage,
            generation: None,
        }
    }

    #[test]
    fn test_scroll_percentage() {
        assert_eq!(scroll_percentage(250.0, 1100.0, 100.0), 0.25);
        assert_eq!(scroll_percentage(2000.0, 1100.0, 100.0), 1.0);
        assert_eq!(scroll_percentage(-5.0, 1100.0, 100.0), 0.0);
        assert_eq!(scroll_percentage(0.0, 100.0, 100.0), 0.0);
    }

    #[test]
    fn test_viewer_scroll_mirrors_once_without_echo() {
        let mut coordinator = ScrollSyncCoordinator::new();
        coordinator.set_active(true);
        let mut editor = RecordingPane::default();
        let mut viewer = RecordingPane::default();

        assert!(coordinator.on_scroll(user_scroll(Pane::Viewer, 0.4), &mut editor));
        assert_eq!(editor.calls.len(), 1);
        let (percentage, generation) = editor.calls[0];
        assert_eq!(percentage, 0.4);

        // The editor reports the movement the command caused
        let echo = ScrollReport {
            pane: Pane::Editor,
            percentage: 0.4,
            generation: Some(generation),
        };
        assert!(!coordinator.on_scroll(echo, &mut viewer));
        assert!(viewer.calls.is_empty());
    }

    #[test]
    fn test_both_directions_mirror_user_scrolls() {
        let mut coordinator = ScrollSyncCoordinator::new();
        coordinator.set_active(true);
        let mut editor = RecordingPane::default();
        let mut viewer = RecordingPane::default();

        coordinator.on_scroll(user_scroll(Pane::Viewer, 0.1), &mut editor);
        coordinator.on_scroll(user_scroll(Pane::Editor, 0.9), &mut viewer);

        assert_eq!(editor.calls.len(), 1);
        assert_eq!(viewer.calls.len(), 1);
        assert!(viewer.calls[0].1 > editor.calls[0].1);
    }

    #[test]
    fn test_inactive_coordinator_does_nothing() {
        let mut coordinator = ScrollSyncCoordinator::new();
        let mut editor = RecordingPane::default();
        assert!(!coordinator.on_scroll(user_scroll(Pane::Viewer, 0.5), &mut editor));
        assert!(editor.calls.is_empty());
    }

    #[test]
    fn test_pane_state_tags_commanded_movement() {
        let mut coordinator = ScrollSyncCoordinator::new();
        coordinator.set_active(true);
        let mut editor = PaneScrollState::default();
        let mut viewer = PaneScrollState::default();

        // Initial layout establishes positions without reporting
        assert_eq!(editor.observe(Pane::Editor, 0.0), None);
        assert_eq!(viewer.observe(Pane::Viewer, 0.0), None);

        // User scrolls the viewer
        let report = viewer.observe(Pane::Viewer, 0.3).unwrap();
        assert!(coordinator.on_scroll(report, &mut editor));

        // Editor applies the command and reports the tagged movement
        assert_eq!(editor.take_command(), Some(0.3));
        let echo = editor.observe(Pane::Editor, 0.3).unwrap();
        assert!(echo.generation.is_some());
        assert!(!coordinator.on_scroll(echo, &mut viewer));
        assert_eq!(viewer.take_command(), None);

        // Later user movement on the editor is mirrored again
        let report = editor.observe(Pane::Editor, 0.5).unwrap();
        assert_eq!(report.generation, None);
        assert!(coordinator.on_scroll(report, &mut viewer));
        assert_eq!(viewer.take_command(), Some(0.5));
    }

    #[test]
    fn test_jump_is_reported_as_user_movement() {
        let mut pane = PaneScrollState::default();
        pane.observe(Pane::Viewer, 0.0);
        pane.jump_to(0.75);
        assert_eq!(pane.take_command(), Some(0.75));
        let report = pane.observe(Pane::Viewer, 0.75).unwrap();
        assert_eq!(report.generation, None);
    }

    #[test]
    fn test_unmoved_pane_reports_nothing() {
        let mut pane = PaneScrollState::default();
        pane.observe(Pane::Editor, 0.2);
        assert_eq!(pane.observe(Pane::Editor, 0.2), None);
    }
}
