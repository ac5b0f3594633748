mod batch;
mod undo;

use egui::Pos2;

use crate::image::RenderRef;
use crate::state::ResolutionMode;
use crate::stroke::Stroke;

pub use batch::EditBatch;
pub use undo::UndoOutcome;

/// Position in the history captured when a render is triggered.
///
/// Strokes at or beyond this position in the marked batch were not part of the mask
/// submitted for that render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryMarker {
    pub batch: usize,
    pub strokes: usize,
}

/// Ordered sequence of edit batches; the mutable core state of an editing session.
///
/// Never empty: it starts with one batch holding one empty stroke and returns to that
/// state on `reset`. Only the last batch accepts new strokes.
#[derive(Clone, Debug)]
pub struct EditHistory {
    batches: Vec<EditBatch>,
    /// True between `begin_stroke` and `end_stroke`
    stroke_open: bool,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    pub fn new() -> Self {
        Self {
            batches: vec![EditBatch::new()],
            stroke_open: false,
        }
    }

    /// Drop every edit and return to a single empty batch
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn batches(&self) -> &[EditBatch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True when the history holds no batch. Never the case for a constructed history.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The last batch, the only one new strokes go into
    pub fn current_editable(&self) -> &EditBatch {
        // The constructor and every mutation keep at least one batch
        &self.batches[self.batches.len() - 1]
    }

    fn current_mut(&mut self) -> &mut EditBatch {
        let last = self.batches.len() - 1;
        &mut self.batches[last]
    }

    pub fn is_stroke_open(&self) -> bool {
        self.stroke_open
    }

    /// True for a single batch holding nothing but one empty stroke
    pub fn is_initial(&self) -> bool {
        self.batches.len() == 1
            && self.batches[0].render().is_none()
            && self.batches[0].strokes().len() == 1
            && self.batches[0].strokes()[0].is_empty()
    }

    /// Every stroke of every batch, in drawing order
    pub fn all_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.batches.iter().flat_map(|batch| batch.strokes().iter())
    }

    /// Total number of strokes carrying at least one point
    pub fn completed_stroke_count(&self) -> usize {
        self.batches
            .iter()
            .map(|batch| batch.completed_strokes().count())
            .sum()
    }

    /// Most recent render and the index of the batch holding it
    pub fn latest_render(&self) -> Option<(usize, &RenderRef)> {
        self.batches
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, batch)| batch.render().map(|render| (index, render)))
    }

    /// Open a new stroke of the given width in the current batch.
    ///
    /// In standard mode a batch holds one stroke's worth of work: when the current
    /// batch already has a completed stroke and no render is pending, a new batch is
    /// started first. The empty slot at the end of the batch is reused; otherwise a
    /// new empty stroke is appended.
    pub fn begin_stroke(&mut self, width: f32, mode: ResolutionMode, render_pending: bool) {
        if mode == ResolutionMode::Standard
            && !render_pending
            && self.current_editable().has_completed_stroke()
        {
            self.batches.push(EditBatch::new());
        }

        let batch = self.current_mut();
        batch.ensure_empty_slot();
        if let Some(stroke) = batch.last_stroke_mut() {
            stroke.set_width(width);
        }
        self.stroke_open = true;
    }

    /// Append an image-space point to the open stroke. No-op when no stroke is open.
    pub fn append_point(&mut self, point: Pos2) -> bool {
        if !self.stroke_open {
            return false;
        }
        match self.current_mut().last_stroke_mut() {
            Some(stroke) => {
                stroke.add_point(point);
                true
            }
            None => false,
        }
    }

    /// Close the open stroke. Returns true when it left a mark.
    pub fn end_stroke(&mut self) -> bool {
        if !self.stroke_open {
            return false;
        }
        self.stroke_open = false;
        self.current_editable()
            .last_stroke()
            .is_some_and(|stroke| !stroke.is_empty())
    }

    /// Add an empty slot to the current batch so the next drag starts a new stroke
    pub fn push_empty_stroke(&mut self) {
        self.current_mut().push_stroke(Stroke::new());
    }

    /// Capture the current position for a render being triggered
    pub fn marker(&self) -> HistoryMarker {
        HistoryMarker {
            batch: self.batches.len() - 1,
            strokes: self.current_editable().committed_len(),
        }
    }

    /// Append the batch produced by a successful render.
    ///
    /// Strokes completed after `marker` was taken were not in the submitted mask; they
    /// move into the new batch so they stay pending on top of the result.
    pub fn append_render(&mut self, render: RenderRef, marker: HistoryMarker) {
        let mut carried = if marker.batch + 1 == self.batches.len() {
            self.current_mut().split_off(marker.strokes)
        } else {
            Vec::new()
        };

        let open = if self.stroke_open { carried.pop() } else { None };
        carried.retain(|stroke| !stroke.is_empty());
        match open {
            Some(stroke) => carried.push(stroke),
            None => {
                // The open stroke predates the marker and stays behind; nothing to continue
                self.stroke_open = false;
                carried.push(Stroke::new());
            }
        }

        // The marked batch may have been left without a trailing slot by split_off
        if let Some(batch) = self.batches.get_mut(marker.batch) {
            if batch.strokes().is_empty() {
                batch.push_stroke(Stroke::new());
            }
        }

        self.batches.push(EditBatch::from_render(render, carried));
    }

    /// Record a failed render: the current batch ends with a fresh empty stroke so the
    /// next drag does not connect to the one that was just submitted. A trailing empty
    /// slot that is already there serves as that stroke; no second one is added.
    pub fn mark_render_failed(&mut self) {
        let stroke_open = self.stroke_open;
        let batch = self.current_mut();
        if stroke_open {
            batch.insert_before_last(Stroke::new());
        } else if batch.last_stroke().is_some_and(|stroke| !stroke.is_empty()) {
            batch.push_stroke(Stroke::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn draw(history: &mut EditHistory, mode: ResolutionMode, x: f32) {
        history.begin_stroke(10.0, mode, false);
        history.append_point(pos2(x, x));
        history.append_point(pos2(x + 5.0, x));
        history.end_stroke();
    }

    #[test]
    fn test_new_history_is_initial() {
        let history = EditHistory::new();
        assert!(history.is_initial());
        assert_eq!(history.len(), 1);
        assert_eq!(history.completed_stroke_count(), 0);
    }

    #[test]
    fn test_append_point_without_open_stroke_is_noop() {
        let mut history = EditHistory::new();
        assert!(!history.append_point(pos2(1.0, 1.0)));
        assert!(history.is_initial());
    }

    #[test]
    fn test_hd_strokes_share_a_batch() {
        let mut history = EditHistory::new();
        for i in 0..3 {
            draw(&mut history, ResolutionMode::Hd, i as f32 * 10.0);
            history.push_empty_stroke();
        }
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_editable().completed_strokes().count(), 3);
        assert_eq!(history.current_editable().strokes().len(), 4);
    }

    #[test]
    fn test_standard_stroke_opens_new_batch() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 0.0);
        history.push_empty_stroke();
        assert_eq!(history.len(), 1);

        draw(&mut history, ResolutionMode::Standard, 20.0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.batches()[1].completed_strokes().count(), 1);
    }

    #[test]
    fn test_standard_stroke_stays_while_render_pending() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 0.0);
        history.begin_stroke(10.0, ResolutionMode::Standard, true);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_editable().strokes().len(), 2);
    }

    #[test]
    fn test_stroke_width_is_fixed_at_begin() {
        let mut history = EditHistory::new();
        history.begin_stroke(25.0, ResolutionMode::Hd, false);
        history.append_point(pos2(1.0, 2.0));
        assert!(history.end_stroke());
        let stroke = history.current_editable().last_stroke().unwrap();
        assert_eq!(stroke.width(), Some(25.0));
        assert_eq!(stroke.points(), &[pos2(1.0, 2.0)]);
    }

    #[test]
    fn test_append_render_carries_late_strokes() {
        use crate::image::RenderedImage;
        use image::RgbaImage;

        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Hd, 0.0);
        history.push_empty_stroke();
        let marker = history.marker();
        assert_eq!(marker, HistoryMarker { batch: 0, strokes: 1 });

        // Drawn while the render is in flight
        draw(&mut history, ResolutionMode::Hd, 40.0);
        history.push_empty_stroke();

        history.append_render(RenderedImage::new_ref(RgbaImage::new(4, 4)), marker);
        assert_eq!(history.len(), 2);
        assert_eq!(history.batches()[0].completed_strokes().count(), 1);
        assert!(history.batches()[0].render().is_none());

        let latest = &history.batches()[1];
        assert!(latest.render().is_some());
        assert_eq!(latest.completed_strokes().count(), 1);
        assert!(latest.last_stroke().unwrap().is_empty());
        assert_eq!(history.latest_render().map(|(index, _)| index), Some(1));
    }

    #[test]
    fn test_render_failure_adds_one_empty_stroke() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 0.0);
        assert_eq!(history.current_editable().strokes().len(), 1);
        history.mark_render_failed();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_editable().strokes().len(), 2);
        assert!(history.current_editable().last_stroke().unwrap().is_empty());
    }

    #[test]
    fn test_render_failure_reuses_trailing_empty_slot() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Hd, 0.0);
        history.push_empty_stroke();
        assert_eq!(history.current_editable().strokes().len(), 2);

        history.mark_render_failed();
        let strokes = history.current_editable().strokes();
        assert_eq!(strokes.len(), 2);
        assert!(strokes[1].is_empty());
        assert_eq!(history.completed_stroke_count(), 1);
    }

    #[test]
    fn test_render_failure_during_drag_keeps_drag_open() {
        let mut history = EditHistory::new();
        history.begin_stroke(10.0, ResolutionMode::Hd, true);
        history.append_point(pos2(1.0, 1.0));
        history.mark_render_failed();

        // The open drag stays last and keeps receiving points
        assert!(history.append_point(pos2(2.0, 2.0)));
        let strokes = history.current_editable().strokes();
        assert_eq!(strokes.len(), 2);
        assert!(strokes[0].is_empty());
        assert_eq!(strokes[1].points().len(), 2);
    }
}
