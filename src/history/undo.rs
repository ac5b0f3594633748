use super::EditHistory;
use crate::state::ResolutionMode;

/// What a single undo press removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Coarse undo: the last batch (one render's worth of work) was dropped
    RemovedBatch,
    /// Fine undo: the most recent brush stroke was dropped
    RemovedStroke,
    /// History was already back at its initial state
    NothingToUndo,
}

impl EditHistory {
    /// True when an undo press would change anything
    pub fn can_undo(&self) -> bool {
        self.len() > 1 || self.current_editable().has_completed_stroke()
    }

    /// Remove the most recent undoable unit.
    ///
    /// Rules, in order:
    /// 1. Standard mode without `force_batch`, more than one batch: drop the last batch
    ///    and clear the final stroke of the batch before it.
    /// 2. The last batch has more than one stroke, or standard mode: drop its most
    ///    recent completed stroke.
    /// 3. More than one batch: drop the last batch.
    /// 4. Otherwise nothing is left to undo.
    ///
    /// A rule that finds nothing to remove falls through to the next one, so repeated
    /// calls always end at the initial single empty batch.
    pub fn undo(&mut self, mode: ResolutionMode, force_batch: bool) -> UndoOutcome {
        let standard = mode == ResolutionMode::Standard;
        self.stroke_open = false;

        if standard && !force_batch && self.batches.len() > 1 {
            self.batches.pop();
            self.current_mut().reset_last_stroke();
            return UndoOutcome::RemovedBatch;
        }

        if (self.current_editable().strokes().len() > 1 || standard)
            && self.current_mut().remove_last_completed_stroke()
        {
            return UndoOutcome::RemovedStroke;
        }

        if self.batches.len() > 1 {
            self.batches.pop();
            self.current_mut().ensure_empty_slot();
            return UndoOutcome::RemovedBatch;
        }

        // The last completed stroke of a lone batch without a slot
        if self.current_mut().remove_last_completed_stroke() {
            return UndoOutcome::RemovedStroke;
        }

        log::debug!("Nothing to undo");
        UndoOutcome::NothingToUndo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RenderedImage;
    use egui::pos2;
    use image::RgbaImage;

    fn draw(history: &mut EditHistory, mode: ResolutionMode, x: f32) {
        history.begin_stroke(8.0, mode, false);
        history.append_point(pos2(x, x));
        history.end_stroke();
    }

    fn render(history: &mut EditHistory) {
        let marker = history.marker();
        history.append_render(RenderedImage::new_ref(RgbaImage::new(2, 2)), marker);
    }

    #[test]
    fn test_standard_undo_drops_rendered_batch() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 1.0);
        render(&mut history);
        draw(&mut history, ResolutionMode::Standard, 2.0);
        render(&mut history);
        assert_eq!(history.len(), 3);

        assert_eq!(history.undo(ResolutionMode::Standard, false), UndoOutcome::RemovedBatch);
        assert_eq!(history.len(), 2);
        assert!(!history.current_editable().has_completed_stroke());
        assert!(history.current_editable().render().is_some());

        assert_eq!(history.undo(ResolutionMode::Standard, false), UndoOutcome::RemovedBatch);
        assert!(history.is_initial());
        assert!(!history.can_undo());
        assert_eq!(history.undo(ResolutionMode::Standard, false), UndoOutcome::NothingToUndo);
    }

    #[test]
    fn test_hd_undo_is_stroke_by_stroke() {
        let mut history = EditHistory::new();
        for i in 0..3 {
            draw(&mut history, ResolutionMode::Hd, i as f32);
            history.push_empty_stroke();
        }
        assert_eq!(history.undo(ResolutionMode::Hd, false), UndoOutcome::RemovedStroke);
        assert_eq!(history.current_editable().completed_strokes().count(), 2);
        assert!(history.current_editable().last_stroke().unwrap().is_empty());
    }

    #[test]
    fn test_hd_undo_falls_back_to_batch() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Hd, 1.0);
        history.push_empty_stroke();
        render(&mut history);
        assert_eq!(history.len(), 2);

        assert_eq!(history.undo(ResolutionMode::Hd, false), UndoOutcome::RemovedBatch);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_editable().completed_strokes().count(), 1);

        assert_eq!(history.undo(ResolutionMode::Hd, false), UndoOutcome::RemovedStroke);
        assert!(history.is_initial());
    }

    #[test]
    fn test_forced_batch_undo_in_standard_removes_strokes_first() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 1.0);
        history.push_empty_stroke();
        draw(&mut history, ResolutionMode::Standard, 2.0);
        history.push_empty_stroke();
        assert_eq!(history.len(), 2);

        assert_eq!(history.undo(ResolutionMode::Standard, true), UndoOutcome::RemovedStroke);
        assert_eq!(history.len(), 2);
        assert!(!history.current_editable().has_completed_stroke());

        assert_eq!(history.undo(ResolutionMode::Standard, true), UndoOutcome::RemovedBatch);
        assert_eq!(history.undo(ResolutionMode::Standard, true), UndoOutcome::RemovedStroke);
        assert!(history.is_initial());
    }

    #[test]
    fn test_single_batch_standard_undo_reaches_initial() {
        let mut history = EditHistory::new();
        draw(&mut history, ResolutionMode::Standard, 1.0);
        history.mark_render_failed();
        assert!(history.can_undo());
        assert_eq!(history.undo(ResolutionMode::Standard, false), UndoOutcome::RemovedStroke);
        assert!(history.is_initial());
    }
}
