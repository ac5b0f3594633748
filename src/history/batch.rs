use crate::image::RenderRef;
use crate::stroke::Stroke;

/// A group of strokes sharing one render outcome.
///
/// The last stroke is always the slot the next drag paints into. A freshly created
/// batch holds exactly one empty stroke. `render` is the image the batch's strokes are
/// drawn on top of: it is set on batches appended after a successful render and left
/// unset on batches that were only ever drawn into.
#[derive(Clone, Debug)]
pub struct EditBatch {
    strokes: Vec<Stroke>,
    render: Option<RenderRef>,
}

impl Default for EditBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBatch {
    pub fn new() -> Self {
        Self {
            strokes: vec![Stroke::new()],
            render: None,
        }
    }

    /// Batch appended after a successful render. `carried` holds strokes drawn while
    /// the render was in flight; an empty slot is added when none is open.
    pub(crate) fn from_render(render: RenderRef, carried: Vec<Stroke>) -> Self {
        let mut strokes = carried;
        if strokes.is_empty() {
            strokes.push(Stroke::new());
        }
        Self {
            strokes,
            render: Some(render),
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn render(&self) -> Option<&RenderRef> {
        self.render.as_ref()
    }

    /// The stroke the next drag paints into
    pub fn last_stroke(&self) -> Option<&Stroke> {
        self.strokes.last()
    }

    pub(crate) fn last_stroke_mut(&mut self) -> Option<&mut Stroke> {
        self.strokes.last_mut()
    }

    /// Strokes that carry at least one point
    pub fn completed_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().filter(|stroke| !stroke.is_empty())
    }

    pub fn has_completed_stroke(&self) -> bool {
        self.strokes.iter().any(|stroke| !stroke.is_empty())
    }

    /// Number of strokes before the trailing empty slot
    pub(crate) fn committed_len(&self) -> usize {
        match self.strokes.last() {
            Some(last) if last.is_empty() => self.strokes.len() - 1,
            _ => self.strokes.len(),
        }
    }

    pub(crate) fn push_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub(crate) fn insert_before_last(&mut self, stroke: Stroke) {
        let index = self.strokes.len().saturating_sub(1);
        self.strokes.insert(index, stroke);
    }

    /// Make sure the last stroke is an empty slot
    pub(crate) fn ensure_empty_slot(&mut self) {
        if self.strokes.last().is_none_or(|last| !last.is_empty()) {
            self.strokes.push(Stroke::new());
        }
    }

    /// Remove every stroke from index `from` on
    pub(crate) fn split_off(&mut self, from: usize) -> Vec<Stroke> {
        if from >= self.strokes.len() {
            return Vec::new();
        }
        self.strokes.split_off(from)
    }

    /// Replace the final stroke with an empty slot
    pub(crate) fn reset_last_stroke(&mut self) {
        match self.strokes.last_mut() {
            Some(last) => *last = Stroke::new(),
            None => self.strokes.push(Stroke::new()),
        }
    }

    /// Remove the most recent completed stroke, leaving a single empty slot at the end.
    /// Returns false when there was no completed stroke to remove.
    pub(crate) fn remove_last_completed_stroke(&mut self) -> bool {
        self.strokes.retain(|stroke| !stroke.is_empty());
        let removed = self.strokes.pop().is_some();
        self.strokes.push(Stroke::new());
        removed
    }
}
