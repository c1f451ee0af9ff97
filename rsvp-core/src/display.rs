use crate::error::SessionError;
use crate::stimulus::StimulusParams;

/// Draws stream items. `draw_frame` blocks for exactly one refresh interval.
pub trait StimulusRenderer {
    /// Show a fixation symbol (`+` before the stream, end marker after it).
    fn show_fixation(&mut self, symbol: &str) -> Result<(), SessionError>;

    /// Select the item drawn by subsequent `draw_frame` calls.
    fn set_item(&mut self, label: &str, stimulus: &StimulusParams);

    fn draw_frame(&mut self) -> Result<(), SessionError>;

    fn clear(&mut self) -> Result<(), SessionError>;
}

impl<R: StimulusRenderer + ?Sized> StimulusRenderer for &mut R {
    fn show_fixation(&mut self, symbol: &str) -> Result<(), SessionError> {
        (**self).show_fixation(symbol)
    }

    fn set_item(&mut self, label: &str, stimulus: &StimulusParams) {
        (**self).set_item(label, stimulus)
    }

    fn draw_frame(&mut self) -> Result<(), SessionError> {
        (**self).draw_frame()
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        (**self).clear()
    }
}
