//! Text display trait

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with the display controller
    Communication,
    /// Display not initialized
    NotInitialized,
}

/// Trait for a buffered text display
///
/// Drawing only touches the frame buffer; nothing reaches the panel until
/// [`show`](TextDisplay::show) is called.
pub trait TextDisplay {
    /// Clear the frame buffer
    fn clear(&mut self);

    /// Draw text with its top-left corner at pixel (`x`, `y`)
    ///
    /// `scale` selects the font size: 1 is the small font, 2 and above the
    /// large one. Text running off the panel is clipped.
    fn draw_text(&mut self, x: i32, y: i32, scale: u8, text: &str);

    /// Flush the frame buffer to the panel
    fn show(&mut self) -> Result<(), DisplayError>;
}
