//! Log viewport controller
//!
//! A [`LogBuffer`] holds the latest log text for one resource plus where the
//! operator is looking in it. Position is kept as a fraction of the
//! scrollable range rather than a line offset, so it survives rewrapping.

use tracing::trace;

use crate::model::ResourceId;

/// Previous position at or past this fraction sticks to the bottom on apply
pub const STICKY_BOTTOM: f64 = 0.90;

#[derive(Clone, Debug, PartialEq)]
pub struct LogBuffer {
    pub resource_id: ResourceId,
    pub name: String,
    content: String,
    lines: Vec<String>,
    width: u16,
    height: u16,
    scroll_fraction: f64,
    follow_mode: bool,
    loaded: bool,
    error: Option<String>,
}

impl LogBuffer {
    pub fn new(resource_id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            name: name.into(),
            content: String::new(),
            lines: Vec::new(),
            width: 0,
            height: 0,
            scroll_fraction: 1.0,
            follow_mode: true,
            loaded: false,
            error: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Wrapped lines for the current width
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll_fraction(&self) -> f64 {
        self.scroll_fraction
    }

    pub fn follow_mode(&self) -> bool {
        self.follow_mode
    }

    /// Whether any fetch has landed yet
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Resize the viewport. Lines are rewrapped only when the width changes.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.height = height;
        if width != self.width {
            self.width = width;
            self.lines = wrap(&self.content, width);
        }
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    /// First visible wrapped line
    pub fn offset(&self) -> usize {
        let max = self.max_offset();
        (self.scroll_fraction * max as f64).round() as usize
    }

    /// Slice of wrapped lines currently on screen
    pub fn visible(&self) -> &[String] {
        let start = self.offset().min(self.lines.len());
        let end = (start + self.height as usize).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn percent(&self) -> u16 {
        (self.scroll_fraction * 100.0).round() as u16
    }

    /// Move by `delta` wrapped lines. Leaving the bottom drops follow mode;
    /// reaching it again picks follow mode back up.
    pub fn scroll_lines(&mut self, delta: isize) {
        let max = self.max_offset();
        if max == 0 {
            self.scroll_fraction = 1.0;
            return;
        }
        let next = (self.offset() as isize + delta).clamp(0, max as isize) as usize;
        self.scroll_fraction = next as f64 / max as f64;
        self.follow_mode = next == max;
    }

    pub fn page_up(&mut self) {
        self.scroll_lines(-(self.height.max(1) as isize));
    }

    pub fn page_down(&mut self) {
        self.scroll_lines(self.height.max(1) as isize);
    }

    pub fn scroll_to_top(&mut self) {
        if self.max_offset() == 0 {
            return;
        }
        self.scroll_fraction = 0.0;
        self.follow_mode = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_fraction = 1.0;
        self.follow_mode = true;
    }

    pub fn toggle_follow(&mut self) {
        self.follow_mode = !self.follow_mode;
        if self.follow_mode {
            self.scroll_fraction = 1.0;
        }
    }
}

/// Replace the buffer's content with a fresh fetch.
///
/// Following, or having been near the bottom, pins the view to the bottom;
/// any other position is kept as-is.
pub fn apply(mut buffer: LogBuffer, new_content: String) -> LogBuffer {
    if buffer.follow_mode || buffer.scroll_fraction >= STICKY_BOTTOM {
        buffer.scroll_fraction = 1.0;
    }
    buffer.lines = wrap(&new_content, buffer.width);
    buffer.content = new_content;
    buffer.loaded = true;
    buffer.error = None;
    trace!(
        id = %buffer.resource_id,
        lines = buffer.lines.len(),
        fraction = buffer.scroll_fraction,
        "applied log content"
    );
    buffer
}

/// Split `content` into display lines no wider than `width` columns.
///
/// Width 0 means the viewport has not been measured yet; lines are returned
/// unwrapped.
pub fn wrap(content: &str, width: u16) -> Vec<String> {
    let mut out = Vec::new();
    for line in content.lines() {
        if width == 0 || line.is_empty() {
            out.push(line.to_string());
            continue;
        }
        out.extend(
            textwrap::wrap(line, width as usize)
                .into_iter()
                .map(|part| part.into_owned()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> String {
        (1..=count)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn buffer(lines: usize, height: u16) -> LogBuffer {
        let mut buffer = LogBuffer::new("abc", "web");
        buffer.resize(80, height);
        apply(buffer, numbered(lines))
    }

    #[test]
    fn test_new_buffer_follows() {
        let buffer = LogBuffer::new("abc", "web");
        assert!(buffer.follow_mode());
        assert_eq!(buffer.scroll_fraction(), 1.0);
        assert!(!buffer.is_loaded());
    }

    #[test]
    fn test_apply_in_follow_mode_pins_bottom() {
        let mut buffer = buffer(100, 10);
        buffer.scroll_fraction = 0.2;
        buffer.follow_mode = true;
        let buffer = apply(buffer, numbered(150));
        assert_eq!(buffer.scroll_fraction(), 1.0);
        assert_eq!(buffer.offset(), 140);
    }

    #[test]
    fn test_apply_keeps_position_when_not_following() {
        let mut buffer = buffer(100, 10);
        buffer.follow_mode = false;
        buffer.scroll_fraction = 0.3;
        let buffer = apply(buffer, numbered(120));
        assert_eq!(buffer.scroll_fraction(), 0.3);
        assert!(!buffer.follow_mode());
    }

    #[test]
    fn test_apply_near_bottom_sticks() {
        let mut buffer = buffer(100, 10);
        buffer.follow_mode = false;
        buffer.scroll_fraction = 0.95;
        let buffer = apply(buffer, numbered(120));
        assert_eq!(buffer.scroll_fraction(), 1.0);
    }

    #[test]
    fn test_apply_clears_error() {
        let mut buffer = buffer(5, 10);
        buffer.set_error("connection reset");
        let buffer = apply(buffer, numbered(5));
        assert_eq!(buffer.error(), None);
    }

    #[test]
    fn test_scroll_up_leaves_follow_and_back_down_resumes() {
        let mut buffer = buffer(30, 10);
        assert_eq!(buffer.offset(), 20);

        buffer.scroll_lines(-5);
        assert!(!buffer.follow_mode());
        assert_eq!(buffer.offset(), 15);
        assert_eq!(buffer.percent(), 75);

        buffer.scroll_lines(100);
        assert!(buffer.follow_mode());
        assert_eq!(buffer.offset(), 20);
    }

    #[test]
    fn test_scroll_clamps_at_top() {
        let mut buffer = buffer(30, 10);
        buffer.scroll_lines(-100);
        assert_eq!(buffer.offset(), 0);
        assert_eq!(buffer.scroll_fraction(), 0.0);
        assert_eq!(buffer.visible()[0], "line 1");
    }

    #[test]
    fn test_short_content_stays_at_full() {
        let mut buffer = buffer(3, 10);
        buffer.scroll_lines(-1);
        assert_eq!(buffer.percent(), 100);
        assert_eq!(buffer.visible().len(), 3);
        buffer.scroll_to_top();
        assert!(buffer.follow_mode());
    }

    #[test]
    fn test_toggle_follow_jumps_to_bottom() {
        let mut buffer = buffer(30, 10);
        buffer.scroll_to_top();
        assert!(!buffer.follow_mode());
        buffer.toggle_follow();
        assert!(buffer.follow_mode());
        assert_eq!(buffer.offset(), 20);
        buffer.toggle_follow();
        assert!(!buffer.follow_mode());
        assert_eq!(buffer.offset(), 20);
    }

    #[test]
    fn test_wrap_is_width_bound() {
        let lines = wrap("alpha beta gamma delta\n\nshort", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta", "", "short"]);
        assert!(lines.iter().all(|l| l.len() <= 11));
    }

    #[test]
    fn test_wrap_zero_width_passes_through() {
        assert_eq!(wrap("one\ntwo", 0), vec!["one", "two"]);
        assert!(wrap("", 40).is_empty());
    }

    #[test]
    fn test_resize_rewraps() {
        let mut buffer = LogBuffer::new("abc", "web");
        buffer = apply(buffer, "aaaa bbbb cccc".to_string());
        assert_eq!(buffer.lines().len(), 1);
        buffer.resize(4, 5);
        assert_eq!(buffer.lines(), &["aaaa", "bbbb", "cccc"]);
    }
}
