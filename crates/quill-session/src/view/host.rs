//! Attachment point for the editable view.

use tracing::error;

use super::ViewId;

/// The element the editable view is mounted into.
///
/// Availability is transient: a host may disappear and come back between
/// state changes, so callers retry on the next change instead of failing.
pub trait ViewHost {
    fn is_available(&self) -> bool;

    fn attach(&mut self, view: ViewId);

    fn detach(&mut self, view: ViewId);

    /// Shows the "no open tabs" screen.
    fn show_placeholder(&mut self);

    fn hide_placeholder(&mut self);

    /// Moves input focus to the attached view.
    fn focus(&mut self, view: ViewId);
}

/// In-memory host that records what is mounted.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    available: bool,
    attached: Option<ViewId>,
    placeholder: bool,
    attach_count: u64,
    overlapping_attachments: u64,
    focus_requests: u64,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            available: true,
            attached: None,
            placeholder: false,
            attach_count: 0,
            overlapping_attachments: 0,
            focus_requests: 0,
        }
    }

    /// Simulates the host element going away or coming back.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn attached(&self) -> Option<ViewId> {
        self.attached
    }

    pub fn placeholder_visible(&self) -> bool {
        self.placeholder
    }

    pub fn attach_count(&self) -> u64 {
        self.attach_count
    }

    /// Attachments made while another view was still mounted.
    pub fn overlapping_attachments(&self) -> u64 {
        self.overlapping_attachments
    }

    pub fn focus_requests(&self) -> u64 {
        self.focus_requests
    }
}

impl ViewHost for HeadlessHost {
    fn is_available(&self) -> bool {
        self.available
    }

    fn attach(&mut self, view: ViewId) {
        if let Some(previous) = self.attached {
            error!("View {view} attached while {previous} is still mounted");
            self.overlapping_attachments += 1;
        }
        self.attached = Some(view);
        self.attach_count += 1;
    }

    fn detach(&mut self, view: ViewId) {
        if self.attached == Some(view) {
            self.attached = None;
        }
    }

    fn show_placeholder(&mut self) {
        self.placeholder = true;
    }

    fn hide_placeholder(&mut self) {
        self.placeholder = false;
    }

    fn focus(&mut self, _view: ViewId) {
        self.focus_requests += 1;
    }
}
