//! Focus bookkeeping shared between the browser side and the server.
//!
//! Focus changes made by the user are numbered with a monotonically
//! increasing event id and echoed to the server. A frame may carry the
//! server's view of focus; it is adopted only when its event id is newer than
//! the last one committed here, so a stale server never steals focus back.

use crate::identity::CellId;

#[derive(Debug, Default, Clone)]
pub struct FocusState {
    committed_event_id: u64,
    processing_frame: bool,
    focused: Option<CellId>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed_event_id(&self) -> u64 {
        self.committed_event_id
    }

    pub fn focused(&self) -> Option<&CellId> {
        self.focused.as_ref()
    }

    pub fn is_processing_frame(&self) -> bool {
        self.processing_frame
    }

    pub(crate) fn begin_frame(&mut self) {
        self.processing_frame = true;
    }

    pub(crate) fn end_frame(&mut self) {
        self.processing_frame = false;
    }

    /// Record that `cell` took focus. Returns the event id to report, or
    /// `None` while a frame is being applied (focus moves caused by the
    /// server are not echoed back).
    pub fn receive_focus(&mut self, cell: &CellId) -> Option<u64> {
        if self.processing_frame {
            return None;
        }
        self.committed_event_id += 1;
        self.focused = Some(cell.clone());
        Some(self.committed_event_id)
    }

    /// Adopt the server's focused cell if its event is newer than ours.
    pub fn adopt_server_focus(&mut self, cell: Option<&CellId>, event_id: Option<u64>) -> bool {
        match event_id {
            Some(event_id) if event_id > self.committed_event_id => {
                self.committed_event_id = event_id;
                self.focused = cell.cloned();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_server_focus_is_ignored() {
        let mut focus = FocusState::new();
        let a = CellId::from("a");
        let b = CellId::from("b");

        assert_eq!(focus.receive_focus(&a), Some(1));
        assert_eq!(focus.receive_focus(&a), Some(2));
        assert!(!focus.adopt_server_focus(Some(&b), Some(2)));
        assert_eq!(focus.focused(), Some(&a));

        assert!(focus.adopt_server_focus(Some(&b), Some(5)));
        assert_eq!(focus.focused(), Some(&b));
        assert_eq!(focus.committed_event_id(), 5);
    }

    #[test]
    fn focus_inside_a_frame_is_not_echoed() {
        let mut focus = FocusState::new();
        focus.begin_frame();
        assert_eq!(focus.receive_focus(&CellId::from("a")), None);
        focus.end_frame();
        assert_eq!(focus.focused(), None);
        assert_eq!(focus.committed_event_id(), 0);
    }
}
