use crate::types::Screenshot;

/// Holder of the single reference screenshot detections compare against.
/// Replaced wholesale after every capture that completes a pass or a
/// heartbeat tick; never merged, never explicitly destroyed.
#[derive(Default)]
pub struct BaselineStore {
    shot: Option<Screenshot>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self { shot: None }
    }

    pub fn replace(&mut self, shot: Screenshot) {
        self.shot = Some(shot);
    }

    pub fn get(&self) -> Option<&Screenshot> {
        self.shot.as_ref()
    }

    pub fn dims(&self) -> Option<(u32, u32)> {
        self.shot.as_ref().map(|s| (s.width, s.height))
    }

    pub fn captured_at_ms(&self) -> Option<u64> {
        self.shot.as_ref().map(|s| s.captured_at_ms)
    }
}
