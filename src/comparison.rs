//! Before/after split comparator.

pub const DEFAULT_SPLIT: u8 = 50;

/// Left of the boundary shows the generated image, right of it the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitView {
    position: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLayout {
    /// Width of the generated-image clip, measured from the left edge.
    pub generated_width: u32,
    pub boundary_x: u32,
}

impl Default for SplitView {
    fn default() -> Self {
        Self {
            position: DEFAULT_SPLIT,
        }
    }
}

impl SplitView {
    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn set_position(&mut self, value: i32) {
        self.position = value.clamp(0, 100) as u8;
    }

    pub fn drag_by(&mut self, delta: i32) {
        self.set_position(self.position as i32 + delta);
    }

    pub fn layout(&self, viewport_width: u32) -> SplitLayout {
        let x = (viewport_width as u64 * self.position as u64 / 100) as u32;
        SplitLayout {
            generated_width: x,
            boundary_x: x,
        }
    }
}
