// ABOUTME: Maps pointer moves and arrow keys onto glass positions.
// ABOUTME: Pure math, no smoothing; every update lands on the next frame.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Key-driven placement with a fixed per-press step.
pub struct Placement {
    step: f32,
}

impl Placement {
    pub fn new(step: f32) -> Self {
        Self { step: step.max(0.0) }
    }

    /// Shift `position` one step, keeping the glass canvas fully inside
    /// `bounds`.
    pub fn nudge(
        &self,
        position: (f32, f32),
        direction: Direction,
        canvas: (u32, u32),
        bounds: (u32, u32),
    ) -> (f32, f32) {
        let (mut x, mut y) = position;
        match direction {
            Direction::Up => y -= self.step,
            Direction::Down => y += self.step,
            Direction::Left => x -= self.step,
            Direction::Right => x += self.step,
        }
        clamp_to_bounds((x, y), canvas, bounds)
    }

    /// Absolute placement centered on the pointer.
    pub fn center_on_pointer(
        &self,
        pointer: (f64, f64),
        canvas: (u32, u32),
        bounds: (u32, u32),
    ) -> (f32, f32) {
        let x = pointer.0 as f32 - canvas.0 as f32 / 2.0;
        let y = pointer.1 as f32 - canvas.1 as f32 / 2.0;
        clamp_to_bounds((x, y), canvas, bounds)
    }
}

fn clamp_to_bounds(position: (f32, f32), canvas: (u32, u32), bounds: (u32, u32)) -> (f32, f32) {
    let max_x = (bounds.0 as f32 - canvas.0 as f32).max(0.0);
    let max_y = (bounds.1 as f32 - canvas.1 as f32).max(0.0);
    (
        position.0.clamp(0.0, max_x),
        position.1.clamp(0.0, max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: (u32, u32) = (400, 240);
    const BOUNDS: (u32, u32) = (1200, 800);

    #[test]
    fn nudge_moves_by_exactly_one_step() {
        let placement = Placement::new(10.0);
        let pos = placement.nudge((100.0, 100.0), Direction::Right, CANVAS, BOUNDS);
        assert_eq!(pos, (110.0, 100.0));
        let pos = placement.nudge(pos, Direction::Up, CANVAS, BOUNDS);
        assert_eq!(pos, (110.0, 90.0));
    }

    #[test]
    fn consecutive_presses_each_advance_one_step() {
        // Each nudge must build on the previously applied position;
        // two presses in a row may never collapse into one step.
        let placement = Placement::new(10.0);
        let mut pos = (100.0, 100.0);
        pos = placement.nudge(pos, Direction::Right, CANVAS, BOUNDS);
        pos = placement.nudge(pos, Direction::Right, CANVAS, BOUNDS);
        assert_eq!(pos, (120.0, 100.0));
    }

    #[test]
    fn nudge_clamps_at_window_edges() {
        let placement = Placement::new(10.0);
        let pos = placement.nudge((3.0, 0.0), Direction::Left, CANVAS, BOUNDS);
        assert_eq!(pos, (0.0, 0.0));
        let pos = placement.nudge((795.0, 0.0), Direction::Right, CANVAS, BOUNDS);
        assert_eq!(pos, (800.0, 0.0));
    }

    #[test]
    fn pointer_placement_centers_the_canvas() {
        let placement = Placement::new(10.0);
        let pos = placement.center_on_pointer((600.0, 400.0), CANVAS, BOUNDS);
        assert_eq!(pos, (400.0, 280.0));
    }

    #[test]
    fn pointer_near_corner_is_clamped() {
        let placement = Placement::new(10.0);
        let pos = placement.center_on_pointer((5.0, 5.0), CANVAS, BOUNDS);
        assert_eq!(pos, (0.0, 0.0));
    }

    #[test]
    fn oversized_canvas_pins_to_origin() {
        let placement = Placement::new(10.0);
        let pos = placement.nudge((50.0, 50.0), Direction::Down, (2000, 2000), BOUNDS);
        assert_eq!(pos, (0.0, 0.0));
    }
}
