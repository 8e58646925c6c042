use super::Vec2;

/// Per-tick input. Click flags are edge-triggered: they are true only for
/// the tick in which the button went down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, right_click_pressed: bool) -> Self {
        self.right_click_pressed = right_click_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

/// Supplies one snapshot per fixed tick to the runner.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64, window_size: (u32, u32)) -> InputSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedInputEvent {
    MoveCursor { tick: u64, position_px: Vec2 },
    LeftClick { tick: u64, position_px: Vec2 },
    RightClick { tick: u64, position_px: Vec2 },
    Quit { tick: u64 },
}

impl ScriptedInputEvent {
    fn tick(&self) -> u64 {
        match *self {
            ScriptedInputEvent::MoveCursor { tick, .. }
            | ScriptedInputEvent::LeftClick { tick, .. }
            | ScriptedInputEvent::RightClick { tick, .. }
            | ScriptedInputEvent::Quit { tick } => tick,
        }
    }
}

/// Replays a fixed list of timed events. The cursor stays where the last
/// event left it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: Vec<ScriptedInputEvent>,
    next_event: usize,
    cursor_position_px: Option<Vec2>,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<ScriptedInputEvent>) -> Self {
        events.sort_by_key(ScriptedInputEvent::tick);
        Self {
            events,
            next_event: 0,
            cursor_position_px: None,
        }
    }

    pub fn remaining_events(&self) -> usize {
        self.events.len() - self.next_event
    }
}

impl InputSource for ScriptedInput {
    fn snapshot_for_tick(&mut self, tick: u64, window_size: (u32, u32)) -> InputSnapshot {
        let mut snapshot = InputSnapshot::empty().with_window_size(window_size);
        while let Some(event) = self.events.get(self.next_event) {
            if event.tick() > tick {
                break;
            }
            match *event {
                ScriptedInputEvent::MoveCursor { position_px, .. } => {
                    self.cursor_position_px = Some(position_px);
                }
                ScriptedInputEvent::LeftClick { position_px, .. } => {
                    self.cursor_position_px = Some(position_px);
                    snapshot = snapshot.with_left_click_pressed(true);
                }
                ScriptedInputEvent::RightClick { position_px, .. } => {
                    self.cursor_position_px = Some(position_px);
                    snapshot = snapshot.with_right_click_pressed(true);
                }
                ScriptedInputEvent::Quit { .. } => {
                    snapshot = snapshot.with_quit_requested(true);
                }
            }
            self.next_event += 1;
        }
        snapshot.with_cursor_position_px(self.cursor_position_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_is_edge_triggered_for_single_tick() {
        let mut input = ScriptedInput::new(vec![ScriptedInputEvent::LeftClick {
            tick: 2,
            position_px: Vec2 { x: 5.0, y: 6.0 },
        }]);

        let before = input.snapshot_for_tick(1, (800, 600));
        let during = input.snapshot_for_tick(2, (800, 600));
        let after = input.snapshot_for_tick(3, (800, 600));

        assert!(!before.left_click_pressed());
        assert!(before.cursor_position_px().is_none());
        assert!(during.left_click_pressed());
        assert!(!after.left_click_pressed());
        assert_eq!(after.cursor_position_px(), Some(Vec2 { x: 5.0, y: 6.0 }));
        assert_eq!(after.window_size(), (800, 600));
    }

    #[test]
    fn events_are_replayed_in_tick_order() {
        let mut input = ScriptedInput::new(vec![
            ScriptedInputEvent::Quit { tick: 9 },
            ScriptedInputEvent::RightClick {
                tick: 4,
                position_px: Vec2 { x: 1.0, y: 1.0 },
            },
        ]);
        assert_eq!(input.remaining_events(), 2);

        assert!(input.snapshot_for_tick(4, (0, 0)).right_click_pressed());
        assert!(!input.snapshot_for_tick(8, (0, 0)).quit_requested());
        assert!(input.snapshot_for_tick(9, (0, 0)).quit_requested());
        assert_eq!(input.remaining_events(), 0);
    }

    #[test]
    fn late_polling_still_delivers_skipped_events() {
        let mut input = ScriptedInput::new(vec![ScriptedInputEvent::LeftClick {
            tick: 3,
            position_px: Vec2 { x: 2.0, y: 2.0 },
        }]);
        assert!(input.snapshot_for_tick(10, (0, 0)).left_click_pressed());
    }
}
