/// Edge-triggered input for one frame. Each flag is true at most once per
/// physical key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub restart: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Restart,
}

impl Action {
    /// Map a DOM `KeyboardEvent.code`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyA" | "ArrowLeft" => Some(Action::Left),
            "KeyD" | "ArrowRight" => Some(Action::Right),
            "KeyR" | "Space" => Some(Action::Restart),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Restart => 2,
        }
    }
}

/// Turns keydown/keyup streams into per-frame press edges. Key auto-repeat
/// produces extra keydowns while held; those are ignored.
#[derive(Debug, Default)]
pub struct InputHandler {
    held: [bool; 3],
    pressed: [bool; 3],
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the code maps to a game action.
    pub fn key_down(&mut self, code: &str) -> bool {
        let Some(action) = Action::from_code(code) else {
            return false;
        };
        self.press(action);
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        let Some(action) = Action::from_code(code) else {
            return false;
        };
        self.held[action.index()] = false;
        true
    }

    pub fn press(&mut self, action: Action) {
        let i = action.index();
        if !self.held[i] {
            self.pressed[i] = true;
        }
        self.held[i] = true;
    }

    /// Queue a one-shot press with no matching hold, as touch buttons do.
    pub fn tap(&mut self, action: Action) {
        self.pressed[action.index()] = true;
    }

    pub fn take_frame(&mut self) -> FrameInput {
        let [left, right, restart] = std::mem::take(&mut self.pressed);
        FrameInput { left, right, restart }
    }
}
