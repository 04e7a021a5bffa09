/// Platform-agnostic pointer handling
use crate::config;

/// Platform-independent input events, in logical pixels
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32 },
    Wheel { delta_y: f32 },
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: MouseButton,
    origin: (f32, f32),
    last: (f32, f32),
    dragging: bool,
}

/// Orbit input gathered since the last frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitInput {
    pub rotate: (f32, f32),
    pub pan: (f32, f32),
    pub wheel: f32,
}

/// Pointer state between frames: drags feed the orbit rig, short presses become clicks
#[derive(Debug, Default)]
pub struct InputState {
    pub pointer: (f32, f32),
    press: Option<Press>,
    orbit: OrbitInput,
    clicks: Vec<(f32, f32)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerDown { button, x, y } => {
                self.pointer = (x, y);
                self.press = Some(Press { button, origin: (x, y), last: (x, y), dragging: false });
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer = (x, y);
                let Some(press) = self.press.as_mut() else {
                    return;
                };
                let (dx, dy) = (x - press.last.0, y - press.last.1);
                press.last = (x, y);
                let (ox, oy) = (x - press.origin.0, y - press.origin.1);
                if (ox * ox + oy * oy).sqrt() > config::CLICK_SLOP_PX {
                    press.dragging = true;
                }
                match press.button {
                    MouseButton::Left => {
                        self.orbit.rotate.0 += dx;
                        self.orbit.rotate.1 += dy;
                    }
                    MouseButton::Right => {
                        self.orbit.pan.0 += dx;
                        self.orbit.pan.1 += dy;
                    }
                    MouseButton::Middle => {}
                }
            }
            InputEvent::PointerUp { button, x, y } => {
                self.pointer = (x, y);
                if let Some(press) = self.press.take() {
                    if press.button == button && button == MouseButton::Left && !press.dragging {
                        self.clicks.push((x, y));
                    }
                }
            }
            InputEvent::Wheel { delta_y } => {
                self.orbit.wheel += delta_y;
            }
            InputEvent::FocusLost => {
                self.press = None;
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|p| p.dragging)
    }

    pub fn consume_orbit(&mut self) -> OrbitInput {
        std::mem::take(&mut self.orbit)
    }

    pub fn take_clicks(&mut self) -> Vec<(f32, f32)> {
        std::mem::take(&mut self.clicks)
    }

    /// Drop everything queued, e.g. while the GUI owns the pointer
    pub fn discard_pending(&mut self) {
        self.orbit = OrbitInput::default();
        self.clicks.clear();
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{Event, MouseEvent};

    pub fn mouse_down_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerDown {
            button: MouseButton::from_web_button(e.button()),
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }

    pub fn mouse_up_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerUp {
            button: MouseButton::from_web_button(e.button()),
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove { x: e.client_x() as f32, y: e.client_y() as f32 }
    }

    pub fn mouse_wheel_to_input(e: &Event) -> Option<InputEvent> {
        let js_val = wasm_bindgen::JsValue::from(e.clone());
        if let Ok(delta_y) = js_sys::Reflect::get(&js_val, &wasm_bindgen::JsValue::from_str("deltaY")) {
            if let Some(dy) = delta_y.as_f64() {
                return Some(InputEvent::Wheel { delta_y: dy as f32 });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown { button: MouseButton::Left, x, y }
    }

    fn up(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerUp { button: MouseButton::Left, x, y }
    }

    #[test]
    fn short_press_is_a_click() {
        let mut input = InputState::new();
        input.process_event(&down(100.0, 100.0));
        input.process_event(&InputEvent::PointerMove { x: 102.0, y: 101.0 });
        input.process_event(&up(102.0, 101.0));
        assert_eq!(input.take_clicks(), vec![(102.0, 101.0)]);
        assert!(input.take_clicks().is_empty());
    }

    #[test]
    fn drag_rotates_instead_of_clicking() {
        let mut input = InputState::new();
        input.process_event(&down(100.0, 100.0));
        input.process_event(&InputEvent::PointerMove { x: 130.0, y: 90.0 });
        assert!(input.is_dragging());
        input.process_event(&up(130.0, 90.0));
        assert!(input.take_clicks().is_empty());
        assert_eq!(input.consume_orbit().rotate, (30.0, -10.0));
        assert_eq!(input.consume_orbit(), OrbitInput::default());
    }

    #[test]
    fn right_drag_pans_and_wheel_accumulates() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerDown { button: MouseButton::Right, x: 0.0, y: 0.0 });
        input.process_event(&InputEvent::PointerMove { x: 4.0, y: 2.0 });
        input.process_event(&InputEvent::PointerUp { button: MouseButton::Right, x: 4.0, y: 2.0 });
        input.process_event(&InputEvent::Wheel { delta_y: -100.0 });
        input.process_event(&InputEvent::Wheel { delta_y: 40.0 });
        let orbit = input.consume_orbit();
        assert_eq!(orbit.pan, (4.0, 2.0));
        assert_eq!(orbit.wheel, -60.0);
        assert!(input.take_clicks().is_empty(), "only the left button clicks");
    }

    #[test]
    fn hover_without_press_does_nothing() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerMove { x: 50.0, y: 50.0 });
        assert_eq!(input.pointer, (50.0, 50.0));
        assert_eq!(input.consume_orbit(), OrbitInput::default());
    }

    #[test]
    fn focus_loss_cancels_press() {
        let mut input = InputState::new();
        input.process_event(&down(0.0, 0.0));
        input.process_event(&InputEvent::FocusLost);
        input.process_event(&up(0.0, 0.0));
        assert!(input.take_clicks().is_empty());
    }
}
