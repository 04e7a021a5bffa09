// CONTROLLER: input, camera flights, animation and the per-frame update
pub mod frame_loop;
pub mod hologram;
pub mod input;
pub mod interaction;
pub mod orbit;
pub mod tween;

pub use frame_loop::{FrameLoopContext, FrameOutput, FrameStats};
pub use hologram::HologramAnimator;
pub use input::{InputEvent, InputState, MouseButton};
pub use interaction::{ClickOutcome, InteractionController, View};
pub use orbit::OrbitControls;
