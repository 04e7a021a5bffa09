// VIEW: GPU setup, scene passes and post-processing
pub mod gpu_init;
pub mod post;
pub mod render;
pub mod texture;

pub use gpu_init::GpuContext;
pub use render::RenderState;
