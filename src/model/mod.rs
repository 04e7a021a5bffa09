// MODEL: scene data, picking and layout
pub mod assembly;
pub mod camera;
pub mod hotspot;
pub mod panels;
pub mod particles;
pub mod raycast;
pub mod scene;

pub use camera::Camera;
pub use hotspot::{AboutPage, Hotspot, Section, SocialLink};
pub use raycast::Ray;
pub use scene::{Material, ObjectId, PanelGroup, PickRole, Scene, SceneObject, TextureId};
