// ASSETS: fetching and decoding of models, images and fonts
pub mod font;
pub mod loader;
pub mod model;
pub mod texture;

pub use loader::{load_assets, AssetSource, LoadObserver, LoadProgress, LoadedAssets, LoadingManager, SharedProgress};
pub use model::{ModelData, ModelNode};
pub use texture::ImageData;
