use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to parse glTF {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse font {path}: {reason}")]
    Font { path: String, reason: String },
}

impl AssetError {
    pub fn path(&self) -> &str {
        match self {
            AssetError::Fetch { path, .. }
            | AssetError::Gltf { path, .. }
            | AssetError::Image { path, .. }
            | AssetError::Font { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
