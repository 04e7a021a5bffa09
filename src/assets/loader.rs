//! Asset fetching and load bookkeeping. Everything the scene needs is requested up front, so
//! progress is reported against a known total.

use std::cell::RefCell;
use std::rc::Rc;

use fontdue::Font;

use crate::assets::font::parse_font;
use crate::assets::model::{parse_glb, ModelData};
use crate::assets::texture::{decode_image, image_path, ImageData, PANEL_IMAGES};
use crate::config;
use crate::error::AssetError;

pub const RAMEN_MODEL: &str = "models/Ramen.glb";
pub const POLE_MODEL: &str = "models/pole.glb";
pub const HOLOGRAM_MODEL: &str = "models/holoGram.glb";

/// Supplies raw bytes by asset-relative path.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Load lifecycle callbacks. `loaded` counts finished items, failed ones included.
pub trait LoadObserver {
    fn on_start(&mut self, _url: &str, _loaded: usize, _total: usize) {}
    fn on_progress(&mut self, _url: &str, _loaded: usize, _total: usize) {}
    fn on_load(&mut self) {}
    fn on_error(&mut self, _url: &str) {}
}

/// Counts items in flight and drives a [`LoadObserver`].
pub struct LoadingManager<O: LoadObserver> {
    observer: O,
    loaded: usize,
    total: usize,
    errors: usize,
}

impl<O: LoadObserver> LoadingManager<O> {
    pub fn new(observer: O) -> Self {
        Self { observer, loaded: 0, total: 0, errors: 0 }
    }

    pub fn item_start(&mut self, url: &str) {
        self.total += 1;
        if self.total - self.loaded == 1 {
            self.observer.on_start(url, self.loaded, self.total);
        }
    }

    pub fn item_end(&mut self, url: &str) {
        self.loaded += 1;
        self.observer.on_progress(url, self.loaded, self.total);
        if self.loaded == self.total {
            self.observer.on_load();
        }
    }

    pub fn item_error(&mut self, url: &str) {
        self.errors += 1;
        self.observer.on_error(url);
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

/// Loading state read by the overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
    pub done: bool,
    pub failed: Vec<String>,
}

impl LoadProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }
}

/// Shared handle so the frame loop can watch a load running in another task.
#[derive(Debug, Clone, Default)]
pub struct SharedProgress(pub Rc<RefCell<LoadProgress>>);

impl LoadObserver for SharedProgress {
    fn on_start(&mut self, url: &str, loaded: usize, total: usize) {
        tracing::info!(url, loaded, total, "loading started");
        let mut p = self.0.borrow_mut();
        p.loaded = loaded;
        p.total = total;
    }

    fn on_progress(&mut self, url: &str, loaded: usize, total: usize) {
        tracing::debug!(url, loaded, total, "asset loaded");
        let mut p = self.0.borrow_mut();
        p.loaded = loaded;
        p.total = total;
    }

    fn on_load(&mut self) {
        tracing::info!("all assets loaded");
        self.0.borrow_mut().done = true;
    }

    fn on_error(&mut self, url: &str) {
        tracing::error!(url, "there was an error loading asset");
        self.0.borrow_mut().failed.push(url.to_string());
    }
}

/// Everything that made it through loading; failed items are simply absent.
#[derive(Default)]
pub struct LoadedAssets {
    pub ramen: Option<ModelData>,
    pub pole: Option<ModelData>,
    pub hologram: Option<ModelData>,
    pub images: Vec<(String, ImageData)>,
    pub font: Option<Font>,
}

pub async fn load_assets<S: AssetSource, O: LoadObserver>(
    source: &S,
    manager: &mut LoadingManager<O>,
) -> LoadedAssets {
    let image_paths: Vec<String> = PANEL_IMAGES.iter().map(|key| image_path(key)).collect();
    let models = [RAMEN_MODEL, POLE_MODEL, HOLOGRAM_MODEL];

    for path in models.iter().copied().chain(image_paths.iter().map(String::as_str)) {
        manager.item_start(path);
    }
    manager.item_start(config::TITLE_FONT_PATH);

    let mut assets = LoadedAssets::default();
    let [ramen, pole, hologram] = models;
    assets.ramen = load_one(source, manager, ramen, parse_glb).await;
    assets.pole = load_one(source, manager, pole, parse_glb).await;
    assets.hologram = load_one(source, manager, hologram, parse_glb).await;

    for (key, path) in PANEL_IMAGES.iter().zip(&image_paths) {
        if let Some(image) = load_one(source, manager, path, decode_image).await {
            assets.images.push((key.to_string(), image));
        }
    }

    assets.font = load_one(source, manager, config::TITLE_FONT_PATH, parse_font).await;
    assets
}

async fn load_one<S, O, T>(
    source: &S,
    manager: &mut LoadingManager<O>,
    path: &str,
    parse: impl FnOnce(&str, &[u8]) -> Result<T, AssetError>,
) -> Option<T>
where
    S: AssetSource,
    O: LoadObserver,
{
    let result = match source.read(path).await {
        Ok(bytes) => parse(path, &bytes),
        Err(e) => Err(e),
    };
    let value = match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "asset skipped");
            manager.item_error(path);
            None
        }
    };
    manager.item_end(path);
    value
}

/// Reads from a directory on disk.
#[cfg(not(target_arch = "wasm32"))]
pub struct FsSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for FsSource {
    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        std::fs::read(self.root.join(path)).map_err(|e| AssetError::Fetch {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fetches relative to the page over HTTP.
#[cfg(target_arch = "wasm32")]
pub struct FetchSource {
    base: String,
}

#[cfg(target_arch = "wasm32")]
impl FetchSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[cfg(target_arch = "wasm32")]
impl AssetSource for FetchSource {
    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let url = format!("{}/{}", self.base.trim_end_matches('/'), path);
        let fail = |reason: String| AssetError::Fetch { path: path.to_string(), reason };

        let window = web_sys::window().ok_or_else(|| fail("no global window".into()))?;
        let response = JsFuture::from(window.fetch_with_str(&url))
            .await
            .map_err(|e| fail(format!("{e:?}")))?;
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|_| fail("fetch did not return a Response".into()))?;
        if !response.ok() {
            return Err(fail(format!("HTTP {}", response.status())));
        }
        let buffer = response.array_buffer().map_err(|e| fail(format!("{e:?}")))?;
        let buffer = JsFuture::from(buffer).await.map_err(|e| fail(format!("{e:?}")))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl LoadObserver for Recorder {
        fn on_start(&mut self, url: &str, loaded: usize, total: usize) {
            self.0.push(format!("start {url} {loaded}/{total}"));
        }
        fn on_progress(&mut self, url: &str, loaded: usize, total: usize) {
            self.0.push(format!("progress {url} {loaded}/{total}"));
        }
        fn on_load(&mut self) {
            self.0.push("load".into());
        }
        fn on_error(&mut self, url: &str) {
            self.0.push(format!("error {url}"));
        }
    }

    struct MemorySource(HashMap<String, Vec<u8>>);

    impl AssetSource for MemorySource {
        async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            self.0.get(path).cloned().ok_or_else(|| AssetError::Fetch {
                path: path.to_string(),
                reason: "404".into(),
            })
        }
    }

    fn png() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(2, 2)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn manager_reports_in_order() {
        let mut manager = LoadingManager::new(Recorder::default());
        manager.item_start("a");
        manager.item_start("b");
        manager.item_end("a");
        manager.item_error("b");
        manager.item_end("b");
        assert_eq!(
            manager.observer().0,
            vec!["start a 0/1", "progress a 1/2", "error b", "progress b 2/2", "load"]
        );
        assert_eq!(manager.errors(), 1);
    }

    #[test]
    fn missing_assets_are_skipped_not_fatal() {
        let mut files = HashMap::new();
        files.insert(image_path("bg"), png());
        files.insert(image_path("back"), b"corrupt".to_vec());
        let source = MemorySource(files);

        let mut manager = LoadingManager::new(Recorder::default());
        let assets = pollster::block_on(load_assets(&source, &mut manager));

        let expected_total = 3 + PANEL_IMAGES.len() + 1;
        assert_eq!(manager.total(), expected_total);
        assert_eq!(manager.loaded(), expected_total);
        assert_eq!(manager.errors(), expected_total - 1);
        assert_eq!(manager.observer().0.last().map(String::as_str), Some("load"));

        assert!(assets.ramen.is_none() && assets.font.is_none());
        assert_eq!(assets.images.len(), 1);
        assert_eq!(assets.images[0].0, "bg");
    }

    #[test]
    fn shared_progress_tracks_completion() {
        let progress = SharedProgress::default();
        let mut manager = LoadingManager::new(progress.clone());
        manager.item_start("x");
        assert!(!progress.0.borrow().done);
        manager.item_error("x");
        manager.item_end("x");
        let p = progress.0.borrow();
        assert!(p.done);
        assert_eq!(p.failed, vec!["x".to_string()]);
        assert_eq!(p.fraction(), 1.0);
    }
}
