use std::sync::mpsc::{self, Receiver, Sender};

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Readiness of an asynchronously loaded resource
#[derive(Debug)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed,
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Loading
    }
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed => "failed",
        }
    }

    /// Settle a loading slot with a finished load; `upload` turns the decoded
    /// value into what the slot holds.
    pub fn settle<U, E: std::fmt::Display>(
        &mut self,
        path: &str,
        result: Result<U, E>,
        upload: impl FnOnce(U) -> T,
    ) {
        *self = match result {
            Ok(value) => {
                tracing::info!(path, "texture ready");
                LoadState::Ready(upload(value))
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "texture failed to load, keeping placeholder");
                LoadState::Failed
            }
        };
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, TextureError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

pub type LoadResult = (String, Result<RgbaImage, TextureError>);

/// Loads images off the frame loop and hands them back through a channel
/// polled once per frame.
pub struct TextureLoader {
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn request(&self, path: &str) {
        let tx = self.tx.clone();
        let path = path.to_string();
        std::thread::spawn(move || {
            let result = std::fs::read(&path)
                .map_err(|source| TextureError::Io { path: path.clone(), source })
                .and_then(|bytes| decode_image(&bytes));
            // receiver gone means the renderer shut down
            let _ = tx.send((path, result));
        });
    }

    #[cfg(target_arch = "wasm32")]
    pub fn request(&self, path: &str) {
        let tx = self.tx.clone();
        let path = path.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_bytes(&path)
                .await
                .and_then(|bytes| decode_image(&bytes));
            let _ = tx.send((path, result));
        });
    }

    /// Everything that finished since the last poll, without blocking
    pub fn poll(&self) -> Vec<LoadResult> {
        self.rx.try_iter().collect()
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(path: &str) -> Result<Vec<u8>, TextureError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fetch_err = |reason: String| TextureError::Fetch { path: path.to_string(), reason };

    let window = web_sys::window().ok_or_else(|| fetch_err("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(|e| fetch_err(format!("{e:?}")))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| fetch_err("not a Response".into()))?;
    if !response.ok() {
        return Err(fetch_err(format!("HTTP {}", response.status())));
    }

    let buffer_promise = response
        .array_buffer()
        .map_err(|e| fetch_err(format!("{e:?}")))?;
    let buffer = JsFuture::from(buffer_promise)
        .await
        .map_err(|e| fetch_err(format!("{e:?}")))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// A sampled texture ready to bind at group 2
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

pub fn texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("surface_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// 1x1 opaque black texel bound while the real texture is missing, so only
/// the shape color and specular light show
pub fn placeholder_image() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]))
}

/// Texels are sampled as stored; shading works on gamma-space values
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &RgbaImage,
    label: &str,
) -> GpuTexture {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    });

    GpuTexture { texture, view, bind_group }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn test_decode_image_keeps_pixels() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 40]));
        let decoded = decode_image(&png_bytes(&image)).expect("decode");
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(1, 0).0, [10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode_image(b"not an image"), Err(TextureError::Decode(_))));
    }

    #[test]
    fn test_load_state_settles() {
        let mut slot: LoadState<u32> = LoadState::default();
        assert!(slot.is_loading());
        assert!(slot.ready().is_none());

        slot.settle("a.png", Ok::<_, String>(3u32), |v| v * 2);
        assert_eq!(slot.ready(), Some(&6));
        assert_eq!(slot.label(), "ready");

        slot.settle("a.png", Err::<u32, _>("boom"), |v| v);
        assert!(matches!(slot, LoadState::Failed));
        assert!(slot.ready().is_none());
    }

    #[test]
    fn test_loader_reports_missing_file() {
        let loader = TextureLoader::new();
        loader.request("definitely/not/here.png");

        let mut results = Vec::new();
        for _ in 0..200 {
            results = loader.poll();
            if !results.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "definitely/not/here.png");
        assert!(matches!(results[0].1, Err(TextureError::Io { .. })));
    }

    #[test]
    fn test_placeholder_is_opaque_black() {
        let image = placeholder_image();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_texture_format_is_not_srgb() {
        assert!(!TEXTURE_FORMAT.is_srgb());
    }
}
