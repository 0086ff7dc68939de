use std::path::Path;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Grass colour used when the ground texture cannot be read.
pub const GRASS_FALLBACK: [u8; 4] = [86, 110, 52, 255];
/// Tangent-space +Z.
pub const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];
/// Full ambient occlusion, roughness and metalness; the material scalars decide.
pub const NEUTRAL_ARM: [u8; 4] = [255, 255, 255, 255];

pub const GROUND_ALBEDO: &str = "leafy_grass_diff_1k.jpg";
pub const GROUND_NORMAL: &str = "leafy_grass_nor_gl_1k.jpg";
pub const GROUND_ARM: &str = "leafy_grass_arm_1k.jpg";

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colour data, decoded to linear by the sampler.
    Srgb,
    /// Non-colour data such as normals or roughness.
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    /// Decode an image file, or `None` with a warning if it cannot be read.
    ///
    /// The format is sniffed from the content, not the extension.
    pub fn load_or_warn(path: &Path) -> Option<Self> {
        match decode(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                tracing::info!(
                    path = %path.display(),
                    width = rgba.width(),
                    height = rgba.height(),
                    "loaded texture"
                );
                Some(Self {
                    width: rgba.width(),
                    height: rgba.height(),
                    pixels: rgba.into_raw(),
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "texture unavailable, using fallback: {e}");
                None
            }
        }
    }

    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        space: ColorSpace,
    ) -> wgpu::TextureView {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: self.width,
                    height: self.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &self.pixels,
        );
        texture.create_view(&Default::default())
    }
}

fn decode(path: &Path) -> Result<image::DynamicImage, image::ImageError> {
    Ok(image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?)
}

/// Albedo, normal and ambient-occlusion/roughness/metalness maps of one
/// surface. A missing map is replaced by a neutral 1x1 texel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceMaps {
    pub albedo: Option<TextureImage>,
    pub normal: Option<TextureImage>,
    pub arm: Option<TextureImage>,
}

impl SurfaceMaps {
    /// The leafy grass set from `data_dir`.
    pub fn load_ground(data_dir: &Path) -> Self {
        Self {
            albedo: TextureImage::load_or_warn(&data_dir.join(GROUND_ALBEDO)),
            normal: TextureImage::load_or_warn(&data_dir.join(GROUND_NORMAL)),
            arm: TextureImage::load_or_warn(&data_dir.join(GROUND_ARM)),
        }
    }

    /// `[albedo, normal, arm]`, with fallbacks filled in.
    pub fn with_fallbacks(&self, albedo_fallback: [u8; 4]) -> [TextureImage; 3] {
        let or_solid = |map: &Option<TextureImage>, color| {
            map.clone().unwrap_or_else(|| TextureImage::solid(color))
        };
        [
            or_solid(&self.albedo, albedo_fallback),
            or_solid(&self.normal, FLAT_NORMAL),
            or_solid(&self.arm, NEUTRAL_ARM),
        ]
    }
}

/// Colour target the background is rendered into before the screen pass.
pub struct OffscreenTarget {
    pub view: wgpu::TextureView,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&Default::default()),
        }
    }
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_is_one_pixel() {
        let img = TextureImage::solid(GRASS_FALLBACK);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.pixels, GRASS_FALLBACK.to_vec());
    }

    #[test]
    fn missing_file_falls_back() {
        assert!(TextureImage::load_or_warn(Path::new("./does/not/exist.jpg")).is_none());
    }

    #[test]
    fn missing_ground_maps_use_neutral_texels() {
        let dir = tempfile::tempdir().unwrap();
        let maps = SurfaceMaps::load_ground(dir.path());
        assert_eq!(maps, SurfaceMaps::default());

        let [albedo, normal, arm] = maps.with_fallbacks(GRASS_FALLBACK);
        assert_eq!(albedo, TextureImage::solid(GRASS_FALLBACK));
        assert_eq!(normal, TextureImage::solid(FLAT_NORMAL));
        assert_eq!(arm, TextureImage::solid(NEUTRAL_ARM));
    }

    #[test]
    fn ground_maps_load_independently() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([120, 140, 250, 255]))
            .save_with_format(dir.path().join(GROUND_NORMAL), image::ImageFormat::Png)
            .unwrap();

        let maps = SurfaceMaps::load_ground(dir.path());
        assert!(maps.albedo.is_none());
        assert!(maps.arm.is_none());
        let normal = maps.normal.as_ref().unwrap();
        assert_eq!((normal.width, normal.height), (2, 2));
        assert_eq!(&normal.pixels[..4], &[120, 140, 250, 255]);

        let [_, normal, _] = maps.with_fallbacks(GRASS_FALLBACK);
        assert_eq!(normal.width, 2);
    }

    #[test]
    fn data_maps_are_linear() {
        assert_eq!(ColorSpace::Srgb.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(ColorSpace::Linear.format(), wgpu::TextureFormat::Rgba8Unorm);
    }
}
