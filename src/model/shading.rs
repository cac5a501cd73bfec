//! CPU mirror of `view/shaders/phong.wgsl`.
//!
//! The lighting model is one function, `phong_model_lights`, fed by a
//! [`ColorSource`] that decides what surface color a fragment starts from.
//! `FlatColor` uses the material color, `TextureLookup` samples an image and
//! may discard the fragment. Each source names the WGSL fragment entry point
//! that implements it on the GPU.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use image::RgbaImage;

use super::light::Light;
use super::material::{PhongParams, Shading};

/// Fragments with a sampled alpha below this are discarded
pub const ALPHA_CUTOUT: f32 = 0.01;

/// Colors a fragment contributes before lighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Multiplied with light color in the diffuse term
    pub diffuse: Vec3,
    /// Base scaled by the ambient coefficient
    pub ambient: Vec3,
    pub alpha: f32,
}

pub trait ColorSource {
    const FRAGMENT_ENTRY: &'static str;

    /// `None` discards the fragment.
    fn sample(&self, tex_coord: Vec2, shape_color: Vec4) -> Option<SurfaceSample>;
}

pub struct FlatColor;

impl ColorSource for FlatColor {
    const FRAGMENT_ENTRY: &'static str = "fs_flat";

    fn sample(&self, _tex_coord: Vec2, shape_color: Vec4) -> Option<SurfaceSample> {
        Some(SurfaceSample {
            diffuse: shape_color.truncate(),
            ambient: shape_color.truncate(),
            alpha: shape_color.w,
        })
    }
}

/// Nearest-texel lookup with repeat wrapping
pub struct TextureLookup<'a> {
    pub image: &'a RgbaImage,
}

impl TextureLookup<'_> {
    fn texel(&self, tex_coord: Vec2) -> Vec4 {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return Vec4::ZERO;
        }
        let u = tex_coord.x.rem_euclid(1.0);
        let v = tex_coord.y.rem_euclid(1.0);
        let x = ((u * w as f32) as u32).min(w - 1);
        let y = ((v * h as f32) as u32).min(h - 1);
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

impl ColorSource for TextureLookup<'_> {
    const FRAGMENT_ENTRY: &'static str = "fs_textured";

    fn sample(&self, tex_coord: Vec2, shape_color: Vec4) -> Option<SurfaceSample> {
        let tex = self.texel(tex_coord);
        if tex.w < ALPHA_CUTOUT {
            return None;
        }
        Some(SurfaceSample {
            diffuse: tex.truncate(),
            ambient: tex.truncate() + shape_color.truncate(),
            alpha: shape_color.w * tex.w,
        })
    }
}

pub fn fragment_entry(shading: Shading) -> &'static str {
    match shading {
        Shading::Flat => FlatColor::FRAGMENT_ENTRY,
        Shading::Textured => <TextureLookup<'static> as ColorSource>::FRAGMENT_ENTRY,
    }
}

/// Squared length of each basis column of the model's linear part.
/// Dividing a transformed normal by this undoes non-uniform scaling.
pub fn squared_scale(model: &Mat4) -> Vec3 {
    Vec3::new(
        model.x_axis.truncate().length_squared(),
        model.y_axis.truncate().length_squared(),
        model.z_axis.truncate().length_squared(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub normal: Vec3,
    pub vertex_worldspace: Vec3,
    pub tex_coord: Vec2,
}

pub fn shade_vertex(view_proj: &Mat4, model: &Mat4, position: Vec3, normal: Vec3, tex_coord: Vec2) -> VertexOutput {
    let world = *model * position.extend(1.0);
    VertexOutput {
        clip_position: *view_proj * world,
        normal: (Mat3::from_mat4(*model) * normal / squared_scale(model)).normalize_or_zero(),
        vertex_worldspace: world.truncate(),
        tex_coord,
    }
}

/// Sum of diffuse and specular contributions over `lights`
pub fn phong_model_lights(
    surface: Vec3,
    n: Vec3,
    vertex_worldspace: Vec3,
    camera_center: Vec3,
    params: &PhongParams,
    lights: &[Light],
) -> Vec3 {
    let e = (camera_center - vertex_worldspace).normalize_or_zero();
    let mut result = Vec3::ZERO;
    for light in lights {
        let surface_to_light = light.surface_to_light(vertex_worldspace);
        let distance_to_light = surface_to_light.length();

        let l = surface_to_light.normalize_or_zero();
        let h = (l + e).normalize_or_zero();
        let diffuse = n.dot(l).max(0.0);
        let specular = n.dot(h).max(0.0).powf(params.smoothness);
        let attenuation = 1.0 / (1.0 + light.attenuation * distance_to_light * distance_to_light);

        let color = light.color.truncate();
        let contribution = surface * color * params.diffusivity * diffuse + color * params.specularity * specular;
        result += attenuation * contribution;
    }
    result
}

/// Final fragment color, or `None` when the fragment is discarded
pub fn shade_fragment<C: ColorSource>(
    source: &C,
    shape_color: Vec4,
    params: &PhongParams,
    camera_center: Vec3,
    lights: &[Light],
    input: &VertexOutput,
) -> Option<Vec4> {
    let sample = source.sample(input.tex_coord, shape_color)?;
    let n = input.normal.normalize_or_zero();
    let lit = sample.ambient * params.ambient
        + phong_model_lights(sample.diffuse, n, input.vertex_worldspace, camera_center, params, lights);
    Some(lit.extend(sample.alpha))
}
