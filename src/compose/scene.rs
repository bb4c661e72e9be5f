//! Scene composition: the finished card photographed on a dark surface.
//!
//! Order is fixed: background and grain, shadow, card, glare, vignette, sensor noise. Noise comes
//! last so it lands on top of the glare and vignette ramps.

use rand::Rng;

use crate::effects::blend::BlendMode;
use crate::effects::gradient::{FillRegion, Gradient, GradientPaint, GradientStop, fill_gradient};
use crate::effects::noise::{NoiseFlavor, apply_noise};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::color::Rgba8;
use crate::foundation::core::{Placement, Point, Rect, Size, Vec2};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::render::surface::{RasterImage, Shadow, Surface};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    /// Shrinks the shadow rectangle on every side.
    pub inset: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f32,
    pub color: Rgba8,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            inset: 5.0,
            offset_x: 10.0,
            offset_y: 10.0,
            blur: 20.0,
            color: Rgba8::with_alpha_f32(0, 0, 0, 0.5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlareParams {
    /// White alpha at 0.4 and 0.6 along the band.
    pub edge_alpha: f32,
    /// White alpha at the middle of the band.
    pub peak_alpha: f32,
}

impl Default for GlareParams {
    fn default() -> Self {
        Self {
            edge_alpha: 0.1,
            peak_alpha: 0.35,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VignetteParams {
    /// Radius where darkening starts, as a fraction of the half-diagonal.
    pub inner_ratio: f64,
    pub max_alpha: f32,
}

impl Default for VignetteParams {
    fn default() -> Self {
        Self {
            inner_ratio: 0.5,
            max_alpha: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneParams {
    /// Scene size relative to the card.
    pub scale: f64,
    pub background: Rgba8,
    pub background_noise: f32,
    /// Rotation is drawn uniformly from `[-max_angle, max_angle]` radians.
    pub max_angle: f64,
    pub shadow: ShadowParams,
    pub glare: GlareParams,
    pub vignette: VignetteParams,
    pub sensor_noise: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            scale: 1.3,
            background: Rgba8::rgb(0x2A, 0x2A, 0x2A),
            background_noise: 0.08,
            max_angle: 0.05,
            shadow: ShadowParams::default(),
            glare: GlareParams::default(),
            vignette: VignetteParams::default(),
            sensor_noise: 0.04,
        }
    }
}

impl SceneParams {
    pub fn validate(&self) -> ForgeResult<()> {
        if !self.scale.is_finite() || self.scale < 1.0 {
            return Err(ForgeError::validation("scene.scale must be finite and >= 1"));
        }
        if !self.max_angle.is_finite() || self.max_angle < 0.0 {
            return Err(ForgeError::validation(
                "scene.max_angle must be finite and >= 0",
            ));
        }
        if !self.shadow.blur.is_finite() || self.shadow.blur < 0.0 {
            return Err(ForgeError::validation(
                "scene.shadow.blur must be finite and >= 0",
            ));
        }
        if !(0.0..1.0).contains(&self.vignette.inner_ratio) {
            return Err(ForgeError::validation(
                "scene.vignette.inner_ratio must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// Places a finished card into a larger scene. Each stage is public;
/// [`SceneCompositor::render`] runs them in the required order.
pub struct SceneCompositor<'a> {
    params: &'a SceneParams,
}

impl<'a> SceneCompositor<'a> {
    pub fn new(params: &'a SceneParams) -> Self {
        Self { params }
    }

    #[tracing::instrument(skip_all, fields(card_w = card.width(), card_h = card.height()))]
    pub fn render<R: Rng>(&self, card: PixelBuffer, rng: &mut R) -> ForgeResult<PixelBuffer> {
        let card_size = card.size();
        let mut scene = self.allocate(card_size)?;
        self.apply_background_noise(&mut scene, rng);
        let placement = self.choose_placement(card_size, scene.size(), rng);
        tracing::debug!(angle = placement.angle, "placing card");
        self.draw_shadow(&mut scene, card_size, placement)?;
        self.blit_card(&mut scene, &card, placement)?;
        self.apply_glare(&mut scene, card_size, placement)?;
        self.apply_vignette(&mut scene)?;
        self.apply_sensor_noise(&mut scene, rng);
        Ok(scene)
    }

    /// Scene buffer of `ceil(card * scale)` filled with the background colour.
    pub fn allocate(&self, card: Size) -> ForgeResult<PixelBuffer> {
        let size = card.scaled_ceil(self.params.scale);
        PixelBuffer::filled(size.width, size.height, self.params.background)
    }

    pub fn apply_background_noise<R: Rng>(&self, scene: &mut PixelBuffer, rng: &mut R) {
        apply_noise(scene, self.params.background_noise, NoiseFlavor::Neutral, rng);
    }

    /// Centre the card in the scene with a small random tilt about its centre.
    pub fn choose_placement<R: Rng>(&self, card: Size, scene: Size, rng: &mut R) -> Placement {
        let max = self.params.max_angle;
        let angle = if max > 0.0 {
            rng.random_range(-max..=max)
        } else {
            0.0
        };
        Placement::centered(card, scene, angle)
    }

    /// Blurred, offset rectangle under the card footprint. Must run before [`Self::blit_card`].
    pub fn draw_shadow(
        &self,
        scene: &mut PixelBuffer,
        card: Size,
        placement: Placement,
    ) -> ForgeResult<()> {
        let p = &self.params.shadow;
        let r = card.to_rect();
        let rect = Rect::new(r.x0 + p.inset, r.y0 + p.inset, r.x1 - p.inset, r.y1 - p.inset);
        let mut s = Surface::new(scene)?;
        s.set_transform(placement.to_affine());
        s.fill_rect_shadow(
            rect,
            Shadow {
                color: p.color,
                offset: Vec2::new(p.offset_x, p.offset_y),
                blur: p.blur,
            },
        )?;
        s.finish()
    }

    /// Opaque blit of the card under the placement transform.
    pub fn blit_card(
        &self,
        scene: &mut PixelBuffer,
        card: &PixelBuffer,
        placement: Placement,
    ) -> ForgeResult<()> {
        let image = RasterImage::from_buffer(card)?;
        let mut s = Surface::new(scene)?;
        s.set_transform(placement.to_affine());
        s.draw_image(&image, card.size().to_rect());
        s.finish()
    }

    /// Screen-blended diagonal sheen across the card's axis-aligned footprint.
    pub fn apply_glare(
        &self,
        scene: &mut PixelBuffer,
        card: Size,
        placement: Placement,
    ) -> ForgeResult<()> {
        let g = &self.params.glare;
        let footprint = placement.to_affine().transform_rect_bbox(card.to_rect());
        let band = Gradient::new(vec![
            GradientStop::new(0.0, Rgba8::TRANSPARENT),
            GradientStop::new(0.4, Rgba8::WHITE.fade(g.edge_alpha)),
            GradientStop::new(0.5, Rgba8::WHITE.fade(g.peak_alpha)),
            GradientStop::new(0.6, Rgba8::WHITE.fade(g.edge_alpha)),
            GradientStop::new(1.0, Rgba8::TRANSPARENT),
        ])?;
        fill_gradient(
            scene,
            &GradientPaint::linear(
                Point::new(footprint.x0, footprint.y0),
                Point::new(footprint.x1, footprint.y1),
                band,
            ),
            FillRegion::Rect(footprint),
            BlendMode::Screen,
        );
        Ok(())
    }

    /// Radial darkening from `inner_ratio` of the half-diagonal out to the corners.
    pub fn apply_vignette(&self, scene: &mut PixelBuffer) -> ForgeResult<()> {
        let v = &self.params.vignette;
        let (w, h) = (f64::from(scene.width()), f64::from(scene.height()));
        let outer = (w * w + h * h).sqrt() / 2.0;
        let ramp = Gradient::new(vec![
            GradientStop::new(0.0, Rgba8::TRANSPARENT),
            GradientStop::new(1.0, Rgba8::BLACK.fade(v.max_alpha)),
        ])?;
        fill_gradient(
            scene,
            &GradientPaint::Radial {
                center: Point::new(w / 2.0, h / 2.0),
                inner: outer * v.inner_ratio,
                outer,
                gradient: ramp,
            },
            FillRegion::Full,
            BlendMode::Normal,
        );
        Ok(())
    }

    pub fn apply_sensor_noise<R: Rng>(&self, scene: &mut PixelBuffer, rng: &mut R) {
        apply_noise(scene, self.params.sensor_noise, NoiseFlavor::Neutral, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn quiet() -> SceneParams {
        SceneParams {
            background_noise: 0.0,
            max_angle: 0.0,
            glare: GlareParams {
                edge_alpha: 0.0,
                peak_alpha: 0.0,
            },
            vignette: VignetteParams {
                max_alpha: 0.0,
                ..VignetteParams::default()
            },
            sensor_noise: 0.0,
            ..SceneParams::default()
        }
    }

    #[test]
    fn scene_is_scaled_up_from_card() {
        let params = SceneParams::default();
        let scene = SceneCompositor::new(&params)
            .allocate(Size::new(600, 380).unwrap())
            .unwrap();
        assert_eq!((scene.width(), scene.height()), (780, 494));
        assert_eq!(scene.get(0, 0).unwrap(), Rgba8::rgb(0x2A, 0x2A, 0x2A));
    }

    #[test]
    fn placement_angle_stays_in_range() {
        let params = SceneParams::default();
        let c = SceneCompositor::new(&params);
        let mut rng = StdRng::seed_from_u64(3);
        let card = Size::new(600, 380).unwrap();
        let scene = card.scaled_ceil(1.3);
        for _ in 0..100 {
            let p = c.choose_placement(card, scene, &mut rng);
            assert!(p.angle.abs() <= 0.05);
        }
    }

    #[test]
    fn shadow_darkens_down_and_right_of_the_card() {
        let params = quiet();
        let c = SceneCompositor::new(&params);
        let card = PixelBuffer::filled(100, 60, Rgba8::WHITE).unwrap();
        let scene = c.render(card, &mut StdRng::seed_from_u64(1)).unwrap();
        // Scene is 130x78; card spans x 15..115, y 9..69.
        let bg = Rgba8::rgb(0x2A, 0x2A, 0x2A);
        assert_eq!(scene.get(60, 40).unwrap(), Rgba8::WHITE);
        let below_right = scene.get(118, 74).unwrap();
        assert!(below_right.r < bg.r, "{below_right:?}");
        let above_left = scene.get(2, 2).unwrap();
        assert_eq!(above_left, bg);
    }

    #[test]
    fn glare_only_brightens_inside_the_footprint() {
        let params = SceneParams::default();
        let c = SceneCompositor::new(&params);
        let mut scene = PixelBuffer::filled(130, 78, Rgba8::rgb(50, 50, 50)).unwrap();
        let card = Size::new(100, 60).unwrap();
        let placement = Placement::centered(card, scene.size(), 0.0);
        c.apply_glare(&mut scene, card, placement).unwrap();
        assert_eq!(scene.get(2, 2).unwrap(), Rgba8::rgb(50, 50, 50));
        let mid = scene.get(65, 39).unwrap();
        assert!(mid.r > 50);
    }

    #[test]
    fn vignette_darkens_corners_not_centre() {
        let params = SceneParams::default();
        let c = SceneCompositor::new(&params);
        let mut scene = PixelBuffer::filled(200, 100, Rgba8::rgb(200, 200, 200)).unwrap();
        c.apply_vignette(&mut scene).unwrap();
        assert_eq!(scene.get(100, 50).unwrap(), Rgba8::rgb(200, 200, 200));
        let corner = scene.get(0, 0).unwrap();
        assert!(corner.r < 120, "{corner:?}");
        assert_eq!(corner.a, 255);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let params = SceneParams {
            scale: 0.5,
            ..SceneParams::default()
        };
        assert!(params.validate().is_err());
        assert!(SceneParams::default().validate().is_ok());
    }
}
