use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Spin about +Y in clip space.
    #[default]
    Model,
    /// Spin about +Z, seen through a perspective camera.
    ModelViewProjection,
}

pub const FIELD_OF_VIEW_DEG: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
pub const EYE: Vec3 = Vec3::new(0.0, 0.0, 10.0);

/// translate(0) · rotate_y(t) · scale(s)
pub fn model_transform(time_secs: f32, scale: f32) -> Mat4 {
    Mat4::IDENTITY
        * Mat4::from_translation(Vec3::ZERO)
        * Mat4::from_rotation_y(time_secs)
        * Mat4::from_scale(Vec3::splat(scale))
}

pub fn model_view_projection(time_secs: f32, aspect_ratio: f32) -> Mat4 {
    let projection = Mat4::perspective_rh_gl(
        FIELD_OF_VIEW_DEG.to_radians(),
        aspect_ratio,
        NEAR_PLANE,
        FAR_PLANE,
    );
    let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y);
    let model = Mat4::from_rotation_z(time_secs);

    projection * view * model
}

impl TransformMode {
    pub fn matrix(self, time_secs: f32, scale: f32, aspect_ratio: f32) -> Mat4 {
        match self {
            TransformMode::Model => model_transform(time_secs, scale),
            TransformMode::ModelViewProjection => model_view_projection(time_secs, aspect_ratio),
        }
    }
}
