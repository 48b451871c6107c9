//! Pointer hover via ray-AABB intersection
//!
//! Unprojects the cursor through the camera's inverse view-projection matrix
//! and tests the ray against the model's bounds, rotated the way the model is
//! currently drawn. Auto-rotation pauses while this reports a hit.

use glam::{Mat4, Vec3};
use glview_import::MeshBounds;
use glview_render::OrbitCamera;

/// A ray in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Ray {
    /// Ray through a cursor position given in physical pixels.
    pub fn from_screen(
        screen_x: f32,
        screen_y: f32,
        viewport_width: f32,
        viewport_height: f32,
        camera: &OrbitCamera,
    ) -> Self {
        let inv_vp = camera.inverse_view_projection_matrix();

        let ndc_x = 2.0 * screen_x / viewport_width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_y / viewport_height.max(1.0);

        // wgpu clip space puts the near plane at z = 0
        let near = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv_vp.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));

        let direction = (far - near).try_normalize().unwrap_or(Vec3::NEG_Z);
        Self {
            origin: near,
            direction,
        }
    }
}

impl Aabb {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_bounds(bounds: &MeshBounds) -> Self {
        Self {
            min: Vec3::from_array(bounds.min),
            max: Vec3::from_array(bounds.max),
        }
    }

    /// Box enclosing this one after transformation by `mat`
    pub fn transformed(&self, mat: &Mat4) -> Self {
        let translation = mat.w_axis.truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        let columns = [mat.x_axis.truncate(), mat.y_axis.truncate(), mat.z_axis.truncate()];
        for (i, column) in columns.iter().enumerate() {
            let a = *column * self.min[i];
            let b = *column * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// Slab test. Returns the distance along the ray to the nearest hit.
pub fn ray_intersect(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for i in 0..3 {
        if ray.direction[i].abs() < 1e-8 {
            if ray.origin[i] < aabb.min[i] || ray.origin[i] > aabb.max[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / ray.direction[i];
            let mut t1 = (aabb.min[i] - ray.origin[i]) * inv_d;
            let mut t2 = (aabb.max[i] - ray.origin[i]) * inv_d;

            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            tmin = tmin.max(t1);
            tmax = tmax.min(t2);

            if tmin > tmax {
                return None;
            }
        }
    }

    if tmax < 0.0 {
        None
    } else {
        Some(tmin.max(0.0))
    }
}

/// Whether the cursor is over the model drawn with `model_matrix`.
pub fn cursor_over_model(
    cursor: (f32, f32),
    viewport: (f32, f32),
    camera: &OrbitCamera,
    bounds: &MeshBounds,
    model_matrix: &Mat4,
) -> bool {
    let ray = Ray::from_screen(cursor.0, cursor.1, viewport.0, viewport.1, camera);
    let aabb = Aabb::from_bounds(bounds).transformed(model_matrix);
    ray_intersect(&ray, &aabb).is_some()
}
