// 2D transform with a lazily cached affine matrix

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};
use std::cell::Cell;

/// Position, rotation and scale of an object in the plane.
///
/// The affine matrix is built on first use and reused until one of the
/// components changes. Every mutator drops the cached matrix, so the cache
/// never disagrees with the components.
#[derive(Debug, Clone)]
pub struct Transform2D {
    position: Vec2,
    /// Rotation in radians, counter-clockwise
    rotation: f32,
    scale: Vec2,
    matrix: Cell<Option<Affine2>>,
}

impl Transform2D {
    /// Create a transform from its components
    pub fn new(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation,
            scale,
            matrix: Cell::new(None),
        }
    }

    /// Identity rotation and unit scale at `position`
    pub fn from_position(position: Vec2) -> Self {
        Self::new(position, 0.0, Vec2::ONE)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Replace any combination of components in one call
    pub fn set(&mut self, position: Option<Vec2>, rotation: Option<f32>, scale: Option<Vec2>) {
        if let Some(position) = position {
            self.position = position;
        }
        if let Some(rotation) = rotation {
            self.rotation = rotation;
        }
        if let Some(scale) = scale {
            self.scale = scale;
        }
        self.invalidate();
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate();
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.invalidate();
    }

    /// Same scale factor on both axes
    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vec2::splat(scale));
    }

    /// Translate by `delta`
    pub fn move_by(&mut self, delta: Vec2) {
        self.position += delta;
        self.invalidate();
    }

    /// Whether a matrix is currently cached
    pub fn is_cached(&self) -> bool {
        self.matrix.get().is_some()
    }

    /// Affine matrix for the current components
    pub fn matrix(&self) -> Affine2 {
        if let Some(matrix) = self.matrix.get() {
            return matrix;
        }
        let matrix =
            Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position);
        self.matrix.set(Some(matrix));
        matrix
    }

    /// Row-major 3x2 layout: x axis, y axis, origin
    pub fn rows(&self) -> [[f32; 2]; 3] {
        let m = self.matrix();
        [
            m.matrix2.x_axis.to_array(),
            m.matrix2.y_axis.to_array(),
            m.translation.to_array(),
        ]
    }

    /// Map a point from local to world space
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.matrix().transform_point2(point)
    }

    fn invalidate(&mut self) {
        self.matrix.set(None);
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::from_position(Vec2::ZERO)
    }
}

/// Model matrix laid out as three 16-byte columns for GPU upload
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 3],
}

impl ModelUniform {
    /// Create a uniform from a transform
    pub fn new(transform: &Transform2D) -> Self {
        let [x_axis, y_axis, origin] = transform.rows();
        Self {
            model: [
                [x_axis[0], x_axis[1], 0.0, 0.0],
                [y_axis[0], y_axis[1], 0.0, 0.0],
                [origin[0], origin[1], 1.0, 0.0],
            ],
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.model[2][0], self.model[2][1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_matrix_is_cached_until_mutation() {
        let mut transform = Transform2D::from_position(Vec2::new(1.0, 2.0));
        assert!(!transform.is_cached());

        transform.matrix();
        assert!(transform.is_cached());

        transform.move_by(Vec2::new(1.0, 0.0));
        assert!(!transform.is_cached());
        assert_eq!(transform.rows()[2], [2.0, 2.0]);
    }

    #[test]
    fn test_every_mutator_invalidates() {
        let mut transform = Transform2D::default();

        transform.matrix();
        transform.set_rotation(1.0);
        assert!(!transform.is_cached());

        transform.matrix();
        transform.set_uniform_scale(2.0);
        assert!(!transform.is_cached());

        transform.matrix();
        transform.set_position(Vec2::ONE);
        assert!(!transform.is_cached());

        transform.matrix();
        transform.set(None, None, None);
        assert!(!transform.is_cached());
    }

    #[test]
    fn test_rows_layout() {
        let transform = Transform2D::new(Vec2::new(3.0, 4.0), FRAC_PI_2, Vec2::new(2.0, 1.0));
        let [x_axis, y_axis, origin] = transform.rows();

        // x axis is rotated a quarter turn and scaled by 2
        assert_abs_diff_eq!(x_axis[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(x_axis[1], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_axis[0], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y_axis[1], 0.0, epsilon = 1e-6);
        assert_eq!(origin, [3.0, 4.0]);
    }

    #[test]
    fn test_transform_point() {
        let transform = Transform2D::new(Vec2::new(1.0, 0.0), FRAC_PI_2, Vec2::ONE);
        let p = transform.transform_point(Vec2::new(1.0, 0.0));
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_model_uniform_columns() {
        let transform = Transform2D::from_position(Vec2::new(5.0, -2.0));
        let uniform = ModelUniform::new(&transform);
        assert_eq!(uniform.model[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.model[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniform.origin(), Vec2::new(5.0, -2.0));
        assert_eq!(bytemuck::bytes_of(&uniform).len(), 48);
    }
}
