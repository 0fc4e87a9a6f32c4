//! Epsilon Equality
//!
//! Component-wise approximate comparison used to decide whether state has
//! changed enough to be worth re-sending.

use crate::types::{Pose, Quat, Transform, Vec3};

/// Per-component tolerance for change detection
pub const EPSILON: f32 = f32::EPSILON;

/// Component-wise approximate equality
pub trait EpsilonEq {
    fn epsilon_eq(&self, other: &Self) -> bool;
}

impl EpsilonEq for f32 {
    fn epsilon_eq(&self, other: &Self) -> bool {
        (self - other).abs() < EPSILON
    }
}

impl EpsilonEq for Vec3 {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.x.epsilon_eq(&other.x) && self.y.epsilon_eq(&other.y) && self.z.epsilon_eq(&other.z)
    }
}

impl EpsilonEq for Quat {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.x.epsilon_eq(&other.x)
            && self.y.epsilon_eq(&other.y)
            && self.z.epsilon_eq(&other.z)
            && self.w.epsilon_eq(&other.w)
    }
}

impl EpsilonEq for Pose {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.position.epsilon_eq(&other.position) && self.rotation.epsilon_eq(&other.rotation)
    }
}

impl EpsilonEq for Transform {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.position.epsilon_eq(&other.position)
            && self.rotation.epsilon_eq(&other.rotation)
            && self.scale.epsilon_eq(&other.scale)
    }
}

impl<T: EpsilonEq> EpsilonEq for [T] {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.epsilon_eq(b))
    }
}

impl<T: EpsilonEq> EpsilonEq for Vec<T> {
    fn epsilon_eq(&self, other: &Self) -> bool {
        self.as_slice().epsilon_eq(other.as_slice())
    }
}

/// Overwrite `dst` with `src` in place, reusing existing capacity:
/// truncate the surplus, overwrite the common prefix, append the rest.
pub fn copy_points(dst: &mut Vec<Vec3>, src: &[Vec3]) {
    dst.truncate(src.len());
    let common = dst.len();
    dst[..common].copy_from_slice(&src[..common]);
    dst.extend_from_slice(&src[common..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_identical_transforms_compare_equal() {
        let a = Transform::default();
        let mut b = Transform::default();
        b.position.x += EPSILON / 2.0;

        assert!(a.epsilon_eq(&b));

        b.position.x = 0.001;
        assert!(!a.epsilon_eq(&b));
    }

    #[test]
    fn test_rotation_change_detected() {
        let a = Pose::default();
        let b = Pose::new(Vec3::ZERO, Quat::new(0.0, 0.1, 0.0, 0.995));

        assert!(!a.epsilon_eq(&b));
    }

    #[test]
    fn test_slices_of_different_lengths_differ() {
        let a = vec![Vec3::ZERO, Vec3::ONE];
        let b = vec![Vec3::ZERO];

        assert!(!a.epsilon_eq(&b));
        assert!(a.epsilon_eq(&a.clone()));
    }

    #[test]
    fn test_copy_points_shrinks_and_grows() {
        let mut dst = vec![Vec3::ONE; 4];

        copy_points(&mut dst, &[Vec3::new(1.0, 2.0, 3.0)]);
        assert_eq!(dst, vec![Vec3::new(1.0, 2.0, 3.0)]);

        let src: Vec<Vec3> = (0..3).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        copy_points(&mut dst, &src);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_points_empty_source_clears() {
        let mut dst = vec![Vec3::ONE; 2];
        copy_points(&mut dst, &[]);
        assert!(dst.is_empty());
    }
}
