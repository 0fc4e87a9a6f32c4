//! Pose Value Types
//!
//! Plain `f32` value types matching the wire representation of poses and
//! transforms, plus validation for state received off the wire.

use serde::{Deserialize, Serialize};

/// Tolerance for the unit-length check on rotations
const ROTATION_NORM_TOLERANCE: f32 = 1e-4;

/// 3-component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

/// Position and rotation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Check that the pose is safe to apply to the scene
    pub fn validate(&self) -> Result<(), ValidateError> {
        if !self.position.is_finite() {
            return Err(ValidateError::NonFinite { field: "position" });
        }
        if !self.rotation.is_finite() {
            return Err(ValidateError::NonFinite { field: "rotation" });
        }
        let norm = self.rotation.norm();
        if (norm - 1.0).abs() > ROTATION_NORM_TOLERANCE {
            return Err(ValidateError::DenormalizedRotation { norm });
        }
        Ok(())
    }
}

/// Local position, rotation and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub const fn from_pose(pose: Pose, scale: Vec3) -> Self {
        Self::new(pose.position, pose.rotation, scale)
    }

    /// The pose part, without scale
    pub const fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Check that the transform is safe to apply to the scene
    pub fn validate(&self) -> Result<(), ValidateError> {
        self.pose().validate()?;
        if !self.scale.is_finite() {
            return Err(ValidateError::NonFinite { field: "scale" });
        }
        Ok(())
    }
}

/// Validation failure for state received off the wire
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ValidateError {
    #[error("non-finite component in {field}")]
    NonFinite { field: &'static str },

    #[error("rotation is not unit length (norm {norm})")]
    DenormalizedRotation { norm: f32 },
}
