//! tickbridge pose
//!
//! Pose and transform value types for network state synchronization.
//!
//! Senders compare the current local state against the last state they put
//! on the wire with [`EpsilonEq`] and skip the update when nothing moved;
//! receivers validate incoming values before applying them to the scene.

mod epsilon;
mod types;

pub use epsilon::{copy_points, EpsilonEq, EPSILON};
pub use types::{Pose, Quat, Transform, ValidateError, Vec3};
