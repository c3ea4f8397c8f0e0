pub mod overlay;
pub mod skeleton;

pub use overlay::{angle_label, status_label, Axis, OverlayModel, RomBar, Segment};
pub use skeleton::SKELETON_CONNECTIONS;
