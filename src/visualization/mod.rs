#[cfg(feature = "viewer")]
pub mod osc_vis2d;
