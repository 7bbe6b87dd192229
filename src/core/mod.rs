//! Core raster algorithms: reprojection planning, warping, reading and
//! fusing.

pub mod fuse;
pub mod load;
pub mod paste;
pub mod read;
pub mod reproject_roi;
pub mod resample;
pub mod warp;

pub use fuse::{default_fuser, reproject_and_fuse, ProgressFn};
pub use load::{load, LoadedData, SourceGroup};
pub use paste::{can_paste, SCALE_TOL, TRANSLATION_TOL, TRANSLATION_TOL_NN};
pub use read::{pick_read_scale, read_time_slice, read_time_slice_to_buffer};
pub use reproject_roi::{compute_reproject_roi, PixelTransform, ReprojectRoi};
pub use warp::{reproject, reproject_to_new, warp_affine};
