//! Reader and source traits: the boundary between the pipeline and
//! format-specific decode code.
//!
//! A `RasterSource` is a cheap handle that can be opened into a
//! `RasterReader` bound to one band; readers are opened for exactly one
//! decode and dropped afterwards. Pooling, if any, lives behind the driver
//! layer, not here.

use ndarray::Array2;

use crate::geometry::{Affine, Crs, Roi};
use crate::types::{Pixel, RasterResult};

/// Window specification for one read.
///
/// `window == None` means the full frame; `out_shape == None` means native
/// resolution. Decimated ("overview") reads request a smaller `out_shape`
/// than the window covers. `extra_dim_index` addresses one layer of a
/// stacked extra dimension (e.g. a time axis inside one file).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadArgs {
    pub window: Option<Roi>,
    pub out_shape: Option<(usize, usize)>,
    pub extra_dim_index: Option<usize>,
}

impl ReadArgs {
    /// Collapse a full-frame window / native shape to `None` so readers can
    /// take their cheapest path.
    pub fn normalized(roi: Roi, shape: (usize, usize), reader_shape: (usize, usize)) -> Self {
        let window = if roi.is_full(reader_shape) {
            None
        } else {
            Some(roi)
        };
        let out_shape = if window.is_none() && shape == reader_shape {
            None
        } else {
            Some(shape)
        };
        Self {
            window,
            out_shape,
            extra_dim_index: None,
        }
    }

    pub fn with_extra_dim_index(mut self, idx: Option<usize>) -> Self {
        self.extra_dim_index = idx;
        self
    }
}

/// An opened reader bound to one source band.
pub trait RasterReader<T: Pixel> {
    /// `(rows, cols)` of the band.
    fn shape(&self) -> (usize, usize);

    fn crs(&self) -> Crs;

    /// Pixel→CRS geotransform.
    fn transform(&self) -> Affine;

    fn nodata(&self) -> Option<T>;

    /// Whether this source can service the direct strided-copy path.
    ///
    /// A capability, not a type test: sources whose decode cannot do
    /// windowed/strided reads efficiently opt out and always get warped.
    fn supports_paste(&self) -> bool {
        true
    }

    /// Decode one window, optionally decimated to `out_shape`.
    fn read(&mut self, args: ReadArgs) -> RasterResult<Array2<T>>;
}

/// An unopened handle to one band of one dataset.
pub trait RasterSource<T: Pixel> {
    /// Open for a single decode. The reader may borrow from the source.
    fn open(&self) -> RasterResult<Box<dyn RasterReader<T> + '_>>;
}
