//! Bulk loading of measurements onto a destination grid.
//!
//! `load` drives a [`ReaderDriver`] over groups of time-stamped sources and
//! assembles one `(time, y, x)` cube per measurement, fusing the bands of
//! each group with the measurement's fuse policy.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ndarray::{s, Array2, Array3};

use crate::core::fuse::default_fuser;
use crate::core::read::read_time_slice_to_buffer;
use crate::geometry::GeoBox;
use crate::io::driver::ReaderDriver;
use crate::types::{BandInfo, Measurement, Pixel, RasterResult};

/// All the bands contributing to one output time slot, keyed by measurement
/// name. A measurement may list several bands when overlapping datasets were
/// grouped into the same slot.
#[derive(Debug, Clone, Default)]
pub struct SourceGroup {
    pub time: DateTime<Utc>,
    pub bands: HashMap<String, Vec<BandInfo>>,
}

impl SourceGroup {
    pub fn new(time: DateTime<Utc>) -> Self {
        SourceGroup {
            time,
            bands: HashMap::new(),
        }
    }

    pub fn with_band(mut self, measurement: impl Into<String>, band: BandInfo) -> Self {
        self.bands.entry(measurement.into()).or_default().push(band);
        self
    }
}

/// Result of a bulk load: one `(time, y, x)` array per measurement, all on
/// the same grid.
#[derive(Debug, Clone)]
pub struct LoadedData<T: Pixel> {
    pub geobox: GeoBox,
    pub times: Vec<DateTime<Utc>>,
    pub measurements: HashMap<String, Array3<T>>,
}

impl<T: Pixel> LoadedData<T> {
    pub fn measurement(&self, name: &str) -> Option<&Array3<T>> {
        self.measurements.get(name)
    }
}

/// Load every measurement for every source group onto `dst_gbox`.
///
/// The driver is handed the full band list up front so it can prepare shared
/// state (open file pools, page caches); passing the context returned by a
/// previous call lets consecutive loads reuse it.
///
/// Bands within a group fuse in list order; pixels no band covers hold the
/// measurement's nodata. With `skip_broken_datasets` a band that fails to
/// open or read is logged and skipped, otherwise the load aborts.
pub fn load<T: Pixel, D: ReaderDriver<T>>(
    sources: &[SourceGroup],
    dst_gbox: &GeoBox,
    measurements: &[Measurement<T>],
    driver: &D,
    prev_ctx: Option<D::Context>,
    skip_broken_datasets: bool,
) -> RasterResult<(LoadedData<T>, D::Context)> {
    let all_bands: Vec<BandInfo> = sources
        .iter()
        .flat_map(|g| g.bands.values().flatten().cloned())
        .collect();
    let ctx = driver.new_load_context(&all_bands, prev_ctx);

    let (height, width) = dst_gbox.shape();
    let n_times = sources.len();
    let mut out: HashMap<String, Array3<T>> = HashMap::new();

    for m in measurements {
        let mut cube = Array3::from_elem((n_times, height, width), m.nodata);

        for (t, group) in sources.iter().enumerate() {
            let bands = match group.bands.get(&m.name) {
                Some(bands) => bands,
                None => continue,
            };
            let mut slot = cube.slice_mut(s![t, .., ..]);

            for band in bands {
                let result = driver
                    .open(band, &ctx)
                    .result()
                    .and_then(|mut rdr| {
                        read_time_slice_to_buffer(rdr.as_mut(), dst_gbox, m.resampling, m.nodata)
                    });
                let (pix, roi) = match result {
                    Ok(r) => r,
                    Err(e) if skip_broken_datasets => {
                        log::warn!("skipping broken band '{}': {}", band.uri, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let pix: Array2<T> = match pix {
                    Some(pix) => pix,
                    None => continue,
                };

                let dst_slice = slot.slice_mut(s![roi.rows(), roi.cols()]);
                match m.fuser {
                    Some(fuse) => fuse(dst_slice, pix.view()),
                    None => default_fuser(dst_slice, pix.view(), m.nodata),
                }
            }
        }

        out.insert(m.name.clone(), cube);
    }

    let loaded = LoadedData {
        geobox: *dst_gbox,
        times: sources.iter().map(|g| g.time).collect(),
        measurements: out,
    };
    Ok((loaded, ctx))
}
