//! End-to-end pipeline tests: reproject, read, fuse and load against
//! in-memory sources.

use chrono::{TimeZone, Utc};
use ndarray::{array, s, Array2};

use rastercube::core::{
    can_paste, compute_reproject_roi, read_time_slice, reproject_and_fuse, SCALE_TOL,
    TRANSLATION_TOL,
};
use rastercube::io::MemoryDriver;
use rastercube::{
    load, Affine, BandInfo, Crs, GeoBox, Measurement, MemorySource, RasterSource, Resampling,
    SourceGroup,
};

fn gbox(width: usize, height: usize, res: f64, ox: f64, oy: f64) -> GeoBox {
    GeoBox::new(
        width,
        height,
        Affine::new(res, 0.0, ox, 0.0, -res, oy),
        Crs::epsg(3577),
    )
    .unwrap()
}

fn ramp(h: usize, w: usize) -> Array2<f64> {
    let mut a = Array2::zeros((h, w));
    for (i, v) in a.iter_mut().enumerate() {
        *v = i as f64;
    }
    a
}

/// Two adjacent half-tiles fuse into one seamless composite.
#[test]
fn test_two_tile_seam() {
    let _ = env_logger::builder().is_test(true).try_init();

    let dst_gbox = gbox(10, 10, 10.0, 0.0, 100.0);

    // tile A covers x in [0, 50), tile B covers x in [50, 100)
    let tile_a = MemorySource::new(
        Array2::from_elem((10, 5), 1.0),
        Affine::new(10.0, 0.0, 0.0, 0.0, -10.0, 100.0),
        Crs::epsg(3577),
        Some(-1.0),
    );
    let tile_b = MemorySource::new(
        Array2::from_elem((10, 5), 2.0),
        Affine::new(10.0, 0.0, 50.0, 0.0, -10.0, 100.0),
        Crs::epsg(3577),
        Some(-1.0),
    );

    let mut dst = Array2::from_elem((10, 10), 0.0);
    reproject_and_fuse(
        &[&tile_a as &dyn RasterSource<f64>, &tile_b],
        dst.view_mut(),
        &dst_gbox,
        -1.0,
        Resampling::Nearest,
        None,
        false,
        None,
    )
    .unwrap();

    // seam at column 5, no gaps and no overlap artefacts
    assert!(dst.slice(s![.., ..5]).iter().all(|&v| v == 1.0));
    assert!(dst.slice(s![.., 5..]).iter().all(|&v| v == 2.0));
}

/// A 2x finer source on the same lattice reads through the direct-copy
/// path with decimation, no resampling involved.
#[test]
fn test_decimated_paste() {
    let src_gbox = gbox(20, 20, 5.0, 0.0, 100.0);
    let dst_gbox = gbox(10, 10, 10.0, 0.0, 100.0);

    let rr = compute_reproject_roi(&src_gbox, &dst_gbox).unwrap();
    assert!(rr.is_st());
    assert!((rr.scale - 2.0).abs() < 1e-9);
    assert_eq!(can_paste(&rr, SCALE_TOL, TRANSLATION_TOL), Ok(()));

    let src = MemorySource::new(
        ramp(20, 20),
        src_gbox.transform(),
        src_gbox.crs(),
        Some(-1.0),
    );
    let mut dst = Array2::from_elem((10, 10), -1.0);
    let mut rdr = src.open().unwrap();
    let roi = read_time_slice(
        rdr.as_mut(),
        dst.view_mut(),
        &dst_gbox,
        Resampling::Nearest,
        -1.0,
        None,
    )
    .unwrap();

    assert!(roi.is_full((10, 10)));
    // each output pixel holds the centre of its 2x2 source block
    for r in 0..10 {
        for c in 0..10 {
            assert_eq!(dst[(r, c)], ((2 * r + 1) * 20 + 2 * c + 1) as f64);
        }
    }
}

/// The same decimated read through the warp path gives the same pixels
/// for nearest resampling.
#[test]
fn test_decimated_warp_matches_paste() {
    let src_gbox = gbox(20, 20, 5.0, 0.0, 100.0);
    let dst_gbox = gbox(10, 10, 10.0, 0.0, 100.0);

    let read = |src: MemorySource<f64>| {
        let mut dst = Array2::from_elem((10, 10), -1.0);
        let mut rdr = src.open().unwrap();
        read_time_slice(
            rdr.as_mut(),
            dst.view_mut(),
            &dst_gbox,
            Resampling::Nearest,
            -1.0,
            None,
        )
        .unwrap();
        dst
    };

    let pasted = read(MemorySource::new(
        ramp(20, 20),
        src_gbox.transform(),
        src_gbox.crs(),
        Some(-1.0),
    ));
    let warped = read(
        MemorySource::new(
            ramp(20, 20),
            src_gbox.transform(),
            src_gbox.crs(),
            Some(-1.0),
        )
        .without_paste(),
    );

    assert_eq!(pasted, warped);
}

/// A rotated source goes through the warp path, filling only the pixels
/// its footprint covers.
#[test]
fn test_rotated_source_warp() {
    let dst_gbox = gbox(10, 10, 10.0, 0.0, 100.0);
    let (s, c) = 15f64.to_radians().sin_cos();
    let src = MemorySource::new(
        Array2::from_elem((10, 10), 7.0),
        Affine::new(10.0 * c, 10.0 * s, 0.0, 10.0 * s, -10.0 * c, 100.0),
        Crs::epsg(3577),
        Some(-1.0),
    );

    let mut dst = Array2::from_elem((10, 10), 0.0);
    reproject_and_fuse(
        &[&src as &dyn RasterSource<f64>],
        dst.view_mut(),
        &dst_gbox,
        -1.0,
        Resampling::Nearest,
        None,
        false,
        None,
    )
    .unwrap();

    // top-left pixel is inside the rotated footprint, the far corner is not
    assert_eq!(dst[(0, 0)], 7.0);
    assert_eq!(dst[(9, 9)], -1.0);
    // every pixel is either a source value or nodata
    assert!(dst.iter().all(|&v| v == 7.0 || v == -1.0));
}

/// Reading across a CRS boundary fills the overlap through point-wise
/// reprojection.
#[test]
fn test_cross_crs_read() {
    // one-degree square near Sydney in geographic coordinates
    let src = MemorySource::new(
        Array2::from_elem((100, 100), 3.0),
        Affine::new(0.01, 0.0, 151.0, 0.0, -0.01, -33.0),
        Crs::epsg(4326),
        Some(-1.0),
    );
    // its Web Mercator neighbourhood
    let dst_gbox = GeoBox::new(
        100,
        100,
        Affine::new(1200.0, 0.0, 16_800_000.0, 0.0, -1200.0, -3_880_000.0),
        Crs::epsg(3857),
    )
    .unwrap();

    let mut dst = Array2::from_elem((100, 100), -1.0);
    let mut rdr = src.open().unwrap();
    let roi = read_time_slice(
        rdr.as_mut(),
        dst.view_mut(),
        &dst_gbox,
        Resampling::Bilinear,
        -1.0,
        None,
    )
    .unwrap();

    assert!(!roi.is_empty());
    assert!(dst.iter().filter(|&&v| v == 3.0).count() > 300);
}

/// Full load: two time slots, overlapping bands in the first one.
#[test]
fn test_load_cube() {
    let g = gbox(6, 6, 10.0, 0.0, 60.0);

    let mut left = Array2::from_elem((6, 6), -1.0);
    left.slice_mut(s![.., ..3]).fill(1.0);

    let mut driver = MemoryDriver::new();
    driver.insert(
        "mem://left",
        MemorySource::new(left, g.transform(), g.crs(), Some(-1.0)),
    );
    driver.insert(
        "mem://full",
        MemorySource::new(
            Array2::from_elem((6, 6), 2.0),
            g.transform(),
            g.crs(),
            Some(-1.0),
        ),
    );

    let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap();
    let sources = vec![
        SourceGroup::new(t1)
            .with_band("red", BandInfo::new("mem://left", 1))
            .with_band("red", BandInfo::new("mem://full", 1)),
        SourceGroup::new(t2).with_band("red", BandInfo::new("mem://full", 1)),
    ];

    let (data, ctx) = load(
        &sources,
        &g,
        &[Measurement::new("red", -1.0)],
        &driver,
        None,
        false,
    )
    .unwrap();

    assert_eq!(data.times, vec![t1, t2]);
    let red = data.measurement("red").unwrap();
    assert_eq!(red.dim(), (2, 6, 6));
    // slot 1: left tile wins where it has data, the full tile fills the rest
    assert!(red.slice(s![0, .., ..3]).iter().all(|&v| v == 1.0));
    assert!(red.slice(s![0, .., 3..]).iter().all(|&v| v == 2.0));
    // slot 2: single full tile
    assert!(red.slice(s![1, .., ..]).iter().all(|&v| v == 2.0));
    assert_eq!(ctx.bands_prepared, 3);
}

/// Sub-pixel misalignment falls back to warping instead of pasting and
/// still produces sensible nearest-neighbour output.
#[test]
fn test_subpixel_shift_warps() {
    let src_gbox = GeoBox::new(
        10,
        10,
        Affine::new(10.0, 0.0, 3.0, 0.0, -10.0, 100.0),
        Crs::epsg(3577),
    )
    .unwrap();
    let dst_gbox = gbox(10, 10, 10.0, 0.0, 100.0);

    let rr = compute_reproject_roi(&src_gbox, &dst_gbox).unwrap();
    assert!(rr.is_st());
    assert_eq!(
        can_paste(&rr, SCALE_TOL, TRANSLATION_TOL),
        Err("sub-pixel translation")
    );

    let src = MemorySource::new(
        array![[1.0, 2.0], [3.0, 4.0]],
        Affine::new(10.0, 0.0, 3.0, 0.0, -10.0, 100.0),
        Crs::epsg(3577),
        Some(-1.0),
    );
    let dst_gbox = gbox(2, 2, 10.0, 0.0, 100.0);
    let mut dst = Array2::from_elem((2, 2), -1.0);
    let mut rdr = src.open().unwrap();
    read_time_slice(
        rdr.as_mut(),
        dst.view_mut(),
        &dst_gbox,
        Resampling::Nearest,
        -1.0,
        None,
    )
    .unwrap();

    // dst pixel centres land 0.3 pixels left of the source centres, so
    // nearest snaps each one to the source column it falls in
    assert_eq!(dst, array![[1.0, 2.0], [3.0, 4.0]]);
}
