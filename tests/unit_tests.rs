// tests/unit_tests.rs
use ndwi_extract::batch::{threshold_tag, tile_id, tile_name};
use ndwi_extract::io::GeoInfo;
use ndwi_extract::processing::index::normalized_difference_row;
use ndwi_extract::processing::{classify, sieve, Connectivity, IndexRaster, MaskRaster, NODATA};

/// Synthetic georeferencing for in-memory rasters.
fn geo(width: usize, height: usize) -> GeoInfo {
    GeoInfo {
        projection: String::new(),
        geo_transform: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
        width,
        height,
    }
}

fn index_raster(data: Vec<f32>, width: usize, height: usize) -> IndexRaster {
    IndexRaster::new(data, geo(width, height))
}

fn mask_raster(data: Vec<u8>, width: usize, height: usize) -> MaskRaster {
    MaskRaster::new(data, geo(width, height))
}

/// Flood-fill region sizes, for verifying sieve output independently.
fn region_sizes(mask: &MaskRaster, connectivity: Connectivity) -> Vec<(u8, usize)> {
    let (w, h) = (mask.geo.width, mask.geo.height);
    let mut seen = vec![false; mask.data.len()];
    let mut regions = Vec::new();
    for start in 0..mask.data.len() {
        if seen[start] {
            continue;
        }
        let value = mask.data[start];
        let mut size = 0;
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(at) = stack.pop() {
            size += 1;
            let (x, y) = ((at % w) as isize, (at / w) as isize);
            let neighbors: &[(isize, isize)] = match connectivity {
                Connectivity::Four => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
                Connectivity::Eight => &[
                    (-1, 0),
                    (1, 0),
                    (0, -1),
                    (0, 1),
                    (-1, -1),
                    (1, -1),
                    (-1, 1),
                    (1, 1),
                ],
            };
            for (dx, dy) in neighbors {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let ni = ny as usize * w + nx as usize;
                if !seen[ni] && mask.data[ni] == value {
                    seen[ni] = true;
                    stack.push(ni);
                }
            }
        }
        regions.push((value, size));
    }
    regions
}

#[test]
fn test_normalized_difference_row() {
    let row1 = [10.0, 3000.0, 5.0, 0.0];
    let row2 = [5.0, 3000.0, 10.0, 0.0];
    let mut out = [0.0f32; 4];
    normalized_difference_row(&row1, &row2, &mut out);

    assert!((out[0] - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(out[1], 0.0);
    assert!((out[2] + 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(out[3], NODATA); // zero-sum pixel is nodata, not NaN
}

#[test]
fn test_normalized_difference_never_nan() {
    let row1 = [0.0, -5.0, f32::INFINITY];
    let row2 = [0.0, 5.0, 1.0];
    let mut out = [0.0f32; 3];
    normalized_difference_row(&row1, &row2, &mut out);
    assert!(out.iter().all(|v| v.is_finite()));
    assert_eq!(out[1], NODATA);
    assert_eq!(out[2], NODATA);
}

#[test]
fn test_classify_thresholds() {
    let index = index_raster(vec![1.0 / 3.0; 4], 2, 2);

    let low = classify(&index, 0.3).unwrap();
    assert_eq!(low.data, vec![1, 1, 1, 1]);

    let high = classify(&index, 0.4).unwrap();
    assert_eq!(high.data, vec![0, 0, 0, 0]);
}

#[test]
fn test_classify_nodata_is_background() {
    let index = index_raster(vec![0.5, NODATA, -0.2, NODATA], 2, 2);
    let mask = classify(&index, -1.0).unwrap();
    // NODATA is numerically below any threshold too, but must be 0 by rule
    assert_eq!(mask.data, vec![1, 0, 1, 0]);
}

#[test]
fn test_classify_idempotent_on_binary() {
    let binary = vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
    let index = index_raster(binary.clone(), 3, 2);
    let mask = classify(&index, 0.5).unwrap();
    let expected: Vec<u8> = binary.iter().map(|&v| v as u8).collect();
    assert_eq!(mask.data, expected);
}

#[test]
fn test_sieve_min_one_is_noop() {
    let mask = mask_raster(vec![0, 1, 0, 1, 1, 0, 0, 0, 1], 3, 3);
    let out = sieve(&mask, 1, Connectivity::Four).unwrap();
    assert_eq!(out.data, mask.data);
}

#[test]
fn test_sieve_isolated_pixel_merges_into_background() {
    let mut data = vec![0u8; 16];
    data[5] = 1; // single foreground pixel in a 4x4 tile
    let mask = mask_raster(data, 4, 4);

    let out = sieve(&mask, 2, Connectivity::Four).unwrap();
    assert_eq!(out.foreground_count(), 0);
}

#[test]
fn test_sieve_mass_conservation() {
    let data = vec![
        0, 1, 1, 0, //
        1, 0, 0, 1, //
        0, 0, 1, 1, //
        1, 0, 0, 0,
    ];
    let mask = mask_raster(data, 4, 4);
    let out = sieve(&mask, 3, Connectivity::Four).unwrap();

    let before: usize = region_sizes(&mask, Connectivity::Four)
        .iter()
        .map(|(_, s)| s)
        .sum();
    let after: usize = region_sizes(&out, Connectivity::Four)
        .iter()
        .map(|(_, s)| s)
        .sum();
    assert_eq!(before, 16);
    assert_eq!(after, 16);
}

#[test]
fn test_sieve_removes_all_small_regions() {
    let data = vec![
        1, 1, 0, 1, //
        1, 0, 0, 0, //
        0, 0, 1, 0, //
        1, 0, 0, 0,
    ];
    let mask = mask_raster(data, 4, 4);
    let out = sieve(&mask, 3, Connectivity::Four).unwrap();
    for (_, size) in region_sizes(&out, Connectivity::Four) {
        assert!(size >= 3, "surviving region smaller than minimum");
    }
}

#[test]
fn test_sieve_tie_breaks_to_lowest_label() {
    // Middle pixel shares a border of 1 with both sides; the
    // earlier-labeled left region must absorb it.
    let mask = mask_raster(vec![1, 1, 0, 2, 2], 5, 1);
    let out = sieve(&mask, 2, Connectivity::Four).unwrap();
    assert_eq!(out.data, vec![1, 1, 1, 2, 2]);
}

#[test]
fn test_sieve_region_without_neighbor_survives() {
    // One region covering the whole raster has nothing to merge into.
    let mask = mask_raster(vec![1; 4], 2, 2);
    let out = sieve(&mask, 8, Connectivity::Four).unwrap();
    assert_eq!(out.data, vec![1; 4]);
}

#[test]
fn test_sieve_connectivity_modes() {
    // Diagonal pair of foreground pixels: one region under 8-conn,
    // two single-pixel regions under 4-conn.
    let mask = mask_raster(vec![1, 0, 0, 1], 2, 2);

    let eight = sieve(&mask, 2, Connectivity::Eight).unwrap();
    assert_eq!(eight.data, mask.data);

    let four = sieve(&mask, 2, Connectivity::Four).unwrap();
    assert_eq!(four.foreground_count(), 0);
}

#[test]
fn test_sieve_chain_merging_reaches_minimum() {
    // Three adjacent single-pixel regions of distinct values collapse
    // into one region meeting the minimum.
    let mask = mask_raster(vec![5, 7, 9], 3, 1);
    let out = sieve(&mask, 2, Connectivity::Four).unwrap();
    let regions = region_sizes(&out, Connectivity::Four);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].1, 3);
}

#[test]
fn test_sieve_rejects_zero_minimum() {
    let mask = mask_raster(vec![0; 4], 2, 2);
    assert!(sieve(&mask, 0, Connectivity::Four).is_err());
}

#[test]
fn test_threshold_tag() {
    assert_eq!(threshold_tag(0.01), "p0_010");
    assert_eq!(threshold_tag(0.005), "p0_005");
    assert_eq!(threshold_tag(-0.5), "n0_500");
    assert_eq!(threshold_tag(0.0), "o0_000");
    assert_eq!(threshold_tag(1.0), "p1_000");
}

#[test]
fn test_tile_naming() {
    let path = std::path::Path::new("/data/T22KGA_20161226.tif");
    let name = tile_name(path);
    assert_eq!(name, "T22KGA_20161226");
    assert_eq!(tile_id(&name), "T22KGA");
    assert_eq!(tile_id("plain"), "plain");
}

#[test]
fn test_parse_thresholds() {
    use ndwi_extract::cli::parse_thresholds;
    assert_eq!(
        parse_thresholds("0,0.01,0.005").unwrap(),
        vec![0.0, 0.01, 0.005]
    );
    assert_eq!(parse_thresholds("-0.1, 0.1").unwrap(), vec![-0.1, 0.1]);
    assert!(parse_thresholds("0.1,abc").is_err());
}
