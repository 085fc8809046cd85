// src/io/vector.rs
use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::raster::RasterCreationOptions;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldDefn, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use gdal::{Dataset, DriverManager};

use crate::error::PipelineError;
use crate::io::writer::mask_to_mem_dataset;
use crate::processing::{Connectivity, MaskRaster};

/// Traces every non-zero region of a mask into polygons and attaches a
/// planar `area` field to each, computed from the traced geometry in
/// the raster's georeferenced units. The mask band doubles as its own
/// validity mask, so background pixels yield no polygons.
///
/// Returns an in-memory vector dataset holding a single layer. Either
/// the whole raster polygonizes or the call fails; there is no partial
/// output.
pub fn polygonize(
    mask: &MaskRaster,
    connectivity: Connectivity,
    layer_name: &str,
) -> Result<Dataset, PipelineError> {
    let raster = mask_to_mem_dataset(mask)?;

    let driver = DriverManager::get_driver_by_name("Memory")
        .map_err(|e| PipelineError::PolygonizeFailure(e.to_string()))?;
    let mut vectors = driver
        .create_vector_only("")
        .map_err(|e| PipelineError::PolygonizeFailure(e.to_string()))?;

    let srs = SpatialRef::from_wkt(&mask.geo.projection).ok();
    let mut layer = vectors.create_layer(LayerOptions {
        name: layer_name,
        srs: srs.as_ref(),
        ty: OGRwkbGeometryType::wkbPolygon,
        ..Default::default()
    })?;
    let area_field = FieldDefn::new("area", OGRFieldType::OFTReal)?;
    area_field.add_to_layer(&layer)?;

    let mut options = CslStringList::new();
    if connectivity == Connectivity::Eight {
        options
            .add_string("8CONNECTED=8")
            .map_err(|e| PipelineError::PolygonizeFailure(e.to_string()))?;
    }

    let band = raster.rasterband(1)?;
    let rv = unsafe {
        gdal_sys::GDALPolygonize(
            band.c_rasterband(),
            band.c_rasterband(),
            layer.c_layer(),
            -1,
            options.as_ptr(),
            None,
            std::ptr::null_mut(),
        )
    };
    if rv != gdal_sys::CPLErr::CE_None {
        return Err(PipelineError::PolygonizeFailure(format!(
            "geometry tracing returned CPLErr {rv}"
        )));
    }

    let fids: Vec<u64> = layer.features().filter_map(|f| f.fid()).collect();
    for fid in fids {
        let mut feature = layer.feature(fid).ok_or_else(|| {
            PipelineError::PolygonizeFailure(format!("feature {fid} vanished during area update"))
        })?;
        let area = feature.geometry().map(|g| g.area()).unwrap_or(0.0);
        feature.set_field_double("area", area)?;
        layer.set_feature(feature)?;
    }

    drop(layer);
    Ok(vectors)
}

/// Persists a polygon dataset as an ESRI Shapefile, replacing any
/// previous run's files at the same path.
pub fn save_shapefile(vectors: &Dataset, path: &Path) -> Result<(), PipelineError> {
    remove_stale_shapefile(path);

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")
        .map_err(|e| PipelineError::OutputWriteFailure(e.to_string()))?;
    let no_options = RasterCreationOptions::from_iter(Vec::<String>::new());
    vectors
        .create_copy(&driver, path, &no_options)
        .map_err(|e| {
            PipelineError::OutputWriteFailure(format!("{}: {}", path.display(), e))
        })?;
    Ok(())
}

// The shapefile driver refuses to overwrite sidecar files in place.
fn remove_stale_shapefile(path: &Path) {
    for ext in ["shp", "shx", "dbf", "prj"] {
        let sidecar = path.with_extension(ext);
        if sidecar.is_file() {
            let _ = std::fs::remove_file(sidecar);
        }
    }
}
