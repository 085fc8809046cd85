// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{Dataset, DriverManager, Metadata};

use crate::error::PipelineError;
use crate::processing::{IndexRaster, MaskRaster, NODATA};

/// Persists an index raster as a single-band float32 GTiff with the
/// source tile's georeferencing and a -999 nodata value.
pub fn write_index_raster(index: &IndexRaster, path: &Path) -> Result<(), PipelineError> {
    let driver = DriverManager::get_driver_by_name("GTiff")
        .map_err(|e| PipelineError::OutputWriteFailure(e.to_string()))?;
    let creation_options = RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "TILED=YES"]);

    let write = || -> gdal::errors::Result<()> {
        let mut output = driver.create_with_band_type_with_options::<f32, _>(
            path,
            index.geo.width,
            index.geo.height,
            1,
            &creation_options,
        )?;
        output.set_projection(&index.geo.projection)?;
        output.set_geo_transform(&index.geo.geo_transform)?;

        let mut band = output.rasterband(1)?;
        band.set_no_data_value(Some(NODATA as f64))?;
        band.set_description("normalized difference")?;

        let mut buffer = Buffer::new((index.geo.width, index.geo.height), index.data.clone());
        band.write((0, 0), (index.geo.width, index.geo.height), &mut buffer)?;
        drop(band);
        output.flush_cache()?;
        Ok(())
    };

    write().map_err(|e| {
        PipelineError::OutputWriteFailure(format!("{}: {}", path.display(), e))
    })
}

/// Loads a mask raster into an in-memory byte dataset so GDAL's
/// geometry tracing can run over it. Nodata is 0, matching the
/// background class.
pub fn mask_to_mem_dataset(mask: &MaskRaster) -> Result<Dataset, PipelineError> {
    let driver = DriverManager::get_driver_by_name("MEM")
        .map_err(|e| PipelineError::OutputWriteFailure(e.to_string()))?;

    let mut dataset =
        driver.create_with_band_type::<u8, _>("", mask.geo.width, mask.geo.height, 1)?;
    dataset.set_projection(&mask.geo.projection)?;
    dataset.set_geo_transform(&mask.geo.geo_transform)?;

    let mut band = dataset.rasterband(1)?;
    band.set_no_data_value(Some(0.0))?;
    let mut buffer = Buffer::new((mask.geo.width, mask.geo.height), mask.data.clone());
    band.write((0, 0), (mask.geo.width, mask.geo.height), &mut buffer)?;

    drop(band);
    Ok(dataset)
}
