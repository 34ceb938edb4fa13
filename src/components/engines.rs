use std::path::{Path, PathBuf};

use crate::{
    components::{
        band::{Band, BandInfo},
        file::{DriverInfo, File},
        metadata::{DatasetMetadata, MetadataEntry},
        GeoTransform, Metadata,
    },
    errors::Result,
};

/// Implementations for gdal
pub mod gdal_engine {
    use super::*;
    use gdal::{
        raster::RasterBand, Dataset as GdalDataset, Metadata as GdalMetadata,
        MetadataEntry as GdalMetadataEntry,
    };
    use log::debug;
    use ndarray::Array2;

    fn entries_gdal(metadata: &impl GdalMetadata) -> impl Iterator<Item = MetadataEntry> + '_ {
        GdalMetadata::metadata(metadata).map(
            |GdalMetadataEntry { domain, key, value }| MetadataEntry { domain, key, value },
        )
    }

    /// Band metadata of the default domain only.
    fn filter_metadata_gdal(metadata: &impl GdalMetadata) -> Metadata {
        entries_gdal(metadata)
            .filter_map(|MetadataEntry { domain, key, value }| {
                domain.is_empty().then_some((key, value))
            })
            .collect()
    }

    fn band_number_gdal(raster_band: &RasterBand) -> usize {
        // SAFETY: the handle lives as long as `raster_band`.
        let number = unsafe { gdal_sys::GDALGetBandNumber(raster_band.c_rasterband()) };
        usize::try_from(number).unwrap_or_default()
    }

    /// GDAL's checksum of the full band; GDAL reports failure as -1.
    fn checksum_gdal(raster_band: &RasterBand) -> Option<i32> {
        let (cols, rows) = raster_band.size();
        let (cols, rows) = (i32::try_from(cols).ok()?, i32::try_from(rows).ok()?);
        // SAFETY: the handle lives as long as `raster_band` and the window is the band itself.
        let checksum =
            unsafe { gdal_sys::GDALChecksumImage(raster_band.c_rasterband(), 0, 0, cols, rows) };
        (checksum >= 0).then_some(checksum)
    }

    fn read_band_gdal(raster_band: &RasterBand, size: (usize, usize)) -> Result<Array2<f64>> {
        let buffer = raster_band.read_as::<f64>((0, 0), size, size, None)?;
        let (cols, rows) = buffer.shape();
        Ok(Array2::from_shape_vec((rows, cols), buffer.data().to_vec())?)
    }

    #[derive(Debug)]
    pub struct GdalFile {
        path: PathBuf,
        dataset: GdalDataset,
    }

    impl File for GdalFile {
        fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            Ok(GdalFile {
                path: path.as_ref().to_path_buf(),
                dataset: GdalDataset::open(&path)?,
            })
        }
        fn path(&self) -> &Path {
            &self.path
        }
        fn driver(&self) -> DriverInfo {
            let driver = self.dataset.driver();
            DriverInfo {
                short_name: driver.short_name(),
                long_name: driver.long_name(),
                creation_options: driver
                    .metadata_item("DMD_CREATIONOPTIONLIST", "")
                    .unwrap_or_default(),
                extensions: driver
                    .metadata_item("DMD_EXTENSIONS", "")
                    .unwrap_or_default(),
            }
        }
        fn size(&self) -> (usize, usize) {
            self.dataset.raster_size()
        }
        fn crs(&self) -> String {
            self.dataset.projection()
        }
        fn transform(&self) -> Result<GeoTransform> {
            Ok(GeoTransform::from_gdal(self.dataset.geo_transform()?))
        }
        fn num_bands(&self) -> usize {
            self.dataset.raster_count()
        }
        fn band(&self, index: usize) -> Result<Band> {
            let raster_band = self.dataset.rasterband(index + 1)?;
            let data = read_band_gdal(&raster_band, self.size())?;
            let info = BandInfo {
                band_number: band_number_gdal(&raster_band),
                data_type: raster_band.band_type().name(),
                block_size: raster_band.block_size(),
                color_interpretation: raster_band.color_interpretation().name(),
                nodata_value: raster_band.no_data_value(),
                scale: raster_band.scale(),
                offset: raster_band.offset(),
                unit_type: raster_band.unit(),
                description: raster_band.description()?,
                metadata: filter_metadata_gdal(&raster_band),
                checksum: checksum_gdal(&raster_band),
            };
            debug!("read band {} as {:?} {}", index + 1, data.dim(), info.data_type);
            Ok(Band::new(index + 1, data, info))
        }
        fn metadata(&self) -> DatasetMetadata {
            entries_gdal(&self.dataset).collect()
        }
    }
}
