pub type Result<T> = std::result::Result<T, SpectrascanError>;

#[derive(thiserror::Error, Debug)]
pub enum SpectrascanError {
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    ProjCreateError(#[from] proj::ProjCreateError),
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Band shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("Raster has no spatial reference")]
    MissingCrs,
    #[error("Bands {0} and {1} share the same wavelength")]
    DuplicateWavelength(String, String),
}
