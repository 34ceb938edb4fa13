use serde::Serialize;

mod capabilities;
pub use capabilities::Capabilities;

use crate::components::Metadata;

/// Sensor family a raster most likely comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFamily {
    Landsat,
    Sentinel,
    Modis,
    Spot,
    Aster,
    Worldview,
    Rapideye,
    Planetscope,
    /// Solar radiation products.
    Custom,
}

/// Tested in order, the first family with any hit wins.
const SENSOR_KEYWORDS: &[(SensorFamily, &[&str])] = &[
    (SensorFamily::Landsat, &["landsat", "oli", "tirs", "etm", "tm"]),
    (SensorFamily::Sentinel, &["sentinel", "msi", "s2a", "s2b"]),
    (SensorFamily::Modis, &["modis", "terra", "aqua"]),
    (SensorFamily::Spot, &["spot", "hrvir"]),
    (SensorFamily::Aster, &["aster"]),
    (SensorFamily::Worldview, &["worldview", "quickbird", "geoeye"]),
    (SensorFamily::Rapideye, &["rapideye"]),
    (SensorFamily::Planetscope, &["planetscope"]),
    (
        SensorFamily::Custom,
        &["solar", "radiation", "dsr", "direct", "diffuse"],
    ),
];

impl SensorFamily {
    fn matches(keywords: &[&str], key: &str, value: &str) -> bool {
        let key = key.to_lowercase();
        let value = value.to_lowercase();
        keywords
            .iter()
            .any(|keyword| key.contains(keyword) || value.contains(keyword))
    }

    /// Guess the family from every key and value of a flattened metadata bag.
    pub fn detect(flattened: &Metadata) -> Option<Self> {
        SENSOR_KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                flattened
                    .iter()
                    .any(|(key, value)| Self::matches(keywords, key, value))
            })
            .map(|(family, _)| *family)
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities::capabilities(*self)
    }

    pub fn typical_bands(&self) -> &'static [&'static str] {
        capabilities::typical_bands(*self)
    }
}
