use serde::Serialize;
use std::collections::BTreeMap;

use super::{Band, Metadata};

/// Name GDAL's unnamed metadata domain is reported under.
pub const DEFAULT_DOMAIN: &str = "default";

/// One `key=value` item of a metadata domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub domain: String,
    pub key: String,
    pub value: String,
}

/// Dataset level metadata grouped by domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DatasetMetadata(BTreeMap<String, Metadata>);

impl FromIterator<MetadataEntry> for DatasetMetadata {
    fn from_iter<I: IntoIterator<Item = MetadataEntry>>(iter: I) -> Self {
        let mut domains: BTreeMap<String, Metadata> = BTreeMap::new();
        for MetadataEntry { domain, key, value } in iter {
            let domain = if domain.is_empty() {
                DEFAULT_DOMAIN.to_string()
            } else {
                domain
            };
            domains.entry(domain).or_default().insert(key, value);
        }
        Self(domains)
    }
}

impl DatasetMetadata {
    pub fn domains(&self) -> impl Iterator<Item = (&String, &Metadata)> {
        self.0.iter()
    }

    pub fn domain(&self, name: &str) -> Option<&Metadata> {
        self.0.get(name)
    }

    /// Every dataset domain, then every band, merged into one bag.
    /// Later entries overwrite earlier ones.
    pub fn flatten(&self, bands: &[Band]) -> Metadata {
        self.0
            .values()
            .chain(bands.iter().map(Band::metadata))
            .flat_map(|metadata| metadata.iter())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Acquisition,
    Quality,
    Sensor,
    Processing,
    Coordinate,
}

/// Keyword groups tested against lower-cased keys, first match wins.
const BUCKET_KEYWORDS: &[(Bucket, &[&str])] = &[
    (Bucket::Acquisition, &["date", "time", "acquisition"]),
    (
        Bucket::Acquisition,
        &["sun", "solar", "azimuth", "elevation", "zenith"],
    ),
    (Bucket::Quality, &["cloud", "quality", "qa"]),
    (
        Bucket::Sensor,
        &["sensor", "platform", "satellite", "instrument"],
    ),
    (Bucket::Sensor, &["band", "wavelength", "spectral"]),
    (
        Bucket::Processing,
        &["processing", "level", "correction", "calibration"],
    ),
    (
        Bucket::Coordinate,
        &["projection", "datum", "ellipsoid", "zone", "coordinate"],
    ),
];

fn bucket_of(key: &str) -> Option<Bucket> {
    let key = key.to_lowercase();
    BUCKET_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| key.contains(keyword)))
        .map(|(bucket, _)| *bucket)
}

/// Key-disjoint partition of a metadata bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataBuckets {
    pub acquisition_info: Metadata,
    pub quality_info: Metadata,
    pub sensor_info: Metadata,
    pub processing_info: Metadata,
    pub coordinate_info: Metadata,
}

impl MetadataBuckets {
    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Metadata {
        match bucket {
            Bucket::Acquisition => &mut self.acquisition_info,
            Bucket::Quality => &mut self.quality_info,
            Bucket::Sensor => &mut self.sensor_info,
            Bucket::Processing => &mut self.processing_info,
            Bucket::Coordinate => &mut self.coordinate_info,
        }
    }
}

/// Sort metadata keys into acquisition, quality, sensor, processing and
/// coordinate buckets. Keys matching no keyword group are dropped.
pub fn bucket(flattened: &Metadata) -> MetadataBuckets {
    flattened
        .iter()
        .filter_map(|(key, value)| bucket_of(key).map(|bucket| (bucket, key, value)))
        .fold(
            MetadataBuckets::default(),
            |mut buckets, (bucket, key, value)| {
                buckets
                    .bucket_mut(bucket)
                    .insert(key.clone(), value.clone());
                buckets
            },
        )
}
