use serde::Serialize;

use super::SensorFamily;

/// Static description of what a sensor family offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_resolution: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_bands: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revisit_time: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swath_width: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<&'static str>,
    #[serde(skip_serializing_if = "is_empty")]
    pub parameters: &'static [&'static str],
    #[serde(skip_serializing_if = "is_empty")]
    pub applications: &'static [&'static str],
}

fn is_empty(list: &&'static [&'static str]) -> bool {
    list.is_empty()
}

impl Capabilities {
    fn optical(
        spatial_resolution: &'static str,
        spectral_bands: &'static str,
        revisit_time: &'static str,
        swath_width: &'static str,
        applications: &'static [&'static str],
    ) -> Self {
        Self {
            spatial_resolution: Some(spatial_resolution),
            spectral_bands: Some(spectral_bands),
            revisit_time: Some(revisit_time),
            swath_width: Some(swath_width),
            applications,
            ..Default::default()
        }
    }
}

pub(super) fn capabilities(family: SensorFamily) -> Capabilities {
    match family {
        SensorFamily::Landsat => Capabilities::optical(
            "15-100m",
            "11 bands",
            "16 days",
            "185km",
            &["land cover", "agriculture", "forestry", "urban planning"],
        ),
        SensorFamily::Sentinel => Capabilities::optical(
            "10-60m",
            "13 bands",
            "5 days",
            "290km",
            &["vegetation monitoring", "water quality", "land change"],
        ),
        SensorFamily::Modis => Capabilities::optical(
            "250-1000m",
            "36 bands",
            "1-2 days",
            "2330km",
            &["climate monitoring", "fire detection", "ocean color"],
        ),
        SensorFamily::Custom => Capabilities {
            data_type: Some("solar radiation"),
            parameters: &["DSR", "Direct", "Diffuse"],
            applications: &["solar energy", "agriculture", "climate"],
            ..Default::default()
        },
        _ => Capabilities::default(),
    }
}

pub(super) fn typical_bands(family: SensorFamily) -> &'static [&'static str] {
    match family {
        SensorFamily::Landsat => &[
            "Coastal", "Blue", "Green", "Red", "NIR", "SWIR1", "SWIR2", "Pan", "Cirrus", "TIR1",
            "TIR2",
        ],
        SensorFamily::Sentinel => &[
            "Coastal",
            "Blue",
            "Green",
            "Red",
            "Red Edge 1",
            "Red Edge 2",
            "Red Edge 3",
            "NIR",
            "Red Edge 4",
            "Water Vapor",
            "SWIR1",
            "SWIR2",
        ],
        SensorFamily::Modis => &[
            "Red", "NIR", "Blue", "Green", "NIR2", "SWIR1", "SWIR2", "SWIR3", "SWIR4", "SWIR5",
            "SWIR6", "SWIR7",
        ],
        SensorFamily::Custom => &["DSR", "Direct", "Diffuse", "Solar Radiation"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unknown_families_have_empty_descriptors() {
        let capabilities = SensorFamily::Spot.capabilities();
        assert_eq!(capabilities, Capabilities::default());
        assert!(SensorFamily::Spot.typical_bands().is_empty());
        assert_eq!(serde_json::to_string(&capabilities).unwrap(), "{}");
    }

    #[rstest]
    fn custom_family_lists_radiation_parameters() {
        let capabilities = SensorFamily::Custom.capabilities();
        assert_eq!(capabilities.data_type, Some("solar radiation"));
        assert!(capabilities.spatial_resolution.is_none());
        assert_eq!(SensorFamily::Custom.typical_bands().len(), 4);
    }

    #[rstest]
    fn sentinel_has_twelve_typical_bands() {
        assert_eq!(SensorFamily::Sentinel.typical_bands().len(), 12);
        assert_eq!(
            SensorFamily::Sentinel.capabilities().revisit_time,
            Some("5 days")
        );
    }
}
