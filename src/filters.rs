//! Coordinate filter for the service area listing.

use serde::Deserialize;

/// Raw `latitude` / `longitude` query parameters, kept as strings so that
/// unparseable input can be told apart from absent input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoordinateParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// A point handed to the containment predicate, in storage axis order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    pub x: f64,
    pub y: f64,
}

/// How the service area listing is restricted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AreaFilter {
    /// No restriction.
    All,
    /// Only areas whose polygon contains the point.
    Contains(QueryPoint),
    /// Matches nothing (malformed coordinates).
    Nothing,
}

impl AreaFilter {
    /// Builds the filter from the request parameters.
    ///
    /// The point is built as `POINT(latitude longitude)`: the `latitude`
    /// parameter lands on the x axis and `longitude` on the y axis, even
    /// though EPSG:4326 puts longitude on x. Existing clients depend on this
    /// order.
    ///
    /// Only one of the two parameters present means no filtering at all.
    pub fn from_params(params: &CoordinateParams) -> Self {
        match (params.latitude.as_deref(), params.longitude.as_deref()) {
            (Some(latitude), Some(longitude)) => {
                match (parse_coordinate(latitude), parse_coordinate(longitude)) {
                    (Some(x), Some(y)) => AreaFilter::Contains(QueryPoint { x, y }),
                    _ => {
                        tracing::debug!(
                            "Unparseable coordinates latitude={:?} longitude={:?}, matching nothing",
                            latitude,
                            longitude
                        );
                        AreaFilter::Nothing
                    }
                }
            }
            (None, None) => AreaFilter::All,
            (latitude, longitude) => {
                tracing::debug!(
                    "Only one coordinate supplied (latitude={:?}, longitude={:?}), not filtering",
                    latitude,
                    longitude
                );
                AreaFilter::All
            }
        }
    }
}

/// Parses one coordinate, accepting surrounding whitespace and rejecting
/// anything that is not a finite decimal number.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let looks_numeric = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !looks_numeric {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(latitude: Option<&str>, longitude: Option<&str>) -> CoordinateParams {
        CoordinateParams {
            latitude: latitude.map(str::to_string),
            longitude: longitude.map(str::to_string),
        }
    }

    #[test]
    fn no_parameters_means_everything() {
        assert_eq!(AreaFilter::from_params(&params(None, None)), AreaFilter::All);
    }

    #[test]
    fn point_keeps_parameter_order() {
        let filter =
            AreaFilter::from_params(&params(Some("-119.03652191162"), Some("43.590660095215")));
        assert_eq!(
            filter,
            AreaFilter::Contains(QueryPoint {
                x: -119.03652191162,
                y: 43.590660095215
            })
        );
    }

    #[test]
    fn single_parameter_disables_filtering() {
        assert_eq!(
            AreaFilter::from_params(&params(Some("10.5"), None)),
            AreaFilter::All
        );
        assert_eq!(
            AreaFilter::from_params(&params(None, Some("abc"))),
            AreaFilter::All
        );
    }

    #[test]
    fn garbage_coordinates_match_nothing() {
        for (lat, lon) in [
            ("abc", "1.0"),
            ("1.0", "north"),
            ("", ""),
            ("NaN", "1"),
            ("inf", "2"),
            ("1 2", "3"),
        ] {
            assert_eq!(
                AreaFilter::from_params(&params(Some(lat), Some(lon))),
                AreaFilter::Nothing,
                "latitude={:?} longitude={:?}",
                lat,
                lon
            );
        }
    }

    #[test]
    fn coordinates_tolerate_whitespace_and_exponents() {
        assert_eq!(parse_coordinate("  44.5 "), Some(44.5));
        assert_eq!(parse_coordinate("1e1"), Some(10.0));
        assert_eq!(parse_coordinate("-0"), Some(-0.0));
        assert_eq!(parse_coordinate("1e400"), None);
    }
}
