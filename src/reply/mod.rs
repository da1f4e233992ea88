//! Reply policy: decide what an incoming SMS body should get back.
//!
//! A short `LAT,LON` pair asks for a forecast; everything else gets the
//! usage text. Coordinates are not checked for being numeric here; the
//! forecast lookup fails on bad input and its failure text goes back instead.

/// Usage text sent for anything that is not a coordinate pair.
pub const HELP_TEXT: &str = "
Coords: Decimal Degrees
LAT,LON
S & W as negatives
e.g -34.532,25.432";

/// Bodies must be strictly longer than this many characters to be coordinates.
const MIN_COORD_LEN: usize = 2;
/// ...and strictly shorter than this.
const MAX_COORD_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDecision {
    WeatherReport { lat: String, lon: String },
    HelpText,
}

/// Pick the reply for `body`.
///
/// `WeatherReport` when the body is 3..=19 characters and has a comma; lat and
/// lon are the trimmed first two comma-separated fields, later fields are
/// ignored.
pub fn decide(body: &str) -> ReplyDecision {
    let len = body.chars().count();
    if len <= MIN_COORD_LEN || len >= MAX_COORD_LEN {
        return ReplyDecision::HelpText;
    }

    let mut fields = body.split(',');
    match (fields.next(), fields.next()) {
        (Some(lat), Some(lon)) => ReplyDecision::WeatherReport {
            lat: lat.trim().to_string(),
            lon: lon.trim().to_string(),
        },
        _ => ReplyDecision::HelpText,
    }
}
