use catalog::Location;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FlightEvent {
    /// The plane reached `location`, the destination of segment `segment_index`.
    #[serde(rename_all = "camelCase")]
    SegmentComplete {
        segment_index: usize,
        location: Location,
    },
    /// The final segment finished.
    AnimationComplete,
    Error { error: FlightError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FlightError {
    /// Playback needs at least two stops.
    InsufficientLocations { count: usize },
    /// The journey cannot be replaced while playing or paused.
    JourneyLocked,
    /// Playback was stopped from outside.
    Interrupted { reason: String },
}

impl std::fmt::Display for FlightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightError::InsufficientLocations { count } => write!(
                f,
                "flight needs at least 2 locations with valid coordinates, got {count}"
            ),
            FlightError::JourneyLocked => {
                write!(f, "cannot change locations while the flight is playing or paused")
            }
            FlightError::Interrupted { reason } => write!(f, "flight interrupted: {reason}"),
        }
    }
}

impl std::error::Error for FlightError {}

#[cfg(test)]
mod tests {
    use super::{FlightError, FlightEvent};

    #[test]
    fn errors_render_readably() {
        let err = FlightError::InsufficientLocations { count: 1 };
        assert_eq!(
            err.to_string(),
            "flight needs at least 2 locations with valid coordinates, got 1"
        );
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_value(FlightEvent::Error {
            error: FlightError::JourneyLocked,
        })
        .unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error"]["code"], "journey_locked");
        let done = serde_json::to_value(FlightEvent::AnimationComplete).unwrap();
        assert_eq!(done["kind"], "animationComplete");
    }
}
