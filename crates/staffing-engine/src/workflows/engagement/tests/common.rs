pub(super) use crate::workflows::fixtures::*;
use crate::workflows::engagement::{Coordinate, EngagementStage, LocationUpdate};

pub(super) fn at_stage(stage: EngagementStage) -> LocationUpdate {
    LocationUpdate {
        location: Coordinate {
            latitude: -33.8688,
            longitude: 151.2093,
        },
        stage,
        distance_from_home_km: 4.2,
        distance_from_workplace_km: 0.3,
    }
}
