//! Earthquake metadata attached to a record by an upstream collaborator

use crate::trace::Timestamp;
use serde::{Deserialize, Serialize};

/// Origin and path information for the event that produced a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub origin_time: Option<Timestamp>,
    pub epicentral_distance_km: Option<f64>,
    /// Picked or estimated first P arrival at the station
    pub p_arrival: Option<Timestamp>,
}

impl EventInfo {
    pub fn new(origin_time: Timestamp, epicentral_distance_km: f64) -> Self {
        Self {
            origin_time: Some(origin_time),
            epicentral_distance_km: Some(epicentral_distance_km),
            p_arrival: None,
        }
    }

    pub fn with_p_arrival(mut self, p_arrival: Timestamp) -> Self {
        self.p_arrival = Some(p_arrival);
        self
    }
}
