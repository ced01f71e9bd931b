use serde::Deserialize;

/// One entry of `GET /data/locate/{namespace}/{file}`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DataLocation {
    pub identifier: String,
    pub associated_storage_area_id: String,
    pub replicas: Vec<String>,
}

/// Every replica URI across all locations, in response order.
pub fn replica_uris(locations: &[DataLocation]) -> Vec<&str> {
    locations
        .iter()
        .flat_map(|location| location.replicas.iter().map(String::as_str))
        .collect()
}
