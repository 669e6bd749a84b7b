use catalog::{Location, sanitize_locations};
use foundation::math::{haversine_distance_km, longitude_delta, normalize_longitude};
use serde::Serialize;
use tracing::debug;

use crate::config::{ClusterConfig, ClusterOrder};

/// A group of nearby locations drawn as one pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    /// Weighted centroid of `members`.
    pub latitude: f64,
    pub longitude: f64,
    pub members: Vec<Location>,
    pub total_albums: u64,
    pub total_photos: u64,
    /// Pin radius, see [`ClusterConfig::pin_radius`].
    pub radius: f64,
}

impl Cluster {
    fn seeded(seed: Location, config: &ClusterConfig) -> Self {
        let mut cluster = Self {
            id: format!("cluster-{}", seed.id),
            latitude: seed.latitude,
            longitude: seed.longitude,
            members: vec![seed],
            total_albums: 0,
            total_photos: 0,
            radius: 0.0,
        };
        cluster.recompute(config);
        cluster
    }

    fn absorb(&mut self, location: Location, config: &ClusterConfig) {
        self.members.push(location);
        self.recompute(config);
    }

    /// Recomputes centroid, totals and pin radius from scratch.
    ///
    /// Longitudes are unwrapped relative to the seed before averaging so a
    /// cluster on the antimeridian stays there instead of averaging to 0°.
    fn recompute(&mut self, config: &ClusterConfig) {
        let Some(seed) = self.members.first() else {
            return;
        };
        let seed_lng = seed.longitude;

        let mut weight_sum = 0.0;
        let mut lat_sum = 0.0;
        let mut lng_sum = 0.0;
        let mut albums = 0u64;
        let mut photos = 0u64;
        for m in &self.members {
            let w = m.weight();
            weight_sum += w;
            lat_sum += m.latitude * w;
            lng_sum += (seed_lng + longitude_delta(seed_lng, m.longitude)) * w;
            albums += u64::from(m.album_count);
            photos += u64::from(m.photo_count);
        }

        self.latitude = lat_sum / weight_sum;
        let lng = lng_sum / weight_sum;
        self.longitude = if (-180.0..=180.0).contains(&lng) {
            lng
        } else {
            normalize_longitude(lng)
        };
        self.total_albums = albums;
        self.total_photos = photos;
        self.radius = config.pin_radius(albums + photos);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn engagement(&self) -> u64 {
        self.total_albums + self.total_photos
    }

    pub fn contains(&self, location_id: &str) -> bool {
        self.members.iter().any(|m| m.id == location_id)
    }

    pub fn distance_km_to(&self, lat: f64, lng: f64) -> f64 {
        haversine_distance_km(self.latitude, self.longitude, lat, lng)
    }
}

/// Result of a clustering pass, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
}

impl ClusterSet {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn as_slice(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    pub fn into_vec(self) -> Vec<Cluster> {
        self.clusters
    }

    pub fn find(&self, cluster_id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == cluster_id)
    }

    pub fn find_by_location(&self, location_id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.contains(location_id))
    }

    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Greedy great-circle clusterer.
#[derive(Debug, Clone, Default)]
pub struct GeoClusterer {
    config: ClusterConfig,
}

impl GeoClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn set_radius_km(&mut self, radius_km: f64) {
        self.config.radius_km = radius_km;
    }

    /// Partitions `locations` into clusters.
    ///
    /// Locations with invalid coordinates are dropped first. Every remaining
    /// location ends up in exactly one cluster.
    pub fn cluster(&self, locations: &[Location]) -> ClusterSet {
        let sanitized = sanitize_locations(locations.iter().cloned());
        let mut pending = sanitized.locations;
        if self.config.order == ClusterOrder::Canonical {
            sort_canonical(&mut pending);
        }

        let radius_km = self.config.effective_radius_km();
        let mut slots: Vec<Option<Location>> = pending.into_iter().map(Some).collect();
        let mut clusters = Vec::new();

        for i in 0..slots.len() {
            let Some(seed) = slots[i].take() else {
                continue;
            };
            let mut cluster = Cluster::seeded(seed, &self.config);

            // Indices before `i` are all assigned already.
            for slot in slots.iter_mut().skip(i + 1) {
                let within = slot.as_ref().is_some_and(|candidate| {
                    cluster.distance_km_to(candidate.latitude, candidate.longitude) <= radius_km
                });
                if within {
                    if let Some(candidate) = slot.take() {
                        cluster.absorb(candidate, &self.config);
                    }
                }
            }

            clusters.push(cluster);
        }

        debug!(
            input = locations.len(),
            dropped = sanitized.dropped,
            clusters = clusters.len(),
            radius_km,
            "clustered locations"
        );

        ClusterSet { clusters }
    }
}

/// Clusters with default pin sizing and canonical ordering.
pub fn cluster_locations(locations: &[Location], radius_km: f64) -> Vec<Cluster> {
    GeoClusterer::new(ClusterConfig::with_radius_km(radius_km))
        .cluster(locations)
        .into_vec()
}

fn sort_canonical(locations: &mut [Location]) {
    locations.sort_by(|a, b| {
        b.engagement()
            .cmp(&a.engagement())
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.latitude.total_cmp(&b.latitude))
            .then_with(|| a.longitude.total_cmp(&b.longitude))
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use catalog::Location;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::{GeoClusterer, cluster_locations};
    use crate::config::{ClusterConfig, ClusterOrder};

    fn loc(id: &str, lat: f64, lng: f64) -> Location {
        let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        Location::new(id, id, lat, lng, date)
    }

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// Deterministic scatter of locations across a few regions.
    fn scatter(n: usize) -> Vec<Location> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        let centers = [(48.85, 2.35), (41.9, 12.49), (35.68, 139.69), (-33.87, 151.21)];
        (0..n)
            .map(|i| {
                let (clat, clng) = centers[i % centers.len()];
                let lat = clat + (next() - 0.5) * 6.0;
                let lng = clng + (next() - 0.5) * 6.0;
                let albums = (next() * 5.0) as u32;
                let photos = (next() * 80.0) as u32;
                loc(&format!("loc-{i:03}"), lat, lng).with_counts(albums, photos)
            })
            .collect()
    }

    #[test]
    fn empty_input_gives_no_clusters() {
        assert!(cluster_locations(&[], 200.0).is_empty());
    }

    #[test]
    fn nearby_points_merge() {
        let clusters = cluster_locations(
            &[loc("a", 48.85, 2.35), loc("b", 48.895, 2.35)],
            200.0,
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn paris_and_rome_stay_apart() {
        let clusters = cluster_locations(
            &[loc("paris", 48.85, 2.35), loc("rome", 41.90, 12.49)],
            200.0,
        );
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.members.len() == 1));
    }

    #[test]
    fn every_location_in_exactly_one_cluster() {
        let input = scatter(240);
        for radius in [0.0, 50.0, 200.0, 800.0] {
            let set = GeoClusterer::new(ClusterConfig::with_radius_km(radius)).cluster(&input);

            let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
            for cluster in &set {
                for m in &cluster.members {
                    *seen.entry(m.id.as_str()).or_insert(0) += 1;
                }
                let albums: u64 = cluster.members.iter().map(|m| u64::from(m.album_count)).sum();
                let photos: u64 = cluster.members.iter().map(|m| u64::from(m.photo_count)).sum();
                assert_eq!(cluster.total_albums, albums);
                assert_eq!(cluster.total_photos, photos);
            }
            assert_eq!(seen.len(), input.len());
            assert!(seen.values().all(|&n| n == 1));
            assert_eq!(set.total_members(), input.len());
        }
    }

    #[test]
    fn invalid_coordinates_are_excluded() {
        let input = vec![
            loc("ok", 10.0, 10.0),
            loc("nan", f64::NAN, 10.0),
            loc("far-north", 120.0, 10.0),
            loc("far-east", 10.0, 181.0),
        ];
        let clusters = cluster_locations(&input, 200.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members[0].id, "ok");
    }

    #[test]
    fn canonical_order_ignores_input_permutation() {
        let input = scatter(120);
        let mut reversed = input.clone();
        reversed.reverse();
        let mut rotated = input.clone();
        rotated.rotate_left(37);

        let clusterer = GeoClusterer::default();
        let a = clusterer.cluster(&input);
        assert_eq!(a, clusterer.cluster(&reversed));
        assert_eq!(a, clusterer.cluster(&rotated));
    }

    #[test]
    fn input_order_seeds_with_first_location() {
        let clusterer = GeoClusterer::new(ClusterConfig {
            order: ClusterOrder::Input,
            ..ClusterConfig::default()
        });
        let input = vec![
            loc("quiet", 48.85, 2.35),
            loc("busy", 48.86, 2.36).with_counts(3, 90),
        ];
        let set = clusterer.cluster(&input);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].id, "cluster-quiet");

        let canonical = GeoClusterer::default().cluster(&input);
        assert_eq!(canonical.as_slice()[0].id, "cluster-busy");
    }

    #[test]
    fn centroid_is_weighted_by_engagement() {
        let heavy = loc("heavy", 10.0, 20.0).with_counts(9, 90);
        let light = loc("light", 10.5, 20.0);
        let clusters = cluster_locations(&[heavy, light], 200.0);
        assert_eq!(clusters.len(), 1);
        // Weights 100 and 1.
        assert_close(clusters[0].latitude, (10.0 * 100.0 + 10.5) / 101.0, 1e-9);
        assert_close(clusters[0].longitude, 20.0, 1e-9);
        assert_eq!(clusters[0].total_albums, 9);
        assert_eq!(clusters[0].total_photos, 90);
        assert_eq!(clusters[0].engagement(), 99);
    }

    #[test]
    fn zero_content_locations_still_pull_the_centroid() {
        let clusters = cluster_locations(&[loc("a", 0.0, 0.0), loc("b", 1.0, 0.0)], 200.0);
        assert_close(clusters[0].latitude, 0.5, 1e-9);
        assert_eq!(clusters[0].radius, 0.8);
    }

    #[test]
    fn antimeridian_cluster_centroid_stays_on_seam() {
        let clusters =
            cluster_locations(&[loc("west", -17.0, 179.9), loc("east", -17.0, -179.9)], 200.0);
        assert_eq!(clusters.len(), 1);
        assert_close(clusters[0].longitude.abs(), 180.0, 1e-6);
    }

    #[test]
    fn absorption_uses_the_moving_centroid() {
        // a-b and b-c are ~167 km apart, a-c ~334 km. Once b joins a the
        // centroid sits halfway, which brings c within 260 km but not 200.
        let input = vec![loc("a", 0.0, 0.0), loc("b", 0.0, 1.5), loc("c", 0.0, 3.0)];
        let clusterer = GeoClusterer::new(ClusterConfig {
            order: ClusterOrder::Input,
            ..ClusterConfig::default()
        });
        let set = clusterer.cluster(&input);
        assert_eq!(set.len(), 2);
        assert_eq!(set.find("cluster-a").unwrap().len(), 2);
        assert_eq!(set.find_by_location("c").unwrap().id, "cluster-c");

        let mut wide = clusterer.clone();
        wide.set_radius_km(260.0);
        assert_eq!(wide.cluster(&input).len(), 1);
    }
}
