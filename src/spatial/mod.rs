//! Geometry helpers: centroids, boundary clipping and feature file readers.
//!
//! Country boundaries are held in an R-tree so that clipping a large point
//! set only runs exact containment tests against nearby polygons.

mod boundary;
mod features;
mod point;

pub use boundary::{load_shapefile_boundaries, BoundaryIndex};
pub use features::{read_feature_collection, FeatureRow};
pub use point::{centroid_of, location_string};
