use crate::core::feature::FeatureSet;
use crate::error::{PlanError, Result};
use geo::{Intersects, Rect};

pub fn validate_feature_count(set: &FeatureSet) -> Result<()> {
    match set.features.as_slice() {
        [] => Err(PlanError::Input(
            "No features left to plan after filtering".into(),
        )),
        [only] => Err(PlanError::InsufficientFeatures {
            count: 1,
            id: only.id.clone(),
        }),
        _ => Ok(()),
    }
}

/// Every feature must sit inside the DSM extent (boundary inclusive).
pub fn validate_coverage(set: &FeatureSet, extent: Rect<f64>) -> Result<()> {
    let outside: Vec<String> = set
        .features
        .iter()
        .filter(|f| !extent.intersects(&f.position))
        .map(|f| f.id.clone())
        .collect();

    if outside.is_empty() {
        Ok(())
    } else {
        Err(PlanError::Coverage { ids: outside })
    }
}
