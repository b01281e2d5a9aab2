//! Validation for overlay geometry.

use crate::schema::MultipipConfig;

use super::helpers::validate_range;

pub(crate) fn validate_overlay(errors: &mut Vec<String>, config: &MultipipConfig) {
    let overlay = &config.overlay;
    validate_range(errors, "overlay.width", overlay.width.into(), 160, 1280);
    validate_range(errors, "overlay.height", overlay.height.into(), 90, 720);
    validate_range(errors, "overlay.margin", overlay.margin.into(), 0, 200);
    validate_range(errors, "overlay.stagger", overlay.stagger.into(), 0, 200);
}
