/// Replacement parameters typed by the user
///
/// The two free-text fields end up inside a Cloudinary transformation
/// descriptor, whose grammar uses `;`, `:`, `,` and `/` as delimiters.
/// Text containing any of them is rejected instead of being interpolated.

use crate::error::{ReplaceError, Result};

pub const DEFAULT_ITEM_TO_REPLACE: &str = "sweater";
pub const DEFAULT_REPLACE_WITH: &str = "leather jacket with pockets";

/// Characters with a meaning in the transformation descriptor
pub const RESERVED_CHARS: [char; 4] = [';', ':', ',', '/'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRequest {
    /// Object to find in the image (e.g. "sweater")
    pub item_to_replace: String,
    /// Description of what to put in its place
    pub replace_with: String,
    /// Keep the shape of the original object (`preserve-geometry_true`)
    pub preserve_geometry: bool,
    /// Replace every instance, not just the most prominent one (`multiple_true`)
    pub replace_all: bool,
}

impl Default for ReplacementRequest {
    fn default() -> Self {
        Self {
            item_to_replace: DEFAULT_ITEM_TO_REPLACE.to_string(),
            replace_with: DEFAULT_REPLACE_WITH.to_string(),
            preserve_geometry: false,
            replace_all: false,
        }
    }
}

impl ReplacementRequest {
    pub fn new(item_to_replace: impl Into<String>, replace_with: impl Into<String>) -> Self {
        Self {
            item_to_replace: item_to_replace.into(),
            replace_with: replace_with.into(),
            ..Self::default()
        }
    }

    /// Check both fields; runs before anything is uploaded
    pub fn validate(&self) -> Result<()> {
        check_field("Item to replace", &self.item_to_replace)?;
        check_field("Replace with", &self.replace_with)?;
        Ok(())
    }

    /// Build the `gen_replace` effect, e.g.
    /// `gen_replace:from_sweater;to_leather jacket with pockets`
    pub fn descriptor(&self) -> Result<String> {
        self.validate()?;

        let mut descriptor = format!(
            "gen_replace:from_{};to_{}",
            self.item_to_replace.trim(),
            self.replace_with.trim()
        );
        if self.preserve_geometry {
            descriptor.push_str(";preserve-geometry_true");
        }
        if self.replace_all {
            descriptor.push_str(";multiple_true");
        }
        Ok(descriptor)
    }
}

fn check_field(label: &str, value: &str) -> Result<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ReplaceError::Validation(format!("{} must not be empty", label)));
    }

    if let Some(c) = value.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(ReplaceError::Validation(format!(
            "{} must not contain '{}' (reserved: ; : , /)",
            label, c
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(ReplaceError::Validation(format!(
            "{} must not contain control characters",
            label
        )));
    }

    Ok(())
}
