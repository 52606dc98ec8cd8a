use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::EngineError;
use crate::variant::GameVariant;

static PACK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/content/packs");

/// Built-in content for a variant, used whenever the assignment's config is
/// missing or malformed.
pub fn load_default<T: DeserializeOwned>(variant: GameVariant) -> Result<T, EngineError> {
    let file_name = format!("{}.json", variant.game_id());
    let file = PACK_DIR
        .get_file(&file_name)
        .ok_or_else(|| EngineError::DefaultContent {
            variant,
            reason: format!("{file_name} is not bundled"),
        })?;

    let text = file
        .contents_utf8()
        .ok_or_else(|| EngineError::DefaultContent {
            variant,
            reason: format!("{file_name} is not valid utf-8"),
        })?;

    serde_json::from_str(text).map_err(|e| EngineError::DefaultContent {
        variant,
        reason: e.to_string(),
    })
}

/// Parses the therapist's config into the variant's typed config, falling back
/// to the built-in pack when required fields are absent or have the wrong shape.
pub fn parse_or_default<T: DeserializeOwned>(
    variant: GameVariant,
    config: &Value,
) -> Result<T, EngineError> {
    match <T as Deserialize>::deserialize(config) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            if !config.is_null() {
                warn!(game = %variant, error = %err, "unusable game config, using built-in content");
            }
            load_default(variant)
        }
    }
}
