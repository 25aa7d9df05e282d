//! Multi-input compatibility checks.

use std::path::Path;
use tracing::info;

use crate::clip::Clip;
use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};

/// Verify that every video shares the first video's dimensions.
///
/// Each clip is opened, compared and closed before the next one is opened.
/// Returns the reference dimensions.
pub async fn check_compatibility<P: AsRef<Path>>(
    engine: &dyn MediaEngine,
    paths: &[P],
) -> MediaResult<(u32, u32)> {
    let (first, rest) = paths
        .split_first()
        .ok_or_else(|| MediaError::EmptyInput("no videos to compare".to_string()))?;

    let reference = Clip::open(engine, first).await?;
    let expected = reference.dimensions()?;
    reference.close();

    info!("Reference video: {}x{}", expected.0, expected.1);

    for path in rest {
        let clip = Clip::open(engine, path).await?;
        let actual = clip.dimensions()?;
        clip.close();

        if actual != expected {
            return Err(MediaError::DimensionMismatch {
                path: path.as_ref().to_path_buf(),
                expected,
                actual,
            });
        }
    }

    Ok(expected)
}
