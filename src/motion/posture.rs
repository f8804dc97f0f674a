use tracing::info;

use crate::drivers::{DriverError, LegPosition, Locomotion};
use crate::kernel::config::ReflexConfig;

/// Validate a foot target, pulling it back into reach if needed.
pub fn reachable(position: LegPosition) -> LegPosition {
    if position.is_valid() {
        return position;
    }
    let fitted = position.fit();
    info!(
        x = fitted.x,
        y = fitted.y,
        z = fitted.z,
        "Leg position out of reach, fitted"
    );
    fitted
}

/// Bring the body into its ready posture after startup.
///
/// Moves that belong together are issued concurrently and joined before the
/// next pair starts, so each stage finishes as a unit.
pub async fn ready(locomotion: &dyn Locomotion, config: &ReflexConfig) -> Result<(), DriverError> {
    let fast = config.fast_duration_ms;
    let slow = config.slow_duration_ms;

    locomotion.stand().await?;
    locomotion.move_head(0.0, fast).await?;

    let left = reachable(LegPosition::new(-100.0, 50.0, 70.0));
    let right = reachable(LegPosition::new(100.0, 50.0, 70.0));
    let (a, b) = tokio::join!(
        locomotion.move_leg(2, left, slow),
        locomotion.move_leg(5, right, slow),
    );
    a?;
    b?;

    let (a, b) = tokio::join!(
        locomotion.move_joint(0, 1, 90.0, slow),
        locomotion.move_joint(0, 2, 45.0, slow),
    );
    a?;
    b?;

    let (a, b) = tokio::join!(
        locomotion.move_joint(1, 1, 90.0, fast),
        locomotion.move_joint(1, 2, 45.0, fast),
    );
    a?;
    b?;

    info!("Ready posture reached");
    Ok(())
}
