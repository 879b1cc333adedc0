// Volume policy: alert loudness follows the device's ring loudness.

/// Target media volume together with the level to restore afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumePlan {
    pub target: u32,
    pub original: u32,
}

/// Scale the ring volume fraction onto the media volume range.
///
/// `floor(current_ring / max_ring * max_media)`, 0 when `max_ring` is 0.
/// A ring level above `max_ring` is treated as full.
pub fn compute_target_volume(current_ring: u32, max_ring: u32, max_media: u32) -> u32 {
    if max_ring == 0 {
        return 0;
    }
    let fraction = (f64::from(current_ring) / f64::from(max_ring)).min(1.0);
    (fraction * f64::from(max_media)).floor() as u32
}

pub fn plan_volume(current_ring: u32, max_ring: u32, max_media: u32, current_media: u32) -> VolumePlan {
    VolumePlan {
        target: compute_target_volume(current_ring, max_ring, max_media),
        original: current_media,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ring_maps_to_full_media() {
        assert_eq!(compute_target_volume(7, 7, 15), 15);
        assert_eq!(compute_target_volume(100, 100, 25), 25);
    }

    #[test]
    fn test_ring_above_max_caps_at_media_max() {
        assert_eq!(compute_target_volume(10, 7, 15), 15);
        assert_eq!(compute_target_volume(u32::MAX, 1, 15), 15);
    }

    #[test]
    fn test_zero_ring_is_silent() {
        assert_eq!(compute_target_volume(0, 7, 15), 0);
    }

    #[test]
    fn test_zero_max_ring() {
        assert_eq!(compute_target_volume(3, 0, 15), 0);
    }

    #[test]
    fn test_fraction_floors() {
        // 3/7 * 15 = 6.43
        assert_eq!(compute_target_volume(3, 7, 15), 6);
        // 1/2 * 15 = 7.5
        assert_eq!(compute_target_volume(1, 2, 15), 7);
    }

    #[test]
    fn test_plan_keeps_original() {
        let plan = plan_volume(7, 7, 15, 4);
        assert_eq!(plan, VolumePlan { target: 15, original: 4 });
    }
}
