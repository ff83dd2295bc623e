/// RenderOrderKey - packed sort key for the render queue.
///
/// Bit layout (compared as an unsigned 64-bit integer):
/// - bits 63..32: material / pipeline identifier
/// - bits 31..0:  camera distance quantized against the far plane
///
/// Material grouping dominates; within one material, a larger distance
/// always gives a larger (or equal) key.

/// Packed material + distance sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderOrderKey(u64);

impl RenderOrderKey {
    /// Build a key from a material id and a distance quantized over
    /// `[0, far_distance]`. Distances beyond the far plane saturate.
    pub fn new(material_id: u32, distance: f32, far_distance: f32) -> Self {
        let bits = ((material_id as u64) << 32) | quantize_distance(distance, far_distance) as u64;
        Self(bits)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn material_id(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Quantized distance (low 32 bits).
    pub fn distance_bits(&self) -> u32 {
        self.0 as u32
    }
}

/// Map `distance / far_distance` from `[0, 1]` onto the full `u32` range.
fn quantize_distance(distance: f32, far_distance: f32) -> u32 {
    if !(far_distance > 0.0) || distance.is_nan() {
        return 0;
    }
    let normalized = (distance as f64 / far_distance as f64).clamp(0.0, 1.0);
    (normalized * u32::MAX as f64) as u32
}
