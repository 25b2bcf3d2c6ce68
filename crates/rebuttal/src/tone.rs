// crates/rebuttal/src/tone.rs

use retort_core::IntensityLevel;

/// Tone phrases indexed by `intensity - 1`, from very gentle and polite (1)
/// to extremely fierce and devastating (10).
pub const TONE_DESCRIPTORS: [&str; 10] = [
    "非常温和、礼貌地",
    "温和但坚定地",
    "有理有据地",
    "略带讽刺地",
    "直接而犀利地",
    "犀利且有力地",
    "强势且不留情面地",
    "辛辣且尖锐地",
    "火力全开、毫不留情地",
    "极其激烈、毁灭性地",
];

pub fn tone_descriptor(intensity: IntensityLevel) -> &'static str {
    TONE_DESCRIPTORS[intensity.index()]
}
