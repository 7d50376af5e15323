//! 变调重采样
//!
//! 按固定步长抽取样本帧：同时改变音高和时长，不做保时长处理。

use super::voice::PitchFactor;

/// 计算被保留的帧下标
///
/// 下标为 `round(k * factor)`，k 取 `0..ceil(len / factor)`，
/// 丢弃 `>= len` 的下标。取整采用四舍六入五成双。
pub fn resample_indices(len: usize, factor: PitchFactor) -> Vec<usize> {
    let step = factor.value();
    let count = (len as f64 / step).ceil() as usize;

    (0..count)
        .map(|k| (k as f64 * step).round_ties_even() as usize)
        .filter(|&idx| idx < len)
        .collect()
}

/// 对交织 PCM 样本做变调
///
/// 以帧（`channels` 个连续样本）为单位抽取，单声道时等价于逐样本抽取。
/// 末尾不足一帧的样本被丢弃。
pub fn pitch_shift<T: Copy>(
    samples: &[T],
    channels: usize,
    factor: PitchFactor,
) -> Vec<T> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let indices = resample_indices(frames, factor);

    let mut out = Vec::with_capacity(indices.len() * channels);
    for idx in indices {
        let start = idx * channels;
        out.extend_from_slice(&samples[start..start + channels]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_male_indices() {
        // 0, 0.85, 1.7, 2.55, 3.4, 4.25 -> 0, 1, 2, 3, 3, 4
        let idx = resample_indices(5, PitchFactor::MALE);
        assert_eq!(idx, vec![0, 1, 2, 3, 3, 4]);
    }

    #[test]
    fn test_female_indices() {
        // 0, 1.15, 2.3, 3.45, 4.6 -> 0, 1, 2, 3, 5(丢弃)
        let idx = resample_indices(5, PitchFactor::FEMALE);
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unit_factor_is_identity() {
        let factor = PitchFactor::new(1.0).unwrap();
        let samples: Vec<i32> = (0..100).collect();
        let out = pitch_shift(&samples, 1, factor);
        assert_eq!(out, samples);
    }

    #[test]
    fn test_output_length_tracks_factor() {
        let samples = vec![0i32; 44_100];

        let male = pitch_shift(&samples, 1, PitchFactor::MALE);
        let expected = 44_100.0 / 0.85;
        assert!((male.len() as f64 - expected).abs() <= 2.0);

        let female = pitch_shift(&samples, 1, PitchFactor::FEMALE);
        let expected = 44_100.0 / 1.15;
        assert!((female.len() as f64 - expected).abs() <= 2.0);
    }

    #[test]
    fn test_stereo_frames_stay_together() {
        // L = 偶数, R = 负数
        let samples: Vec<i32> = (0..10).flat_map(|i| [i, -i]).collect();
        let out = pitch_shift(&samples, 2, PitchFactor::FEMALE);

        assert_eq!(out.len() % 2, 0);
        for frame in out.chunks(2) {
            assert_eq!(frame[0], -frame[1]);
        }
    }

    #[test]
    fn test_empty_input() {
        let out = pitch_shift::<i32>(&[], 1, PitchFactor::MALE);
        assert!(out.is_empty());
    }
}
