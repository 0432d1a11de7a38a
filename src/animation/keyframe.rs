use crate::error::{Error, Result};
use glam::{Quat, Vec3};
use std::fmt;

/// Which of the three per-bone channels a track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Position,
    Rotation,
    Scale,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Position => "position",
            ChannelKind::Rotation => "rotation",
            ChannelKind::Scale => "scale",
        };
        f.write_str(name)
    }
}

/// A value type that can be blended between two keys.
pub trait Keyframe: Copy {
    fn interpolate(from: Self, to: Self, factor: f32) -> Self;
}

impl Keyframe for Vec3 {
    fn interpolate(from: Self, to: Self, factor: f32) -> Self {
        from.lerp(to, factor)
    }
}

impl Keyframe for Quat {
    /// Slerp followed by a renormalize to keep drift out of the rotation.
    fn interpolate(from: Self, to: Self, factor: f32) -> Self {
        from.slerp(to, factor).normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSample<T> {
    pub value: T,
    pub timestamp: f32,
}

impl<T> KeyframeSample<T> {
    pub fn new(value: T, timestamp: f32) -> Self {
        Self { value, timestamp }
    }
}

/// Timestamped samples of one channel, ordered by non-decreasing time.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T> {
    channel: ChannelKind,
    samples: Vec<KeyframeSample<T>>,
}

impl<T: Keyframe> KeyframeTrack<T> {
    pub fn new(channel: ChannelKind, samples: Vec<KeyframeSample<T>>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptyTrack { channel });
        }

        if let Some(index) = samples
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(Error::UnsortedTrack {
                channel,
                index: index + 1,
            });
        }

        Ok(Self { channel, samples })
    }

    pub fn constant(channel: ChannelKind, value: T) -> Self {
        Self {
            channel,
            samples: vec![KeyframeSample::new(value, 0.0)],
        }
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn samples(&self) -> &[KeyframeSample<T>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> f32 {
        self.samples[0].timestamp
    }

    pub fn last_timestamp(&self) -> f32 {
        self.samples[self.samples.len() - 1].timestamp
    }

    /// Index of the last key at or before `time`. `time` must lie in range.
    fn key_index(&self, time: f32) -> usize {
        self.samples
            .partition_point(|s| s.timestamp <= time)
            .saturating_sub(1)
    }

    fn interpolate_at(&self, time: f32) -> T {
        let p0 = self.key_index(time);
        let Some(next) = self.samples.get(p0 + 1) else {
            return self.samples[p0].value;
        };

        let prev = &self.samples[p0];
        let factor = (time - prev.timestamp) / (next.timestamp - prev.timestamp);
        T::interpolate(prev.value, next.value, factor)
    }

    /// Samples the track, failing when `time` falls outside the key range.
    ///
    /// A single-key track is constant and accepts any time.
    pub fn try_sample(&self, time: f32) -> Result<T> {
        if self.samples.len() == 1 {
            return Ok(self.samples[0].value);
        }

        let (first, last) = (self.first_timestamp(), self.last_timestamp());
        if !(first..=last).contains(&time) {
            return Err(Error::OutOfRange { time, first, last });
        }

        Ok(self.interpolate_at(time))
    }

    /// Samples the track with `time` clamped to the key range.
    pub fn sample(&self, time: f32) -> T {
        if self.samples.len() == 1 {
            return self.samples[0].value;
        }

        let (first, last) = (self.first_timestamp(), self.last_timestamp());
        let clamped = if time.is_nan() {
            first
        } else {
            time.clamp(first, last)
        };

        if clamped != time {
            log::trace!(
                "{} track sampled at {} outside [{}, {}], clamping",
                self.channel,
                time,
                first,
                last
            );
        }

        self.interpolate_at(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_track(keys: &[(f32, Vec3)]) -> KeyframeTrack<Vec3> {
        let samples = keys
            .iter()
            .map(|&(t, v)| KeyframeSample::new(v, t))
            .collect();
        KeyframeTrack::new(ChannelKind::Position, samples).unwrap()
    }

    #[test]
    fn empty_track_is_rejected() {
        let err = KeyframeTrack::<Vec3>::new(ChannelKind::Scale, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            Error::EmptyTrack {
                channel: ChannelKind::Scale
            }
        );
    }

    #[test]
    fn unsorted_track_is_rejected() {
        let samples = vec![
            KeyframeSample::new(Vec3::ZERO, 0.0),
            KeyframeSample::new(Vec3::ONE, 2.0),
            KeyframeSample::new(Vec3::X, 1.0),
        ];
        let err = KeyframeTrack::new(ChannelKind::Position, samples).unwrap_err();
        assert_eq!(
            err,
            Error::UnsortedTrack {
                channel: ChannelKind::Position,
                index: 2
            }
        );
    }

    #[test]
    fn single_key_is_constant() {
        let track = position_track(&[(3.0, Vec3::new(1.0, 2.0, 3.0))]);

        for time in [-10.0, 0.0, 3.0, 1000.0] {
            assert_eq!(track.sample(time), Vec3::new(1.0, 2.0, 3.0));
            assert_eq!(track.try_sample(time).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn linear_blend_between_keys() {
        let track = position_track(&[
            (0.0, Vec3::ZERO),
            (2.0, Vec3::new(4.0, 6.0, 8.0)),
            (4.0, Vec3::new(4.0, 6.0, 0.0)),
        ]);

        assert!(track.sample(1.0).abs_diff_eq(Vec3::new(2.0, 3.0, 4.0), 1e-5));
        assert!(track.sample(2.0).abs_diff_eq(Vec3::new(4.0, 6.0, 8.0), 1e-5));
        assert!(track.sample(3.0).abs_diff_eq(Vec3::new(4.0, 6.0, 4.0), 1e-5));
        assert!(track.sample(4.0).abs_diff_eq(Vec3::new(4.0, 6.0, 0.0), 1e-5));
    }

    #[test]
    fn duplicate_timestamps_do_not_divide_by_zero() {
        let track = position_track(&[
            (0.0, Vec3::ZERO),
            (1.0, Vec3::X),
            (1.0, Vec3::Y),
            (2.0, Vec3::Z),
        ]);

        assert!(track.sample(1.0).abs_diff_eq(Vec3::Y, 1e-6));
        assert!(track.sample(1.5).is_finite());
    }

    #[test]
    fn out_of_range_reports_or_clamps() {
        let track = position_track(&[(1.0, Vec3::X), (2.0, Vec3::Y)]);

        assert_eq!(
            track.try_sample(2.5),
            Err(Error::OutOfRange {
                time: 2.5,
                first: 1.0,
                last: 2.0
            })
        );
        assert!(track.try_sample(0.5).is_err());

        assert_eq!(track.sample(2.5), Vec3::Y);
        assert_eq!(track.sample(0.5), Vec3::X);
        assert_eq!(track.sample(f32::NAN), Vec3::X);
    }

    #[test]
    fn rotation_midpoint_is_normalized_slerp() {
        let from = Quat::IDENTITY;
        let to = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let track = KeyframeTrack::new(
            ChannelKind::Rotation,
            vec![KeyframeSample::new(from, 0.0), KeyframeSample::new(to, 1.0)],
        )
        .unwrap();

        let mid = track.sample(0.5);
        assert!(mid.is_normalized());
        assert!(mid.abs_diff_eq(from.slerp(to, 0.5).normalize(), 1e-5));
        assert!(mid.abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), 1e-5));
    }
}
