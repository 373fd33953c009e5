// Animation clips are stored with their model; sampling them is left to callers.

use std::collections::HashMap;

use glam::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

pub struct Animation {
    pub name: String,
    /// Seconds, the latest key time across all channels.
    pub duration: f32,
    pub tracks: Vec<Track>,
}

pub struct Track {
    pub node_name: String,
    /// Entry index in the owning model's flattened nodes, resolved at build.
    pub target: Option<usize>,
    pub translation: Option<Channel<Vec3>>,
    pub rotation: Option<Channel<Quat>>,
    pub scale: Option<Channel<Vec3>>,
}

pub struct Channel<T> {
    pub times: Box<[f32]>,
    pub values: Box<[T]>,
    pub interpolation: Interpolation,
}

impl<T> Channel<T> {
    pub fn last_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

impl Track {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            target: None,
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    fn last_time(&self) -> f32 {
        let t = self.translation.as_ref().map_or(0.0, Channel::last_time);
        let r = self.rotation.as_ref().map_or(0.0, Channel::last_time);
        let s = self.scale.as_ref().map_or(0.0, Channel::last_time);
        t.max(r).max(s)
    }
}

impl Animation {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::last_time).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Points every track at its node's entry. Returns how many tracks found
    /// no node.
    pub fn resolve_targets(&mut self, entries_by_name: &HashMap<String, usize>) -> usize {
        let mut missing = 0;
        for track in &mut self.tracks {
            track.target = entries_by_name.get(&track.node_name).copied();
            if track.target.is_none() {
                missing += 1;
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel<T: Clone>(times: &[f32], value: T) -> Channel<T> {
        Channel {
            times: times.into(),
            values: vec![value; times.len()].into_boxed_slice(),
            interpolation: Interpolation::Linear,
        }
    }

    #[test]
    fn duration_is_latest_key() {
        let mut walk = Track::new("hip");
        walk.translation = Some(channel(&[0.0, 0.5], Vec3::ZERO));
        walk.rotation = Some(channel(&[0.0, 1.25], Quat::IDENTITY));
        let mut idle = Track::new("knee");
        idle.scale = Some(channel(&[0.0, 0.75], Vec3::ONE));

        let animation = Animation::new("walk", vec![walk, idle]);
        assert_eq!(animation.duration, 1.25);
    }

    #[test]
    fn empty_animation_has_zero_duration() {
        assert_eq!(Animation::new("none", vec![]).duration, 0.0);
    }

    #[test]
    fn resolve_marks_missing_targets() {
        let mut animation = Animation::new("wave", vec![Track::new("arm"), Track::new("wing")]);
        let by_name = HashMap::from([("arm".to_string(), 3usize)]);
        assert_eq!(animation.resolve_targets(&by_name), 1);
        assert_eq!(animation.tracks[0].target, Some(3));
        assert_eq!(animation.tracks[1].target, None);
    }
}
