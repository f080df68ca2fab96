use std::fmt::Debug;

use glam::{Quat, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationKeyFrame<T: Debug + Clone> {
    pub time: f32,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKeyFrames<T: Debug + Clone> {
    Linear(Vec<AnimationKeyFrame<T>>),
    Step(Vec<AnimationKeyFrame<T>>),
    // in-tangent, value, out-tangent
    CubicSpline(Vec<AnimationKeyFrame<(T, T, T)>>),
}

impl<T: Debug + Clone> AnimationKeyFrames<T> {
    pub fn len(&self) -> usize {
        match self {
            AnimationKeyFrames::Linear(frames) | AnimationKeyFrames::Step(frames) => frames.len(),
            AnimationKeyFrames::CubicSpline(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of the last keyframe.
    pub fn end_time(&self) -> f32 {
        let last = match self {
            AnimationKeyFrames::Linear(frames) | AnimationKeyFrames::Step(frames) => {
                frames.last().map(|frame| frame.time)
            }
            AnimationKeyFrames::CubicSpline(frames) => frames.last().map(|frame| frame.time),
        };
        last.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationSampler {
    Translation(AnimationKeyFrames<Vec3>),
    Rotation(AnimationKeyFrames<Quat>),
    Scale(AnimationKeyFrames<Vec3>),
    /// One weight per morph target for every keyframe.
    MorphWeights(AnimationKeyFrames<Vec<f32>>),
}

impl AnimationSampler {
    pub fn end_time(&self) -> f32 {
        match self {
            AnimationSampler::Translation(frames) | AnimationSampler::Scale(frames) => {
                frames.end_time()
            }
            AnimationSampler::Rotation(frames) => frames.end_time(),
            AnimationSampler::MorphWeights(frames) => frames.end_time(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationChannelAsset {
    /// Index of the animated node.
    pub target: usize,
    pub sampler: AnimationSampler,
}

#[derive(Debug, Clone)]
pub struct AnimationAsset {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannelAsset>,
}

impl AnimationAsset {
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .map(|channel| channel.sampler.end_time())
            .fold(0.0, f32::max)
    }
}
