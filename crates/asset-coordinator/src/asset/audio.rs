use std::time::Duration;

/// Decoded PCM audio with one plane of samples per channel.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples in each channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Samples of all channels interleaved frame by frame.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut samples = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            for channel in &self.channels {
                samples.push(channel.get(frame).copied().unwrap_or(0.0));
            }
        }
        samples
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::AudioBuffer;

    #[test]
    fn interleaves_channels() {
        let buffer = AudioBuffer {
            sample_rate: 4,
            channels: vec![vec![0.1, 0.2], vec![-0.1, -0.2]],
        };
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.interleaved(), vec![0.1, -0.1, 0.2, -0.2]);
        assert_eq!(buffer.duration(), Duration::from_millis(500));
    }
}
