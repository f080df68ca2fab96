use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::{self, Cursor},
    sync::Arc,
};

use log::{debug, warn};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

use crate::{
    asset::AudioBuffer,
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SourceUri},
};

use super::Loader;

#[derive(Debug)]
pub enum AudioLoadError {
    Fetch(FetchError),
    Decode(SymphoniaError),
    NoTrack,
    UnknownSampleRate,
}

impl AudioLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            AudioLoadError::Fetch(error) => error.kind(),
            _ => LoadErrorKind::DecodeFailure,
        }
    }
}

impl Display for AudioLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AudioLoadError::Fetch(error) => Display::fmt(&error, f),
            AudioLoadError::Decode(error) => write!(f, "Failed to decode audio: {}", error),
            AudioLoadError::NoTrack => write!(f, "No audio track found"),
            AudioLoadError::UnknownSampleRate => write!(f, "Unknown sample rate"),
        }
    }
}

impl Error for AudioLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AudioLoadError::Fetch(error) => Some(error),
            AudioLoadError::Decode(error) => Some(error),
            _ => None,
        }
    }
}

impl From<FetchError> for AudioLoadError {
    fn from(value: FetchError) -> Self {
        AudioLoadError::Fetch(value)
    }
}

impl From<SymphoniaError> for AudioLoadError {
    fn from(value: SymphoniaError) -> Self {
        AudioLoadError::Decode(value)
    }
}

fn is_end_of_stream(error: &SymphoniaError) -> bool {
    matches!(error, SymphoniaError::IoError(error) if error.kind() == io::ErrorKind::UnexpectedEof)
}

/// Appends interleaved frames to per channel planes, opening new planes when
/// the layout grows mid stream. Planes added late are padded with silence.
fn push_frames(channels: &mut Vec<Vec<f32>>, interleaved: &[f32], channel_count: usize) {
    let channel_count = channel_count.max(1);
    if channels.len() < channel_count {
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        channels.resize(channel_count, vec![0.0; frames]);
    }
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in channels.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }
    // Planes the current layout doesn't feed keep the frame count aligned.
    let frames = channels[0].len();
    for channel in channels.iter_mut().skip(channel_count) {
        channel.resize(frames, 0.0);
    }
}

/// Decodes the default track of a whole file into planar `f32` samples.
///
/// Chained streams and parameter changes ask for a reset: the decoder is
/// rebuilt for the new default track and decoding goes on.
pub(crate) fn decode_audio(buffer: Vec<u8>, hint: &Hint) -> Result<AudioBuffer, AudioLoadError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(buffer)), Default::default());
    let probed = symphonia::default::get_probe().format(
        hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or(AudioLoadError::NoTrack)?;
    let mut track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioLoadError::UnknownSampleRate)?;
    let mut channel_count = track
        .codec_params
        .channels
        .map(|channels| channels.count())
        .unwrap_or(0);
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels = Vec::<Vec<f32>>::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(error) if is_end_of_stream(&error) => break,
            Err(SymphoniaError::ResetRequired) => {
                let track = format_reader
                    .default_track()
                    .ok_or(AudioLoadError::NoTrack)?;
                warn!("Audio track list changed, continuing with track {}", track.id);
                if track.codec_params.sample_rate != Some(sample_rate) {
                    warn!(
                        "Track {} doesn't play at {} Hz, samples are kept as they are",
                        track.id, sample_rate
                    );
                }
                track_id = track.id;
                decoder = symphonia::default::get_codecs()
                    .make(&track.codec_params, &DecoderOptions::default())?;
                continue;
            }
            Err(error) => return Err(error.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                channel_count = decoded.spec().channels.count();
                let mut samples =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                samples.copy_interleaved_ref(decoded);
                push_frames(&mut channels, samples.samples(), channel_count);
            }
            Err(SymphoniaError::DecodeError(error)) => {
                warn!("Skipping undecodable audio packet: {}", error);
            }
            Err(SymphoniaError::ResetRequired) => {
                warn!("Audio decoder asked for a reset at track {}", track_id);
                decoder.reset();
            }
            Err(error) => return Err(error.into()),
        }
    }

    if channels.is_empty() {
        channels = vec![Vec::new(); channel_count.max(1)];
    }
    Ok(AudioBuffer {
        sample_rate,
        channels,
    })
}

/// Loads any container and codec symphonia was built with.
pub struct AudioLoader<F> {
    fetcher: Arc<F>,
}

impl<F> AudioLoader<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetch> Loader for AudioLoader<F> {
    type Asset = AudioBuffer;
    type Error = AudioLoadError;

    async fn load(&self, source: &SourceUri) -> Result<AudioBuffer, AudioLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;

        let mut hint = Hint::new();
        if let Some(mime) = source.mime() {
            hint.mime_type(mime);
        }
        if let Some(extension) = source.extension() {
            hint.with_extension(&extension);
        }

        let audio = decode_audio(buffer, &hint)?;
        debug!(
            "Decoded {} channels, {} frames at {} Hz from {}",
            audio.channel_count(),
            audio.frames(),
            audio.sample_rate,
            source
        );
        Ok(audio)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use crate::{
        error::LoadErrorKind,
        loader::Loader,
        source::{MemoryFetcher, SourceUri},
    };

    use std::io;

    use symphonia::core::errors::Error as SymphoniaError;

    use super::{is_end_of_stream, push_frames, AudioLoader};

    /// 16 bit PCM WAV file with interleaved `samples`.
    pub fn pcm16_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            wav.extend_from_slice(&sample.to_le_bytes());
        }
        wav
    }

    #[tokio::test]
    async fn decodes_stereo_wav_into_planes() {
        let samples = [0, 16384, 8192, -16384, 0, 16384, 8192, -16384];
        let fetcher = MemoryFetcher::new().with("sounds/click.wav", pcm16_wav(8000, 2, &samples));
        let loader = AudioLoader::new(Arc::new(fetcher));

        let audio = loader
            .load(&SourceUri::parse("sounds/click.wav").unwrap())
            .await
            .unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frames(), 4);
        assert_eq!(audio.channels[0], vec![0.0, 0.25, 0.0, 0.25]);
        assert_eq!(audio.channels[1], vec![0.5, -0.5, 0.5, -0.5]);
    }

    #[test]
    fn only_eof_ends_the_stream() {
        let eof = SymphoniaError::IoError(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(is_end_of_stream(&eof));
        assert!(!is_end_of_stream(&SymphoniaError::ResetRequired));
        assert!(!is_end_of_stream(&SymphoniaError::DecodeError("bad frame")));
    }

    #[test]
    fn layout_changes_keep_planes_aligned() {
        let mut channels = Vec::new();
        push_frames(&mut channels, &[0.1, 0.2], 1);
        push_frames(&mut channels, &[0.3, -0.3, 0.4, -0.4], 2);
        push_frames(&mut channels, &[0.5], 1);
        assert_eq!(channels[0], vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(channels[1], vec![0.0, 0.0, -0.3, -0.4, 0.0]);
    }

    #[tokio::test]
    async fn noise_is_a_decode_failure() {
        let fetcher = MemoryFetcher::new().with("noise.ogg", vec![7u8; 64]);
        let loader = AudioLoader::new(Arc::new(fetcher));
        let error = loader
            .load(&SourceUri::parse("noise.ogg").unwrap())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);
    }
}
