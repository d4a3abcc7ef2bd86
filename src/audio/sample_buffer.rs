use std::io::Cursor;

use anyhow::Context;
use symphonia::core::audio::SampleBuffer as DecodedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::frame::StereoFrame;

#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // always stereo, always at the engine rate
}

// interleaved f32 straight out of a decoder
struct Decoded {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Decode a whole sound file held in memory. `extension` picks the
    /// decoder: wav goes through hound, mp3 through symphonia.
    pub fn decode(bytes: &[u8], extension: &str, target_rate: u32) -> anyhow::Result<Self> {
        let decoded = match extension.to_ascii_lowercase().as_str() {
            "wav" => decode_wav(bytes)?,
            "mp3" => decode_mp3(bytes)?,
            other => anyhow::bail!("unsupported sound format: {other:?}"),
        };
        if decoded.channels == 0 {
            anyhow::bail!("sound has no channels");
        }

        let mut frames: Vec<StereoFrame> = if decoded.channels == 1 {
            decoded.samples.into_iter().map(StereoFrame::mono).collect() // mono, duplicate
        } else {
            // anything past the first two channels is dropped
            decoded
                .samples
                .chunks_exact(decoded.channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        if decoded.sample_rate != target_rate {
            frames = resample_linear(&frames, decoded.sample_rate, target_rate);
        }
        Ok(Self { data: frames })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn decode_wav(bytes: &[u8]) -> anyhow::Result<Decoded> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("not a readable wav file")?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader // float, just pass it through
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            // int, scale into -1..1
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<Vec<_>, _>>()?
        }
        #[allow(unreachable_patterns)]
        _ => anyhow::bail!("unsupported wav sample format: {:?}", spec.sample_format),
    };

    Ok(Decoded {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

fn decode_mp3(bytes: &[u8]) -> anyhow::Result<Decoded> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .context("not a readable mp3 file")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("mp3 has no audio track")?;
    let track_id = track.id;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("no mp3 decoder available")?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e).context("reading mp3 packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(audio) => {
                let spec = *audio.spec();
                channels = spec.channels.count();
                sample_rate = spec.rate;
                let mut buf = DecodedBuffer::<f32>::new(audio.capacity() as u64, spec);
                buf.copy_interleaved_ref(audio);
                samples.extend_from_slice(buf.samples());
            }
            // a corrupt frame is skipped, the rest of the file still plays
            Err(SymphoniaError::DecodeError(e)) => log::debug!("skipping bad mp3 frame: {e}"),
            Err(e) => return Err(e).context("decoding mp3"),
        }
    }

    if sample_rate == 0 {
        anyhow::bail!("mp3 has no sample rate");
    }
    Ok(Decoded {
        samples,
        channels,
        sample_rate,
    })
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.len() - 1;

    (0..out_len)
        .map(|i| {
            // fractional position in the source buffer
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx >= last {
                frames[last]
            } else {
                frames[idx].lerp(frames[idx + 1], (src_pos - idx as f64) as f32)
            }
        })
        .collect()
}
