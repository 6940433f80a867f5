//! MP3 sniffing and decoding via Symphonia.

use super::TtsError;

/// Mono PCM produced by [`decode_mp3`].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Whether the buffer starts like an MP3 stream: an ID3v2 tag or an MPEG
/// audio frame sync (11 set bits).
pub fn looks_like_mp3(bytes: &[u8]) -> bool {
    match bytes {
        [b'I', b'D', b'3', ..] => true,
        [0xFF, second, ..] => second & 0xE0 == 0xE0,
        _ => false,
    }
}

/// Decode MP3 bytes to mono f32 PCM samples using Symphonia.
pub fn decode_mp3(mp3_bytes: &[u8]) -> Result<DecodedAudio, TtsError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    // MediaSourceStream needs an owned ('static) source.
    let cursor = std::io::Cursor::new(mp3_bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TtsError::Decode(format!("MP3 probe failed: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| TtsError::Decode("No audio track in MP3".into()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(24_000);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TtsError::Decode(format!("MP3 decoder init failed: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(TtsError::Decode(format!("MP3 decode error: {}", e)));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("MP3 packet decode error (skipping): {}", e);
                continue;
            }
        };
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let frame_channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let interleaved = sample_buf.samples();

        if frame_channels == 1 {
            samples.extend_from_slice(interleaved);
        } else {
            for frame in interleaved.chunks(frame_channels) {
                let sum: f32 = frame.iter().sum();
                samples.push(sum / frame_channels as f32);
            }
        }
    }

    if samples.is_empty() {
        return Err(TtsError::Decode(format!(
            "No audio decoded from {} bytes ({} channel stream)",
            mp3_bytes.len(),
            channels
        )));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
