use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Read the track length from container metadata without decoding samples.
///
/// Returns `Ok(None)` when the container is recognized but does not state its
/// length (e.g. some streamed MP3s).
pub fn duration(bytes: &Arc<[u8]>, extension: Option<&str>) -> Result<Option<f64>> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(Arc::clone(bytes))), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unsupported audio format")?;
    let track = probed
        .format
        .default_track()
        .ok_or_else(|| anyhow!("No audio track found"))?;

    let params = &track.codec_params;
    let seconds = match (params.time_base, params.n_frames) {
        (Some(tb), Some(frames)) => {
            let t = tb.calc_time(frames);
            Some(t.seconds as f64 + t.frac)
        }
        (None, Some(frames)) => params.sample_rate.map(|rate| frames as f64 / rate as f64),
        _ => None,
    };
    Ok(seconds)
}
