//! Lossless round trips of the run-length codec.

use proptest::prelude::*;
use tactile_core::codec::{Codec, CodecError, MAX_RUN};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_codec() -> impl Strategy<Value = Codec> {
    prop_oneof![
        Just(Codec::Passthrough),
        Just(Codec::Alpha),
        Just(Codec::Rgb),
        Just(Codec::Rgba),
    ]
}

/// Whole pixels for `codec`, drawn from a small palette so runs are common.
fn arb_pixels(codec: Codec) -> impl Strategy<Value = Vec<u8>> {
    let size = codec.pixel_size();
    proptest::collection::vec(0u8..3, 0..600).prop_map(move |choices| {
        choices
            .into_iter()
            .flat_map(|c| core::iter::repeat_n(c.wrapping_mul(0x55), size))
            .collect()
    })
}

fn arb_codec_and_pixels() -> impl Strategy<Value = (Codec, Vec<u8>)> {
    arb_codec().prop_flat_map(|codec| (Just(codec), arb_pixels(codec)))
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_round_trip((codec, raw) in arb_codec_and_pixels()) {
        let stream = codec.compress(&raw).unwrap();
        prop_assert_eq!(codec.decompress(&stream, raw.len()).unwrap(), raw);
    }

    #[test]
    fn prop_runs_never_exceed_max(len in 1usize..2000, value in any::<u8>()) {
        let raw = vec![value; len];
        let stream = Codec::Alpha.compress(&raw).unwrap();
        prop_assert_eq!(stream.len(), 2 * len.div_ceil(MAX_RUN));
        for run in stream.chunks_exact(2) {
            prop_assert!(run[0] >= 1);
        }
    }

    #[test]
    fn prop_wrong_expected_size_is_rejected((codec, raw) in arb_codec_and_pixels(), extra in 1usize..8) {
        let stream = codec.compress(&raw).unwrap();
        let result = codec.decompress(&stream, raw.len() + extra);
        let is_size_mismatch = matches!(result, Err(CodecError::SizeMismatch { .. }));
        prop_assert!(is_size_mismatch);
    }
}

#[test]
fn test_empty_input_round_trips_for_every_codec() {
    for codec in [Codec::Passthrough, Codec::Alpha, Codec::Rgb, Codec::Rgba] {
        let stream = codec.compress(&[]).unwrap();
        assert!(stream.is_empty());
        assert_eq!(codec.decompress(&stream, 0).unwrap(), Vec::<u8>::new());
    }
}

#[test]
fn test_uniform_image_compresses_to_split_runs() {
    // 320 identical RGB pixels: 255 + 65.
    let raw: Vec<u8> = core::iter::repeat_n([9u8, 8, 7], 320).flatten().collect();
    let stream = Codec::Rgb.compress(&raw).unwrap();
    assert_eq!(stream, [255, 9, 8, 7, 65, 9, 8, 7]);
    assert_eq!(Codec::Rgb.decompress(&stream, raw.len()).unwrap(), raw);
}

#[test]
fn test_misaligned_input_is_rejected() {
    assert_eq!(
        Codec::Rgba.compress(&[1, 2, 3]),
        Err(CodecError::Misaligned { len: 3, pixel_size: 4 })
    );
}
