//! Voice Transformer Adapters

mod flac_encoder;
mod opus_encoder;
mod resample_transformer;

pub use resample_transformer::{DecodedPcm, ResampleTransformer};
