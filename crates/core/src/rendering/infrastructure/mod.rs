pub mod jpeg_base64_encoder;
pub mod overlay_annotator;
