//! The generation seam: what the controller asks of an image model, and how a
//! reply made of mixed image/text parts is reduced to one result.

use async_trait::async_trait;

use crate::codec::{ImagePayload, IMAGE_TYPE_PREFIX};
use crate::error::StudioError;

pub const FALLBACK_TEXT: &str = "Sorry, I could not generate a text response.";
pub const FALLBACK_MEDIA_TYPE: &str = "image/png";

pub const STYLIZE_FAILED: &str = "Failed to generate image. Please try another style or image.";
pub const REFINE_FAILED: &str = "Failed to refine image. Please try a different prompt.";
pub const NO_IMAGE: &str = "No image was generated. The model may have declined the request.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image: ImagePayload,
    pub text: String,
}

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Apply a named aesthetic to the original room photo.
    async fn stylize(&self, original: &ImagePayload, style: &str) -> Result<GenerationResult, StudioError>;

    /// Apply a free-text change to the current design.
    async fn refine(&self, current: &ImagePayload, instruction: &str) -> Result<GenerationResult, StudioError>;
}

pub fn stylize_instruction(style: &str) -> String {
    format!(
        "Reimagine this room in a {style} style. Focus on changing furniture, color palette, \
         and decor to match the style. Keep the original room layout and architectural features \
         like windows and doors. Provide a short, friendly message about the new design."
    )
}

pub fn refine_instruction(user_prompt: &str) -> String {
    format!(
        "You are an AI interior design assistant. The user provides an image of a room design \
         you previously generated and a text prompt to modify it. Your task is to generate the \
         modified image. In addition to the image, provide a brief, friendly text response that \
         acknowledges the change and includes three markdown-formatted shoppable links for items \
         that match the new design. For example: [Modern Oak Coffee Table](https://example.com/shop/item1). \
         The user's request is: \"{user_prompt}\""
    )
}

/// One part of a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Image(ImagePayload),
    Text(String),
    Other,
}

/// Keeps the first image and the first text, whatever their order or count.
pub fn reduce_parts(
    parts: impl IntoIterator<Item = ResponsePart>,
) -> (Option<ImagePayload>, Option<String>) {
    parts
        .into_iter()
        .fold((None, None), |(image, text), part| match part {
            ResponsePart::Image(p) if image.is_none() => (Some(p), text),
            ResponsePart::Text(t) if text.is_none() => (image, Some(t)),
            _ => (image, text),
        })
}

/// The reported media type when it names an image, PNG otherwise.
pub fn normalize_media_type(reported: Option<&str>) -> String {
    match reported {
        Some(t) if t.starts_with(IMAGE_TYPE_PREFIX) => t.to_string(),
        _ => FALLBACK_MEDIA_TYPE.to_string(),
    }
}

pub fn into_result(parts: impl IntoIterator<Item = ResponsePart>) -> Option<GenerationResult> {
    let (image, text) = reduce_parts(parts);
    image.map(|image| GenerationResult {
        image,
        text: text.unwrap_or_else(|| FALLBACK_TEXT.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(tag: &str) -> ResponsePart {
        ResponsePart::Image(ImagePayload::new(tag, "image/png"))
    }

    #[test]
    fn first_image_and_first_text_win() {
        let parts = vec![
            ResponsePart::Text("first".into()),
            ResponsePart::Other,
            img("A"),
            ResponsePart::Text("second".into()),
            img("B"),
        ];
        let (image, text) = reduce_parts(parts);
        assert_eq!(image.unwrap().data, "A");
        assert_eq!(text.as_deref(), Some("first"));
    }

    #[test]
    fn missing_text_uses_fallback() {
        let result = into_result(vec![img("A")]).unwrap();
        assert_eq!(result.text, FALLBACK_TEXT);
    }

    #[test]
    fn no_image_means_no_result() {
        assert!(into_result(vec![ResponsePart::Text("only words".into())]).is_none());
        assert!(into_result(Vec::new()).is_none());
    }

    #[test]
    fn media_type_falls_back_to_png() {
        assert_eq!(normalize_media_type(Some("image/jpeg")), "image/jpeg");
        assert_eq!(normalize_media_type(Some("application/octet-stream")), "image/png");
        assert_eq!(normalize_media_type(None), "image/png");
    }

    #[test]
    fn instructions_carry_the_caller_input() {
        let s = stylize_instruction("Coastal");
        assert!(s.starts_with("Reimagine this room in a Coastal style."));
        assert!(s.contains("windows and doors"));

        let r = refine_instruction("make the rug blue");
        assert!(r.ends_with("The user's request is: \"make the rug blue\""));
        assert!(r.contains("three markdown-formatted shoppable links"));
        assert!(r.contains("[Modern Oak Coffee Table](https://example.com/shop/item1)"));
    }
}
