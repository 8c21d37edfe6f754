// Prompt assembly for generation requests

use super::types::StyleChoice;

/// Qualifiers appended to every prompt so the result keys out cleanly
const BASE_QUALIFIERS: [&str; 2] = ["white background", "isolated"];

/// Assemble the text sent to the generation service.
///
/// Segments appear in a fixed order: character, mood, detail, resolved style,
/// then the base qualifiers. Empty fields pass through as empty segments; no
/// validation happens here. Identical inputs always yield an identical string.
pub fn compose(character: &str, mood: &str, detail: &str, style: &StyleChoice) -> String {
    let mut segments = vec![character, mood, detail, style.resolved()];
    segments.extend(BASE_QUALIFIERS);
    segments.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::StylePreset;

    #[test]
    fn test_compose_orders_segments() {
        let style = StyleChoice::preset(StylePreset::KawaiiAnime);
        let prompt = compose("a shiba inu", "happy", "wearing a hoodie", &style);
        assert_eq!(
            prompt,
            "a shiba inu, happy, wearing a hoodie, Kawaii Anime Style, white background, isolated"
        );
    }

    #[test]
    fn test_compose_passes_empty_fields_through() {
        let style = StyleChoice::preset(StylePreset::FlatVector);
        let prompt = compose("a cat", "", "", &style);
        assert_eq!(
            prompt,
            "a cat, , , Flat Vector (Minimalist), white background, isolated"
        );
    }

    #[test]
    fn test_compose_custom_style_wins() {
        let style = StyleChoice::custom("pixel art");
        let prompt = compose("a cat", "sleepy", "", &style);
        assert!(prompt.contains("pixel art"));
        assert!(!prompt.contains("Flat Vector"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let style = StyleChoice::preset(StylePreset::Crayon);
        let a = compose("a fox", "angry", "with a scarf", &style);
        let b = compose("a fox", "angry", "with a scarf", &style);
        assert_eq!(a, b);
    }
}
