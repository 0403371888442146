//! Deterministic results used when no real generation happens.

use verkove_core::catalog::unsplash;

const FALLBACK_PHOTOS: [&str; 5] = [
    "photo-1605100804763-247f67b3557e",
    "photo-1515562141207-7a88fb7ce338",
    "photo-1617038260897-41a1f14a8ca0",
    "photo-1603561596112-0a132b757442",
    "photo-1506630448388-4e683c67ddb0",
];

pub const CHAT_APOLOGY: &str = "I'm sorry, I'm having trouble connecting to the design assistant \
right now. Please try again in a moment. In the meantime you can keep exploring base designs and \
enhancements in the workspace.";

/// The fixed placeholder catalog, in selection order.
pub fn fallback_images() -> Vec<String> {
    FALLBACK_PHOTOS.iter().map(|photo| unsplash(photo)).collect()
}

/// `hash = hash * 31 + unit` over the UTF-16 code units of `prompt`, in
/// wrapping 32-bit signed arithmetic.
pub fn prompt_hash(prompt: &str) -> i32 {
    prompt
        .encode_utf16()
        .fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
}

/// Placeholder image for `prompt`. The same prompt always maps to the same
/// image.
pub fn fallback_image(prompt: &str) -> String {
    let index = prompt_hash(prompt).unsigned_abs() as usize % FALLBACK_PHOTOS.len();
    unsplash(FALLBACK_PHOTOS[index])
}

/// aiResponse text for a preview iteration.
pub fn preview_response(prompt: &str) -> String {
    format!(
        "This is a preview design for \"{}\". AI image generation is currently unavailable, \
so a reference image from our catalog is shown instead. Your request has been saved and you \
can keep refining it.",
        prompt.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_java_style_string_hash() {
        assert_eq!(prompt_hash(""), 0);
        assert_eq!(prompt_hash("a"), 97);
        assert_eq!(prompt_hash("ab"), 97 * 31 + 98);
        let wide = "make it bigger"
            .encode_utf16()
            .fold(0_i64, |h, u| i64::from((h * 31 + i64::from(u)) as i32));
        assert_eq!(i64::from(prompt_hash("make it bigger")), wide);
    }

    #[test]
    fn selection_is_deterministic_and_in_catalog() {
        let catalog = fallback_images();
        for prompt in ["make it bigger", "rose gold band", "a pendant with three opals", "é💎"] {
            let first = fallback_image(prompt);
            assert_eq!(first, fallback_image(prompt));
            assert!(catalog.contains(&first), "{first} not in catalog");
        }
    }

    #[test]
    fn small_hashes_index_directly() {
        // "a" hashes to 97, 97 % 5 == 2.
        assert_eq!(fallback_image("a"), fallback_images()[2]);
        assert_eq!(fallback_image(""), fallback_images()[0]);
    }

    #[test]
    fn preview_response_names_the_prompt() {
        let text = preview_response("  make it bigger ");
        assert!(text.contains("\"make it bigger\""));
        assert!(text.contains("preview"));
    }
}
