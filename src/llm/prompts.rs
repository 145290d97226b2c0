use crate::llm::provider::{BackgroundInput, SynthesisRequest};
use crate::studio::scene::GarmentCategory;

pub const ISOLATE_GARMENT_PROMPT: &str = "From the provided image, isolate the clothing item. Render the item on a transparent background, making it look like it's worn on an invisible mannequin to show its natural shape. The final output must be a PNG with a transparent background.";

pub const DESCRIBE_POSE_PROMPT: &str = "You are an expert in human anatomy and body language. Analyze the provided image and generate a concise, detailed description of the person's pose. The description should be suitable for a text-to-image AI model to accurately recreate the pose. Focus on the position of the head, torso, arms, hands, legs, and feet. Describe the overall mood or attitude conveyed by the pose (e.g., confident, relaxed, dynamic, etc.).";

pub const DESCRIBE_BACKGROUND_PROMPT: &str = "You are an expert in describing visual scenes for AI image generation. Analyze the provided image and generate a concise, detailed description of the background environment. The description should be suitable for a text-to-image AI model to accurately recreate the scene. Focus on the key elements of the location, lighting, time of day, weather, and overall mood or atmosphere. Do not describe any people or movable objects in the foreground.";

pub const SUGGEST_POSE_PROMPT: &str = "Based on the provided clothing item, describe a creative and compelling pose for a model. The pose should be suitable for a high-fashion magazine or a brand lookbook. The response must be a valid JSON object.";

pub const SUGGEST_BACKGROUND_PROMPT: &str = "Based on the provided clothing item, describe a creative and compelling background scene for a photoshoot. The background should complement the clothing and be suitable for a high-fashion magazine or a brand lookbook. The response must be a valid JSON object.";

fn clothing_instruction(category: GarmentCategory) -> &'static str {
    match category {
        GarmentCategory::Upper => "Dress the model in the upper-body clothing item from the second provided image. Pair it with simple, neutral-colored pants (e.g., dark jeans or black trousers) that do not distract from the main item.",
        GarmentCategory::Lower => "Dress the model in the lower-body clothing item from the second provided image. Pair it with a simple, neutral-colored top (e.g., a plain white or black t-shirt) that is tucked in if appropriate for the style.",
        GarmentCategory::Full => "Dress the model in the full-body clothing item from the second provided image.",
    }
}

pub fn build_synthesis_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = format!(
        "Create a single, photorealistic virtual try-on image. The final result must be a high-quality photograph with seamless integration of all elements.\n\n**Instructions:**\n1.  **Model's Face:** Use the face from the first provided image. Match skin tone and lighting perfectly with the body.\n2.  **Clothing:** {} Ensure the fabric drapes and folds realistically.",
        clothing_instruction(request.category)
    );

    let pose = request.pose.trim();
    if !pose.is_empty() {
        prompt.push_str(&format!("\n3. **Pose:** The model's pose should be: \"{pose}\"."));
        let variation = request.variation;
        if variation.total > 1 {
            prompt.push_str(&format!(
                " This is variation {} of {}. Make this pose unique while matching the description.",
                variation.index, variation.total
            ));
        }
    }

    match &request.background {
        Some(BackgroundInput::Image(_)) => {
            prompt.push_str("\n4. **Background:** Use the third provided image as the background.")
        }
        Some(BackgroundInput::Text(text)) if !text.trim().is_empty() => {
            prompt.push_str(&format!(
                "\n4. **Background:** The background must be: \"{}\".",
                text.trim()
            ));
        }
        _ => prompt.push_str("\n4. **Background:** Use a neutral, light gray studio background."),
    }

    prompt.push_str("\n\n**Crucial Details:**\n- The lighting and shadows must be consistent across the entire scene.\n- The final image must look like a real photograph, avoiding any digital or \"AI\" look.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Variation;
    use crate::studio::image::ImageData;

    fn request(pose: &str, background: Option<BackgroundInput>, total: u8) -> SynthesisRequest {
        SynthesisRequest {
            face: ImageData::new("face", "image/jpeg"),
            garment: ImageData::png("garment"),
            category: GarmentCategory::Lower,
            pose: pose.to_string(),
            background,
            variation: Variation { index: 2, total },
        }
    }

    #[test]
    fn variation_marker_only_for_batches() {
        let single = build_synthesis_prompt(&request("leaning", None, 1));
        assert!(!single.contains("variation"));
        assert!(single.contains("neutral, light gray studio background"));
        assert!(single.contains("lower-body clothing item"));

        let batch = build_synthesis_prompt(&request("leaning", None, 3));
        assert!(batch.contains("This is variation 2 of 3."));
    }

    #[test]
    fn background_image_is_the_third_attachment() {
        let bg = Some(BackgroundInput::Image(ImageData::new("bg", "image/jpeg")));
        let prompt = build_synthesis_prompt(&request("x", bg, 1));
        assert!(prompt.contains("Use the third provided image as the background."));
        assert!(prompt.contains("The model's pose should be: \"x\"."));
    }

    #[test]
    fn blank_pose_line_is_omitted() {
        let prompt = build_synthesis_prompt(&request("   ", None, 2));
        assert!(!prompt.contains("**Pose:**"));
    }
}
