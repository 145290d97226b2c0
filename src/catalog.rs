#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u32,
    pub preview_url: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub type Pose = CatalogEntry;
pub type BackgroundOption = CatalogEntry;

macro_rules! entry {
    ($id:expr, $file:literal, $name:literal, $description:literal) => {
        CatalogEntry {
            id: $id,
            preview_url: concat!(
                "https://storage.googleapis.com/aistudio-hosting/prompts/",
                $file
            ),
            name: $name,
            description: $description,
        }
    };
}

pub static MODEL_POSES: [Pose; 10] = [
    entry!(1, "pose_1.png", "Confident Stance", "A model stands confidently with feet shoulder-width apart, one hand on their hip, and looking directly at the camera."),
    entry!(2, "pose_2.png", "Walking Forward", "A model is captured mid-stride walking directly towards the camera, with natural arm movement, conveying a sense of purpose and motion."),
    entry!(3, "pose_3.png", "Leaning Back", "A model leans back casually against an unseen surface, with a relaxed posture, one leg crossed over the other."),
    entry!(4, "pose_4.png", "Dynamic Action", "A model in a dynamic action pose, possibly jumping or lunging, with arms and legs extended to create a sense of energy and movement."),
    entry!(5, "pose_5.png", "Casual Look", "A model in a relaxed, casual stance, looking slightly away from the camera with a natural, unposed expression."),
    entry!(6, "pose_6.png", "Seated Elegant", "A model is seated elegantly on a stool or chair, with a poised and graceful posture, hands resting gently on their lap."),
    entry!(7, "pose_7.png", "Side Profile", "A model is shown in a side profile, looking away from the camera, highlighting the silhouette of the body and clothing."),
    entry!(8, "pose_8.png", "Hands in Pockets", "A model stands casually with both hands in their pockets, exuding a cool and relaxed vibe."),
    entry!(9, "pose_9.png", "Fashion Lean", "A model leans forward in a high-fashion pose, with angular limbs and an intense expression, often seen in editorial shoots."),
    entry!(10, "pose_10.png", "Studio Pose", "A classic, neutral studio pose. The model is standing straight, facing slightly to the side but looking at the camera, with a calm and professional demeanor."),
];

pub static BACKGROUND_OPTIONS: [BackgroundOption; 6] = [
    entry!(1, "background_studio_gray.jpg", "Studio Gray", "A clean, seamless, light gray studio background."),
    entry!(2, "background_urban_street.jpg", "Urban Street", "A vibrant, gritty urban street scene with graffiti-covered walls, a wet pavement reflecting city lights, and a sense of bustling city life."),
    entry!(3, "background_nature_forest.jpg", "Forest Path", "A serene, winding path through a dense forest with sunlight filtering through the canopy of tall trees."),
    entry!(4, "background_modern_interior.jpg", "Modern Interior", "A minimalist, modern interior with clean lines, large windows, and simple, elegant furniture."),
    entry!(5, "background_beach_sunset.jpg", "Beach Sunset", "A breathtaking beach scene during sunset, with golden light, calm waves, and a wide expanse of sand."),
    entry!(6, "background_abstract_gradient.jpg", "Abstract", "An abstract background with a soft gradient of pastel colors, creating a dreamy and artistic atmosphere."),
];

pub fn find_pose(id: u32) -> Option<&'static Pose> {
    MODEL_POSES.iter().find(|pose| pose.id == id)
}

pub fn find_background(id: u32) -> Option<&'static BackgroundOption> {
    BACKGROUND_OPTIONS.iter().find(|option| option.id == id)
}
