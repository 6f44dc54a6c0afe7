use crate::form::FormSnapshot;
use crate::templates::Template;

use super::background_directive;

/// Context block for the social strategy: every field of the template, by
/// label, regardless of blankness. The model sees the full input surface and
/// decides what deserves visual weight.
fn context_block(template: &Template, snapshot: &FormSnapshot) -> String {
    template
        .inputs
        .iter()
        .map(|field| {
            let value = snapshot.get(&field.id).unwrap_or("");
            format!("{}: \"{}\"", field.label, value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn build_brief(template: &Template, snapshot: &FormSnapshot, stylize: bool) -> String {
    format!(
        "SYSTEM INSTRUCTION: HIGH-FIDELITY GRAPHIC GENERATOR
CRITICAL MISSION: You are a World-Class Visual Designer and 3D Composition Engine. Your goal is \
to take user inputs and transform them into a viral, cinematic, high-fidelity social media \
asset. The output must look like a premium studio render, not a flat template.

TEMPLATE CONTEXT:

Type: {name}

Intent: {description}

Aspect Ratio: {aspect_ratio}

USER INPUTS:
{context}

EXECUTION PROTOCOL (STRICT VISUAL RULES)
PHASE 1: CINEMATIC ATMOSPHERE & BACKGROUND

Depth & Lighting: Do not create a flat background. Generate a deep, volumetric environment. Use \
a rich, dark gradient palette (e.g., deep espresso to burnt orange, or midnight blue to electric \
cyan) that suggests a physical studio space.

Background Treatment: {background}

Texture: Apply subtle grain or noise to prevent a \"plastic\" AI look.

Abstract Elements: In the deep background, render large, out-of-focus 3D typography or abstract \
geometric shapes (like platform logos) to create a sense of scale. Apply strong Bokeh (Depth of \
Field) to these elements so they do not compete with the foreground.

PHASE 2: ADVANCED SUBJECT INTEGRATION

Cutout & Placement: Extract the subject from the user's photo with pixel-perfect precision. \
Center them as the hero of the composition.

Relighting (Crucial): You must artificially \"relight\" the subject to match the background.

Rim Light: Apply a strong, warm glow (or color-matched light) to the edges of the subject's hair \
and shoulders to separate them from the background.

Color Grading: Adjust the subject's skin tones to have a warm, high-contrast, \"golden hour\" or \
studio-flash aesthetic.

PHASE 3: 3D TYPOGRAPHY & HIERARCHY

Hero Metric (The Big Number): Treat the main headline (e.g., \"67K+\") as a 3D Object, not just \
text. Give it extrusion, a slight bevel, and a metallic or glossy white finish. Add a subtle \
outer glow to make it pop against the dark shirt/background.

The \"Container\" Strategy: Do not let secondary text float aimlessly. Place the sub-headline \
(e.g., \"Community\") inside a High-Gloss UI Element, specifically a pill-shaped button with a \
gradient fill and drop shadow.

Body Text: Render long text in a crisp, clean, white Sans-Serif font at the bottom. Use wide \
kerning (letter spacing) for names to create a cinematic \"movie credit\" feel.

PHASE 4: THE \"PRO\" DETAILS (THE SECRET SAUCE)

Glassmorphism: Generate 2-3 \"floating\" UI cards (like social media notification bubbles or \
comment sections) behind the subject. Render them with a Frosted Glass effect (blur background, \
white border, semi-transparent). Tilt them slightly in 3D space to imply motion.

Tech Accents: Overlay thin, white HUD (Heads Up Display) lines, brackets, or small icon lists \
(Likes, Followers, Comments) in the top corners.

Stamps/Badges: If appropriate, add a metallic \"seal of approval\" or circular stamp graphic \
(e.g., \"Done & Dusted\") with a subtle grunge texture to anchor the composition.

FINAL OUTPUT: A single, hyper-realistic image that balances the user's text hierarchy with a \
rich, 3D-rendered environment.",
        name = template.name,
        description = template.description,
        aspect_ratio = template.aspect_ratio,
        context = context_block(template, snapshot),
        background = background_directive(stylize),
    )
}
