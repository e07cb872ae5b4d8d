//! Instruction templates sent to the analysis and generation services.

use vf_core::Angle;

/// Sampling temperature for description and angle queries.
pub const QUERY_TEMPERATURE: f32 = 0.2;

/// Free-text description of the filmed object, phrased for geometry work.
pub const DESCRIPTION_PROMPT: &str = "You are a 3D model designer. Analyze the main object in \
this video and describe it in detailed, spatially-aware language. Include information about its \
geometry, structure, materials, color, size, proportions, and component parts. Describe how these \
parts connect or relate to each other. Note any textures, curves, or distinct design features. Use \
clear language that a large language model can convert into 3D geometry using primitives like \
boxes, cylinders, tubes, or curves. If visible, mention dimensions or relative scale, and whether \
the object is static or moving in the video.";

/// Answer used when the service returned an empty description.
pub const EMPTY_DESCRIPTION: &str = "No description returned.";

/// Question asking for the single best timestamp showing only `angle`.
pub fn angle_prompt(angle: Angle) -> String {
    let excluded = match angle {
        Angle::Front => "the side or back views",
        Angle::Side => "the front or back views",
        Angle::Back => "the side or front views",
        Angle::Top => "the side views",
    };
    format!(
        "Can you return me the exact timestamp of the best time which only the {angle} view of \
         the main object can be seen fully? At this moment in the video, only the {angle} view \
         should be able to be seen, not {excluded}. Only provide the best single timestamp for my \
         request. Do not include any text other than the timestamp in your output. Your output \
         should be in the format (XX:XX)"
    )
}

/// OpenSCAD generation from the description and the reference frames.
pub fn geometry_prompt(description: &str) -> String {
    format!(
        "You are an expert in OpenSCAD 3D modeling. Based on the provided screenshots and object \
         description, generate clean, efficient OpenSCAD code.\n\n\
         Object Description: {description}\n\n\
         Requirements:\n\
         1. Create a 3D model that represents the main object from the screenshots\n\
         2. Use appropriate colors that match the object\n\
         3. Keep the model simple but recognizable\n\
         4. Use proper OpenSCAD syntax\n\
         5. Include comments naming the key parts\n\
         6. Keep the model manifold with sensible dimensions\n\n\
         Generate only the OpenSCAD code, no explanations."
    )
}

/// Game concept built around the described object.
pub fn concept_prompt(description: &str) -> String {
    format!(
        "You are a game designer. Based on the following object description, create a simple but \
         engaging game concept for a 3D web game using Three.js.\n\n\
         Object: {description}\n\n\
         Create a game concept that:\n\
         1. Features the object as the main character or central element\n\
         2. Is simple enough to implement in Three.js\n\
         3. Has clear objectives and controls\n\
         4. Is fun and engaging for players\n\
         5. Uses basic 3D mechanics (movement, collision, scoring)\n\n\
         Provide a game concept including the game type, main objective, player controls, game \
         mechanics, visual style suggestions and difficulty progression.\n\n\
         Keep it concise but comprehensive."
    )
}

/// Single-file Three.js game using the converted model.
pub fn asset_prompt(concept: &str, model_url: &str, geometry_code: &str) -> String {
    format!(
        "You are an expert Three.js developer. Create a complete, playable 3D web game based on \
         the following specifications.\n\n\
         Game Concept: {concept}\n\n\
         3D Model: The game should use the GLTF model loaded from: {model_url}\n\n\
         OpenSCAD Code (for reference): {geometry_code}\n\n\
         Requirements:\n\
         1. Create a complete HTML file with embedded Three.js game\n\
         2. Load the GLTF model and use it as the main character/object\n\
         3. Implement the game mechanics described in the concept\n\
         4. Add proper controls (WASD/arrows for movement)\n\
         5. Include collision detection\n\
         6. Add scoring system\n\
         7. Create a simple but engaging environment\n\
         8. Use modern Three.js (r155+)\n\
         9. Include lighting and shadows\n\
         10. Make it responsive and mobile-friendly\n\n\
         The game must be self-contained in a single HTML file with embedded CSS and JavaScript, \
         loading states and a game UI (score, controls).\n\n\
         Generate only the complete HTML file, no explanations."
    )
}

/// Strip a surrounding markdown code fence (```lang ... ```), if present.
pub fn unwrap_code_block(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop the info string (e.g. `openscad`, `html`) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}
