/// GLSL ES 3.00 sources for the two programs
pub const STANDARD_VERT: &str = include_str!("../shaders/standard.vert");
pub const STANDARD_FRAG: &str = include_str!("../shaders/standard.frag");
pub const POCKET_GLOW_FRAG: &str = include_str!("../shaders/pocket_glow.frag");

#[cfg(test)]
mod tests {
    use super::*;
    use pool3d_core::light::{LIGHT_DIRECTIONAL, LIGHT_POINT, LIGHT_SPOT, MAX_LIGHTS};

    #[test]
    fn test_light_constants_match_core() {
        assert!(STANDARD_FRAG.contains(&format!("#define MAX_LIGHTS {}", MAX_LIGHTS)));
        assert!(STANDARD_FRAG.contains(&format!("#define LIGHT_DIRECTIONAL {}", LIGHT_DIRECTIONAL)));
        assert!(STANDARD_FRAG.contains(&format!("#define LIGHT_POINT {}", LIGHT_POINT)));
        assert!(STANDARD_FRAG.contains(&format!("#define LIGHT_SPOT {}", LIGHT_SPOT)));
    }

    #[test]
    fn test_uniform_names_present() {
        for name in ["u_mvpMatrix", "u_modelMatrix", "u_normalMatrix"] {
            assert!(STANDARD_VERT.contains(name), "{name}");
        }
        for name in ["u_cameraPos", "u_lightCount", "u_lights", "u_texture", "u_hasTexture", "u_color"] {
            assert!(STANDARD_FRAG.contains(name), "{name}");
        }
        assert!(POCKET_GLOW_FRAG.contains("u_time"));
    }

    #[test]
    fn test_all_es3() {
        for source in [STANDARD_VERT, STANDARD_FRAG, POCKET_GLOW_FRAG] {
            assert!(source.starts_with("#version 300 es"));
        }
    }
}
