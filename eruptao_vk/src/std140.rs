use nalgebra_glm as glm;

pub fn vec2(v: &glm::Vec2) -> std140::vec2 {
    std140::vec2(v[0], v[1])
}

pub fn vec4(v: &glm::Vec4) -> std140::vec4 {
    std140::vec4(v[0], v[1], v[2], v[3])
}
