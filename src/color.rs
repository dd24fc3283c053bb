use serde::{Deserialize, Serialize};

/// RGBA color carried by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Translucent red used for freshly spawned agents
    pub const DEFAULT_AGENT: Color = Color::new(255, 0, 0, 100);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_AGENT
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_translucent_red() {
        assert_eq!(Color::default().to_array(), [255, 0, 0, 100]);
        assert_eq!(Color::from([255, 0, 0, 100]), Color::DEFAULT_AGENT);
    }

    #[test]
    fn test_serializes_as_named_channels() {
        let json = serde_json::to_string(&Color::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"r":1,"g":2,"b":3,"a":4}"#);
    }
}
