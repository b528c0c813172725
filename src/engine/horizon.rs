//! Electronic horizon request payload

use crate::core::Position;
use serde::{Deserialize, Serialize};

/// How far the horizon expands beyond the most probable path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expansion {
    /// Most probable path only
    #[default]
    #[serde(rename = "1D")]
    OneD,
    /// Most probable path plus its direct side branches
    #[serde(rename = "1.5D")]
    OneAndHalfD,
    /// Full road graph around the vehicle
    #[serde(rename = "2D")]
    TwoD,
}

impl Expansion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expansion::OneD => "1D",
            Expansion::OneAndHalfD => "1.5D",
            Expansion::TwoD => "2D",
        }
    }
}

/// Options block of a horizon request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HorizonOptions {
    pub expansion: Expansion,
}

/// Request for a forward horizon built from recent positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicHorizonRequest {
    /// Recent positions, oldest first
    pub shape: Vec<Position>,
    #[serde(rename = "eh_options")]
    pub options: HorizonOptions,
}

impl ElectronicHorizonRequest {
    pub fn new(shape: Vec<Position>, expansion: Expansion) -> Self {
        Self {
            shape,
            options: HorizonOptions { expansion },
        }
    }

    /// JSON payload handed to the engine
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_request_wire_format() {
        let request = ElectronicHorizonRequest::new(
            vec![Position::new(1.0, 2.0), Position::new(1.5, 2.5)],
            Expansion::OneD,
        );
        let value: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "shape": [{"lat": 1.0, "lon": 2.0}, {"lat": 1.5, "lon": 2.5}],
                "eh_options": {"expansion": "1D"}
            })
        );
    }

    #[test]
    fn test_expansion_names() {
        for expansion in [Expansion::OneD, Expansion::OneAndHalfD, Expansion::TwoD] {
            let json = serde_json::to_string(&expansion).unwrap();
            assert_eq!(json, format!("\"{}\"", expansion.as_str()));
            assert_eq!(serde_json::from_str::<Expansion>(&json).unwrap(), expansion);
        }
    }

    #[test]
    fn test_empty_shape_is_valid() {
        let request = ElectronicHorizonRequest::new(Vec::new(), Expansion::TwoD);
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"shape":[],"eh_options":{"expansion":"2D"}}"#
        );
    }
}
