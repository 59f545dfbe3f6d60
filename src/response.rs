use serde::{Deserialize, Serialize};

pub const LIMITED_BODY: &str = "Limited, don't over use me!\n";
pub const UNLIMITED_BODY: &str = "Unlimited! Let's Go!\n";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub strategy: String,
    pub tracked_identifiers: usize,
}

impl HealthResponse {
    pub fn healthy(strategy: &str, tracked_identifiers: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            strategy: strategy.to_string(),
            tracked_identifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_value(HealthResponse::healthy("tokenbucket", 3)).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["strategy"], "tokenbucket");
        assert_eq!(json["tracked_identifiers"], 3);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
