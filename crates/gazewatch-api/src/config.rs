//! API configuration.

use std::path::PathBuf;

use gazewatch_vision::decode::DEFAULT_MAX_FRAME_BYTES;
use gazewatch_vision::{DetectorOptions, EngineConfig};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins. `*` (the default) accepts any origin.
    pub cors_origins: Vec<String>,
    /// Face landmarker model directory
    pub model_dir: PathBuf,
    /// Largest accepted encoded frame in bytes
    pub max_frame_bytes: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            model_dir: PathBuf::from("./models/face_landmarker"),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./models/face_landmarker")),
            max_frame_bytes: std::env::var("MAX_FRAME_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FRAME_BYTES),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Whether every origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    /// Startup warning for wildcard origins, worded more strongly in production.
    pub fn origin_warning(&self) -> Option<&'static str> {
        if !self.allows_any_origin() {
            None
        } else if self.is_production() {
            Some("CORS_ORIGINS=* in production: any site can open analysis sessions")
        } else {
            Some("Accepting WebSocket connections from any origin (CORS_ORIGINS=*)")
        }
    }

    /// Vision engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model_dir: self.model_dir.clone(),
            detector: DetectorOptions::default(),
            max_frame_bytes: self.max_frame_bytes,
        }
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(config.allows_any_origin());
        assert!(!config.is_production());
    }

    #[test]
    fn test_origin_warning_depends_on_environment() {
        let dev = ApiConfig::default();
        assert_eq!(
            dev.origin_warning(),
            Some("Accepting WebSocket connections from any origin (CORS_ORIGINS=*)")
        );

        let prod = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(prod.is_production());
        assert!(prod.origin_warning().unwrap().contains("in production"));

        let restricted = ApiConfig {
            environment: "production".to_string(),
            cors_origins: vec!["https://class.example".to_string()],
            ..ApiConfig::default()
        };
        assert_eq!(restricted.origin_warning(), None);
    }

    #[test]
    fn test_engine_config_follows_api_config() {
        let config = ApiConfig {
            model_dir: PathBuf::from("/opt/models"),
            max_frame_bytes: 1234,
            ..ApiConfig::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(engine.max_frame_bytes, 1234);
        assert_eq!(engine.detector.num_faces, 2);
        assert!(engine.detector.output_blendshapes);
    }
}
