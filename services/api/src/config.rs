//! Server settings layered from defaults, an optional file and the environment

use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    /// Directory product images are written to and served from
    pub upload_dir: PathBuf,
    /// Browser origin allowed by CORS
    pub cors_origin: String,
    /// Password for the bootstrap admin account
    pub admin_password: String,
    pub seed_sample_products: bool,
}

impl Settings {
    /// Load settings; `config/storefront.toml` is read when present and
    /// environment variables (`PORT`, `UPLOAD_DIR`, ...) win over both.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("port", 5000)?
            .set_default("upload_dir", "public/uploads")?
            .set_default("cors_origin", "http://localhost:5173")?
            .set_default("admin_password", "admin")?
            .set_default("seed_sample_products", true)?
            .add_source(File::with_name("config/storefront").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    const VARS: [&str; 5] = [
        "PORT",
        "UPLOAD_DIR",
        "CORS_ORIGIN",
        "ADMIN_PASSWORD",
        "SEED_SAMPLE_PRODUCTS",
    ];

    fn clear() {
        for var in VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let settings = Settings::load().unwrap();

        assert_eq!(settings.port, 5000);
        assert_eq!(settings.upload_dir, PathBuf::from("public/uploads"));
        assert_eq!(settings.cors_origin, "http://localhost:5173");
        assert_eq!(settings.admin_password, "admin");
        assert!(settings.seed_sample_products);
        assert_eq!(settings.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("UPLOAD_DIR", "/var/lib/storefront/uploads");
            env::set_var("SEED_SAMPLE_PRODUCTS", "false");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.upload_dir, PathBuf::from("/var/lib/storefront/uploads"));
        assert!(!settings.seed_sample_products);

        clear();
    }
}
