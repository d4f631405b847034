use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Kling access key id (JWT issuer identity)
    pub kling_access_key: String,

    /// Kling signing secret
    pub kling_secret_key: String,

    /// Kling API base URL
    #[serde(default = "default_kling_api_base")]
    pub kling_api_base: String,

    /// Hugging Face inference API token (garment classification)
    pub hf_api_token: String,

    /// Media hosting bucket name
    pub media_bucket: String,

    /// Media hosting access key (S3-compatible)
    pub media_access_key: String,

    /// Media hosting secret key (S3-compatible)
    pub media_secret_key: String,

    /// Media hosting endpoint URL
    pub media_endpoint: String,

    /// Public base URL under which uploaded objects are served
    pub media_public_base_url: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_kling_api_base() -> String {
    "https://api.klingai.com".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
