//! Shared fixtures for colori-server integration tests
//!
//! Remote services are replaced by in-process fakes; the database is an
//! in-memory SQLite pool.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use colori_server::services::{
    AnalyzerError, ColorAnalyzer, GeneratedImage, IdentityError, IdentityProvider, IdentityUser,
    ImageGenError, ImageUploader, OutfitImageGenerator, SelfieImage, UploadError,
};
use colori_server::{build_router, AppState, ServerSettings};

pub const ALICE_TOKEN: &str = "token-alice";
pub const ALICE_ID: &str = "user_alice";
pub const BOB_TOKEN: &str = "token-bob";
pub const BOB_ID: &str = "user_bob";
pub const ADMIN_TOKEN: &str = "token-admin";
pub const ADMIN_ID: &str = "user_admin";

pub const SAMPLE_ANALYSIS: &str = r#"
**Seasonal Color Type:** Soft Autumn

**Color Extraction:**
Label, HEX
Face, #EDC1A8
Eye, #6A5554
Hair, #3C3334

**9-Color Seasonal Palette:**
Name, HEX
Dusty Rose, #C0A6A1
Olive, #808000
Camel, #C19A6B

**Jewelry Tone:** Gold, #D4AF37

**Flattering Hair Colors:**
Chestnut Brown, #954535
Honey Blonde, #E3C16F

**Makeup Suggestions**
**Foundations:**
- Estee Lauder, Double Wear, 2W1 Dawn, #E5C3A5, https://example.com/dw
**Korean Cushion:**
- Laneige, Neo Cushion Matte, 21N, #EBCDB1, https://example.com/laneige
**Lipsticks:**
- MAC, Matte Lipstick, Velvet Teddy, #A86B5B, https://example.com/mac
**Blushes:**
- NARS, Blush, Torrid, #E58C7A, https://example.com/nars
**Eyeshadow Palettes:**
- Urban Decay, Naked3, Palette, #B88A7A, https://example.com/ud

**Similar Celebrities:**
- Jennifer Aniston
- Gigi Hadid

**Image Prompt:** A flatlay of a Sporty summer outfit using #C0A6A1, #808000 and #C19A6B.
"#;

/// Analyzer that returns canned text and records the age/style it was given
pub struct FakeAnalyzer {
    pub response: Mutex<Option<String>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeAnalyzer {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Mutex::new(Some(text.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn last_call(&self) -> Option<(String, String)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ColorAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _selfie: &SelfieImage, age: &str, style: &str) -> Result<String, AnalyzerError> {
        self.calls
            .lock()
            .unwrap()
            .push((age.to_string(), style.to_string()));
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AnalyzerError::ApiError(500, "model overloaded".to_string()))
    }
}

/// Generator that returns a short-lived URL (like OpenAI) unless told otherwise
pub struct FakeImageGenerator {
    pub persistent: bool,
    pub fail: bool,
}

#[async_trait]
impl OutfitImageGenerator for FakeImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        if self.fail {
            return Err(ImageGenError::ApiError(400, "content policy".to_string()));
        }
        Ok(GeneratedImage {
            url: "https://images.example/raw.png".to_string(),
            prompt: prompt.to_string(),
            persistent: self.persistent,
        })
    }
}

/// Uploader that records what it was asked to re-host
#[derive(Default)]
pub struct FakeUploader {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageUploader for FakeUploader {
    async fn upload(&self, source_url: &str) -> Result<String, UploadError> {
        self.uploads.lock().unwrap().push(source_url.to_string());
        Ok("https://cdn.example/hosted.png".to_string())
    }
}

/// Identity provider backed by fixed tokens and users
pub struct FakeIdentity {
    pub sessions: HashMap<String, String>,
    pub users: Mutex<HashMap<String, IdentityUser>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn standard() -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(ALICE_TOKEN.to_string(), ALICE_ID.to_string());
        sessions.insert(BOB_TOKEN.to_string(), BOB_ID.to_string());
        sessions.insert(ADMIN_TOKEN.to_string(), ADMIN_ID.to_string());

        let mut users = HashMap::new();
        users.insert(ALICE_ID.to_string(), user(ALICE_ID, "Alice", json!({})));
        users.insert(BOB_ID.to_string(), user(BOB_ID, "Bob", json!({"role": "member"})));
        users.insert(ADMIN_ID.to_string(), user(ADMIN_ID, "Ada", json!({"role": "admin"})));

        Self {
            sessions,
            users: Mutex::new(users),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

fn user(id: &str, first_name: &str, public_metadata: Value) -> IdentityUser {
    IdentityUser {
        id: id.to_string(),
        first_name: Some(first_name.to_string()),
        public_metadata,
        ..IdentityUser::default()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_session(&self, token: &str) -> Result<String, IdentityError> {
        self.sessions
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidSession("unknown token".to_string()))
    }

    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let removed = self.users.lock().unwrap().remove(user_id);
        if removed.is_none() {
            return Err(IdentityError::UserNotFound(user_id.to_string()));
        }
        self.deleted.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub analyzer: Arc<FakeAnalyzer>,
    pub uploader: Arc<FakeUploader>,
    pub identity: Arc<FakeIdentity>,
}

pub async fn test_app() -> TestApp {
    test_app_with(FakeAnalyzer::returning(SAMPLE_ANALYSIS), FakeImageGenerator { persistent: false, fail: false }).await
}

pub async fn test_app_with(analyzer: FakeAnalyzer, generator: FakeImageGenerator) -> TestApp {
    let db = colori_common::db::init_memory_database()
        .await
        .expect("in-memory database");

    let analyzer = Arc::new(analyzer);
    let uploader = Arc::new(FakeUploader::default());
    let identity = Arc::new(FakeIdentity::standard());

    let state = AppState::new(
        db,
        analyzer.clone(),
        Arc::new(generator),
        uploader.clone(),
        identity.clone(),
        ServerSettings {
            max_selfie_bytes: 64 * 1024,
            ..ServerSettings::default()
        },
    );

    TestApp {
        router: build_router(state.clone()),
        state,
        analyzer,
        uploader,
        identity,
    }
}

/// A tiny valid PNG-typed data URL
pub fn selfie_data_url() -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG\r\n\x1a\nfake-selfie"))
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn extract_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}
