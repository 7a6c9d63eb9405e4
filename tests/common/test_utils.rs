use super::mocks::MockLlmClient;
use axum::Router;
use math_notes::{
    config::{ImageDelivery, RecognitionConfig},
    inference::MathSolver,
    llm::LlmClient,
    server::{self, handlers::AppState},
    store::ImageStore,
};
use std::{
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tempfile::TempDir;

/// 1x1 transparent PNG
pub const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const TEST_BASE_URL: &str = "http://localhost:5001";

pub const TEST_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn create_store(dir: &TempDir) -> Arc<ImageStore> {
    Arc::new(ImageStore::new(dir.path(), TEST_BASE_URL))
}

/// Everything a router test needs to drive and inspect the app.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub vision: Arc<MockLlmClient>,
    pub language: Arc<MockLlmClient>,
    pub store: Arc<ImageStore>,
    pub temp_dir: TempDir,
}

pub fn create_test_app(vision: MockLlmClient, language: MockLlmClient) -> TestApp {
    create_test_app_with(vision, language, ImageDelivery::Inline)
}

pub fn create_test_app_with(
    vision: MockLlmClient,
    language: MockLlmClient,
    image_delivery: ImageDelivery,
) -> TestApp {
    let temp_dir = create_temp_dir();
    let store = create_store(&temp_dir);
    let vision = Arc::new(vision);
    let language = Arc::new(language);

    let recognition = RecognitionConfig {
        image_delivery,
        ..RecognitionConfig::default()
    };

    let solver = MathSolver::new(
        vision.clone() as Arc<dyn LlmClient>,
        language.clone() as Arc<dyn LlmClient>,
        store.clone(),
        recognition,
    );

    let state = AppState {
        solver: Arc::new(solver),
        store: store.clone(),
    };

    TestApp {
        router: server::router(state.clone(), TEST_BODY_LIMIT),
        state,
        vision,
        language,
        store,
        temp_dir,
    }
}

/// Writes a small file to `dir/name` and backdates its modification time.
pub fn write_aged_file(dir: &Path, name: &str, age: Duration) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"stale").unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
    path
}

pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}
