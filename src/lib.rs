// Module declarations
pub mod agents;
pub mod artifacts;
pub mod cancel;
pub mod error;
pub mod files;
pub mod intelligence;
pub mod lifecycle;
pub mod logging;
pub mod qa_history;
pub mod recording;
pub mod settings;
pub mod transcription;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agents::{ChatSession, ImageAttachment, ImageChatSession};
use artifacts::SqliteArtifactStore;
use error::AppError;
use files::FileManager;
use intelligence::{Assistant, CompletionProvider};
use lifecycle::RecordingLifecycle;
use qa_history::{QaHistoryEntry, QaHistoryStore, SqliteQaHistory, QA_HISTORY_CAPACITY};
use recording::{AudioCapture, MediaProbe};
use settings::{ModelSettings, SettingsManager, TokenBudgets};
use transcription::RemoteTranscriptionProvider;

/// Identifier of the app's data directory under the platform data dir
pub const APP_ID: &str = "com.voicerecorder.app";

/// Where the app keeps its files
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Holds `recordings/`, `logs/` and `recorder.db`
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl AppPaths {
    /// Platform defaults: `<data_dir>/com.voicerecorder.app` and
    /// `~/.voice-recorder/settings.json`
    pub fn platform_default() -> Result<Self, AppError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AppError::Config("Failed to determine app data directory".to_string()))?
            .join(APP_ID);
        let settings_path = dirs::home_dir()
            .ok_or_else(|| AppError::Config("Failed to get home directory".to_string()))?
            .join(".voice-recorder")
            .join("settings.json");

        Ok(Self {
            data_dir,
            settings_path,
        })
    }
}

/// Everything the app surfaces need, wired once at startup
///
/// Remote clients are built from the settings in effect at startup; call
/// [`bootstrap_with`] again after changing API settings.
pub struct AppState {
    pub settings: Arc<SettingsManager>,
    pub lifecycle: Arc<RecordingLifecycle>,
    pub assistant: Arc<Assistant>,
    pub qa_history: Arc<dyn QaHistoryStore>,
    completion: Arc<dyn CompletionProvider>,
    models: ModelSettings,
    budgets: TokenBudgets,
}

impl AppState {
    /// Fresh plain-chat session with empty history
    pub fn new_chat_session(&self) -> ChatSession {
        ChatSession::new(
            self.completion.clone(),
            self.models.chat_model.clone(),
            self.budgets.chat,
        )
    }

    /// Fresh image QA session; choosing another image means calling this again
    pub fn new_image_session(&self, image: ImageAttachment) -> ImageChatSession {
        ImageChatSession::new(
            self.completion.clone(),
            self.qa_history.clone(),
            self.models.vision_model.clone(),
            self.budgets.vision,
            image,
        )
    }

    /// Summarize pasted text
    pub async fn summarize_document(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        cancel::cancellable(cancel, self.assistant.summarize_document(text)).await
    }

    /// Image QA history, newest first
    pub async fn qa_history(&self) -> Result<Vec<QaHistoryEntry>, AppError> {
        self.qa_history.list().await
    }

    pub async fn delete_qa_entry(&self, id: &str) -> Result<(), AppError> {
        self.qa_history.delete(id).await
    }

    pub async fn clear_qa_history(&self) -> Result<(), AppError> {
        self.qa_history.clear().await
    }
}

/// Wire the app using the platform default paths
pub async fn bootstrap(
    capture: Arc<dyn AudioCapture>,
    probe: Arc<dyn MediaProbe>,
) -> Result<AppState, AppError> {
    bootstrap_with(AppPaths::platform_default()?, capture, probe).await
}

/// Wire the app over explicit paths
pub async fn bootstrap_with(
    paths: AppPaths,
    capture: Arc<dyn AudioCapture>,
    probe: Arc<dyn MediaProbe>,
) -> Result<AppState, AppError> {
    logging::init(&paths.data_dir.join("logs"));
    tracing::info!("Bootstrap: Data directory {}", paths.data_dir.display());

    let settings_manager = Arc::new(SettingsManager::new_with_path(paths.settings_path)?);
    let settings = settings_manager.get();

    let files = FileManager::new_with_dir(paths.data_dir.join("recordings"))?;

    let artifact_store = SqliteArtifactStore::open(&paths.data_dir.join("recorder.db"))?;
    let qa_history: Arc<dyn QaHistoryStore> = Arc::new(SqliteQaHistory::with_conn(
        artifact_store.get_conn(),
        QA_HISTORY_CAPACITY,
    )?);

    let completion = intelligence::create_provider(&settings.api);
    let assistant = Arc::new(Assistant::new(completion.clone(), &settings));
    let transcriber = Arc::new(RemoteTranscriptionProvider::new(&settings.api)?);

    let lifecycle = Arc::new(RecordingLifecycle::new(
        files,
        Arc::new(artifact_store),
        transcriber,
        assistant.clone(),
        capture,
        probe,
    ));

    let recordings = lifecycle.refresh().await?;
    tracing::info!(
        "Bootstrap: Ready with {} recordings (completion: {})",
        recordings.len(),
        completion.name()
    );

    Ok(AppState {
        settings: settings_manager,
        lifecycle,
        assistant,
        qa_history,
        completion,
        models: settings.models,
        budgets: settings.budgets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::NoMediaProbe;
    use crate::test_support::{FakeCapture, MockCompletionProvider};

    async fn bootstrap_in(dir: &std::path::Path) -> AppState {
        let paths = AppPaths {
            data_dir: dir.join("data"),
            settings_path: dir.join("settings.json"),
        };
        bootstrap_with(
            paths,
            Arc::new(FakeCapture::with_bytes(b"audio")),
            Arc::new(NoMediaProbe),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let state = bootstrap_in(dir.path()).await;

        assert!(dir.path().join("data/recordings").is_dir());
        assert!(dir.path().join("data/recorder.db").is_file());
        assert!(dir.path().join("settings.json").is_file());
        assert!(state.lifecycle.recordings().unwrap().is_empty());
        assert!(state.qa_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_use_configured_models() {
        let dir = tempfile::tempdir().unwrap();
        let mut configured = settings::Settings::default();
        configured.models.chat_model = "acme/chat-small".to_string();
        configured.models.vision_model = "acme/vision-large".to_string();
        configured.budgets.chat = 111;
        configured.budgets.vision = 222;
        std::fs::write(
            dir.path().join("settings.json"),
            serde_json::to_string(&configured).unwrap(),
        )
        .unwrap();

        let mut state = bootstrap_in(dir.path()).await;
        let mock = Arc::new(MockCompletionProvider::new());
        state.completion = mock.clone() as Arc<dyn CompletionProvider>;
        mock.push_ok("hi there");
        mock.push_ok("a red square");

        let token = CancellationToken::new();
        let mut chat = state.new_chat_session();
        chat.ask("hello", &token).await.unwrap();

        let mut png = Vec::new();
        image::RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let attachment = ImageAttachment::from_bytes(&png, "square.png").unwrap();
        let mut image_chat = state.new_image_session(attachment);
        image_chat.ask("What is this?", &token).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "acme/chat-small");
        assert_eq!(calls[0].max_tokens, 111);
        assert_eq!(calls[1].model, "acme/vision-large");
        assert_eq!(calls[1].max_tokens, 222);

        let history = state.qa_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].image_ref, "square.png");
    }

    #[tokio::test]
    async fn test_document_summary_validates_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let state = bootstrap_in(dir.path()).await;
        let token = CancellationToken::new();

        let err = state.summarize_document("short", &token).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
