// Transcription module - whole-file speech-to-text through a remote endpoint

pub mod provider;
pub mod remote_provider;

pub use provider::{TranscriptionProvider, TRANSCRIPT_EMPTY_PLACEHOLDER};
pub use remote_provider::RemoteTranscriptionProvider;
