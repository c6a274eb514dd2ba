//! FotoXpress Core - photo culling logic
//!
//! This crate holds everything about the culling workflow that does not
//! depend on a particular UI or storage backend:
//!
//! - `transform` - auto-crop scale geometry and the straighten/crop-to-fill edit
//! - `decode` / `encode` - loading photos into RGB buffers and writing them back
//! - `model` - sessions, photos, decisions and summaries
//! - `gateway` - the persistence and media contracts the core consumes
//! - `session` - the editing session state machine and the two-phase commit
//! - `config` - commit policy (export mode, destination album, naming)

pub mod config;
pub mod decode;
pub mod encode;
pub mod gateway;
pub mod model;
pub mod session;
pub mod transform;

pub use config::{CommitConfig, ExportMode, ExportNaming};
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use encode::{encode_image, EncodeError, ImageFormat};
pub use gateway::{
    AuthorizationRequest, GatewayError, MediaGateway, PendingAction, PersistenceGateway,
};
pub use model::{Decision, Folder, Photo, PhotoId, Session, SessionId, SessionProgress, Summary};
pub use session::{
    CommitOutcome, CommitProgress, CommitReport, EditingSession, PendingAuthorization, Screen,
    SessionError, UiState,
};
pub use transform::{apply_edit, compute_cover_scale, InterpolationFilter, TransformError};
