use thiserror::Error;

// === StoreError ===

/// Errors surfaced by the remote record store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The request never produced an HTTP response.
    #[error("Store network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("Store request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    /// The record does not exist in the collection.
    #[error("Record not found in {collection}: {id}")]
    NotFound { collection: String, id: String },
    /// The response body could not be decoded into the expected shape.
    #[error("Store decode error: {0}")]
    Decode(String),
    /// The filter expression was rejected.
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),
    /// The store does not implement the requested operation.
    #[error("Unsupported store operation: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

// === FormError ===

/// Validation failures for user-entered form data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    #[error("Please enter a URL")]
    EmptyUrl,
    #[error("Please enter a valid URL: {0}")]
    InvalidUrl(String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Label cannot be blank")]
    BlankLabel,
    #[error("Group title cannot be blank")]
    BlankTitle,
    #[error("No bookmarks selected")]
    EmptySelection,
}

// === ComposeError ===

/// Errors that abort a bookmark composition (create or edit).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposeError {
    #[error("Invalid bookmark form: {0}")]
    InvalidForm(#[from] FormError),
    #[error("Failed to save bookmark: {0}")]
    Store(#[from] StoreError),
    #[error("No signed-in user configured")]
    MissingOwner,
}

// === GroupError ===

/// Errors from group mutations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GroupError {
    #[error(transparent)]
    InvalidInput(#[from] FormError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// === SettingsError ===

/// Errors related to client settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    IoError(String),
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// === RpcError ===

/// Errors produced while dispatching an RPC request.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("missing param: {0}")]
    MissingParam(&'static str),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
