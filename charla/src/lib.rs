//! # Charla
//!
//! Core library for the charla chat system: converse with a language-model
//! service over an HTTP request/response transport or a persistent WebSocket,
//! behind one [`ChatTransport`] contract with identical observable semantics,
//! and run code blocks from replies either in a sandboxed QuickJS worker or
//! through the server-side execution service.
//!
//! ## Main modules
//!
//! - [`transport`]: [`ChatTransport`] contract, [`ApiTransport`] (one HTTP
//!   exchange per message), [`WsTransport`] (persistent connection with
//!   automatic reconnect), [`TransportKind`] selection.
//! - [`store`]: [`MessageLog`], the append-only log with the single
//!   pending-placeholder convention.
//! - [`exec`]: [`ExecBridge`] dispatching code fragments to the local
//!   [`JsWorker`] or to the server via the `::EXEC_CODE::` control message.
//! - [`capability`]: [`Generation`] / [`CodeExecution`] traits with Gemini
//!   and deterministic simulated implementations.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use charla::{ApiTransport, ChatTransport};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let chat = ApiTransport::new("http://127.0.0.1:3001/api/chat");
//! chat.send_message("hello").await;
//! for message in chat.messages() {
//!     println!("{:?}: {}", message.sender, message.text);
//! }
//! # }
//! ```

pub mod capability;
pub mod error;
pub mod exec;
pub mod message;
pub mod store;
pub mod transport;

pub use capability::{
    code_execution_from_env, generation_from_env, simulated_reply, CodeExecution,
    GeminiCodeExecution, GeminiGeneration, Generation, SimulatedCodeExecution, SimulatedGeneration,
    MODEL_NO_RESPONSE_TEXT, SIMULATED_EXEC_TEXT,
};
pub use error::{CapabilityError, TransportError};
pub use exec::{
    decode_exec_message, encode_exec_message, is_local_language, ExecBridge, ExecDispatch,
    ExecEvent, ExecRequest, JsWorker, EXEC_PREFIX,
};
pub use message::{
    ChatMessage, ChatReply, Sender, EXCHANGE_ERROR_TEXT, MALFORMED_REPLY_TEXT, NO_RESPONSE_TEXT,
    PENDING_TEXT,
};
pub use store::MessageLog;
pub use transport::{
    ApiTransport, ChatTransport, ConnectionState, TransportKind, WsConfig, WsTransport,
};
