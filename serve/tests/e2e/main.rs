//! End-to-end tests: spawn the server on port 0 and drive real clients.

mod chat_http;
mod chat_ws;
mod common;
mod exec_ws;
mod invalid_frames;
