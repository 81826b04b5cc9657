//! imgdrop: a small HTTP service that stores uploaded images on disk and
//! serves them back by name.
//!
//! `POST /upload` takes a multipart `image` field; `GET /images/<name>`
//! returns the stored bytes.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod storage;
