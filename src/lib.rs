//! # fileshare-client
//!
//! Native client for the multi-user file-sharing and approval service.
//!
//! The interesting part of this crate is the session pipeline: a [`Session`]
//! owns the current user's identity and credential, persists it through a
//! [`SessionRepository`] so it survives restarts, and an [`ApiClient`] reads
//! it just before every request leaves the process to attach the
//! `Authorization` header. Everything else (`net::api`, `auth`, the
//! `fileshare` binary) is a thin layer over those two pieces.
//!
//! [`Session`]: session::Session
//! [`SessionRepository`]: session::SessionRepository
//! [`ApiClient`]: net::ApiClient

pub mod auth;
pub mod config;
pub mod net;
pub mod notify;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;
