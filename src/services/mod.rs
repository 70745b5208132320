//! Service layer for business logic
//!
//! This module contains the services that talk to the file backend, keeping
//! HTTP details away from the consumers that present results to users.

pub mod transfer;
