// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MQTT transport implementation for the ConsultEase central system.
//!
//! Wraps a single persistent `rumqttc` broker connection behind the
//! [`consultease_core::Transport`] trait. The event loop runs on a
//! background task, reconnects automatically, and re-subscribes all
//! registered topic filters on every successful connection.

pub mod client;

pub use client::{MqttTransport, MqttTransportOptions};
