// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the light watchdog.
//!
//! Most of these never escape the component that detects them: a failed
//! store write is logged and the tracker keeps going, a malformed payload is
//! dropped at the event source, and a failed notification is logged by the
//! reconciliation loop. The top-level [`Error`] exists for setup paths
//! (configuration, broker connection) where failing loudly is correct.

use thiserror::Error;

use crate::types::RoomId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while reading or writing the durable store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error occurred while parsing an incoming payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while dispatching a notification.
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// The configuration is invalid or unreadable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The room is not tracked by the monitor.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A room identifier is empty or contains MQTT topic metacharacters.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),

    /// A light state keyword was not recognized.
    #[error("invalid light state: {0}")]
    InvalidLightKind(String),
}

/// Errors raised by a [`DurableStore`](crate::store::DurableStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write or delete did not reach the store.
    #[error("failed to write state for room {room}: {message}")]
    WriteFailed {
        /// The room whose record could not be written.
        room: RoomId,
        /// Description of the failure.
        message: String,
    },

    /// A persisted record exists but cannot be trusted.
    #[error("corrupt stored state for room {room}: {message}")]
    ReadCorrupt {
        /// The room whose record is corrupt.
        room: RoomId,
        /// Description of what is wrong with the record.
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to parsing event payloads and topics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload was empty.
    #[error("empty payload")]
    EmptyPayload,

    /// The payload does not have the expected `KIND[,VALUE]` shape.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// The topic does not belong to the monitored layout.
    #[error("unrecognized topic: {0}")]
    UnknownTopic(String),
}

/// Errors related to protocol communication (MQTT).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors returned by a [`Notifier`](crate::notify::Notifier).
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The alert endpoint answered with a non-success status.
    #[error("alert endpoint rejected notification with status {status}")]
    Rejected {
        /// HTTP status code returned by the endpoint.
        status: u16,
    },

    /// The notifier cannot deliver alerts right now.
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of bounds.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A room listed in the configuration is not a valid identifier.
    #[error("invalid room: {0}")]
    Room(#[from] ValueError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
