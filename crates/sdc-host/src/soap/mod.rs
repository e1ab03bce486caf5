// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP 1.2 envelope codec for the DPWS message subset.
//!
//! - [`envelope`] - typed message tree
//! - [`parse`] - bytes to tree (`roxmltree`)
//! - [`write`] - tree to XML text
//! - [`duration`] - `xs:duration` handling for WS-Eventing expirations

pub mod duration;
pub mod envelope;
pub mod parse;
pub mod write;

pub use duration::{format_duration, parse_duration};
pub use envelope::*;
pub use parse::{parse, parse_bytes, parse_datagram};
pub use write::serialize;
