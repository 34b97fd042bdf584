// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Serde helpers for Duration serialization as whole milliseconds plus
//! sub-millisecond nanos.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

#[derive(Serialize, Deserialize)]
struct DurationDef {
    millis: u64,
    #[serde(default)]
    sub_nanos: u32,
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    DurationDef {
        millis: duration.as_millis() as u64,
        sub_nanos: duration.subsec_nanos() % 1_000_000,
    }
    .serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let def = DurationDef::deserialize(deserializer)?;
    Ok(Duration::from_millis(def.millis) + Duration::from_nanos(u64::from(def.sub_nanos)))
}
