/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::types::{MetricName, MetricTagMap, MetricValue, ParseError};

#[derive(Debug, Error)]
pub(super) enum RecordDecodeError {
    #[error("invalid json: {0}")]
    InvalidJson(serde_json::Error),
    #[error("record is not a json object")]
    NotObject,
    #[error("no metric field")]
    NoMetric,
    #[error("invalid metric name: {0}")]
    InvalidName(ParseError),
    #[error("no value field")]
    NoValue,
    #[error("invalid value field: {0}")]
    InvalidValue(anyhow::Error),
    #[error("invalid tags field")]
    InvalidTags,
    #[error("invalid tag: {0}")]
    InvalidTag(anyhow::Error),
}

pub(super) type DecodedRecord = (MetricName, MetricTagMap, MetricValue);

/// Walk a datagram holding one json record per line. Blank lines are
/// skipped; a bad line yields an error and decoding continues with the
/// next line.
pub(super) struct RecordVisitor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordVisitor<'a> {
    pub(super) fn new(buf: &'a [u8]) -> Self {
        RecordVisitor { buf, offset: 0 }
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.buf.len() {
            return None;
        }

        let left = &self.buf[self.offset..];
        match memchr::memchr(b'\n', left) {
            Some(p) => {
                self.offset += p + 1;
                Some(&left[..p])
            }
            None => {
                self.offset = self.buf.len();
                Some(left)
            }
        }
    }
}

fn decode_line(line: &[u8]) -> Result<DecodedRecord, RecordDecodeError> {
    let value: Value = serde_json::from_slice(line).map_err(RecordDecodeError::InvalidJson)?;
    let obj = value.as_object().ok_or(RecordDecodeError::NotObject)?;

    let metric = obj
        .get("metric")
        .and_then(Value::as_str)
        .ok_or(RecordDecodeError::NoMetric)?;
    let name = MetricName::from_str(metric).map_err(RecordDecodeError::InvalidName)?;

    let value = match obj.get("value") {
        Some(Value::Number(n)) => {
            MetricValue::try_from(n).map_err(RecordDecodeError::InvalidValue)?
        }
        _ => return Err(RecordDecodeError::NoValue),
    };

    let mut tag_map = MetricTagMap::default();
    if let Some(tags) = obj.get("tags") {
        let tags = tags.as_array().ok_or(RecordDecodeError::InvalidTags)?;
        for tag in tags {
            let tag = tag.as_str().ok_or(RecordDecodeError::InvalidTags)?;
            tag_map.parse(tag).map_err(RecordDecodeError::InvalidTag)?;
        }
    }

    Ok((name, tag_map, value))
}

impl Iterator for RecordVisitor<'_> {
    type Item = Result<DecodedRecord, RecordDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.next_line()?;
            if line.is_empty() {
                continue;
            }

            return Some(decode_line(line));
        }
    }
}
