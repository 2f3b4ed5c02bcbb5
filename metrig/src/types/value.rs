/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use memchr::memchr;
use serde_json::Number;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Signed(i64),
    Unsigned(u64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Double(f) => *f,
            MetricValue::Signed(i) => *i as f64,
            MetricValue::Unsigned(u) => *u as f64,
        }
    }

    pub fn as_json_number(&self) -> Number {
        match self {
            MetricValue::Double(f) => Number::from_f64(*f).unwrap_or_else(|| Number::from(0)),
            MetricValue::Signed(i) => Number::from(*i),
            MetricValue::Unsigned(u) => Number::from(*u),
        }
    }
}

impl TryFrom<&Number> for MetricValue {
    type Error = anyhow::Error;

    fn try_from(n: &Number) -> Result<Self, Self::Error> {
        if let Some(u) = n.as_u64() {
            Ok(MetricValue::Unsigned(u))
        } else if let Some(i) = n.as_i64() {
            Ok(MetricValue::Signed(i))
        } else if let Some(f) = n.as_f64() {
            Ok(MetricValue::Double(f))
        } else {
            Err(anyhow!("unsupported json number {n}"))
        }
    }
}

impl FromStr for MetricValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }

        if s.as_bytes()[0] == b'-' {
            match memchr(b'.', s.as_bytes()) {
                Some(_) => {
                    let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 string: {e}"))?;
                    Ok(MetricValue::Double(f))
                }
                None => {
                    let i = i64::from_str(s).map_err(|e| anyhow!("invalid i64 string: {e}"))?;
                    Ok(MetricValue::Signed(i))
                }
            }
        } else {
            match memchr(b'.', s.as_bytes()) {
                Some(_) => {
                    let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 string: {e}"))?;
                    Ok(MetricValue::Double(f))
                }
                None => {
                    let u = u64::from_str(s).map_err(|e| anyhow!("invalid u64 string: {e}"))?;
                    Ok(MetricValue::Unsigned(u))
                }
            }
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(u) => f.write_str(itoa::Buffer::new().format(*u)),
            MetricValue::Signed(i) => f.write_str(itoa::Buffer::new().format(*i)),
            MetricValue::Double(v) => f.write_str(ryu::Buffer::new().format(*v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str() {
        assert_eq!(
            MetricValue::from_str("48").unwrap(),
            MetricValue::Unsigned(48)
        );
        assert_eq!(
            MetricValue::from_str("-3").unwrap(),
            MetricValue::Signed(-3)
        );
        assert_eq!(
            MetricValue::from_str("0.5").unwrap(),
            MetricValue::Double(0.5)
        );
        assert!(MetricValue::from_str("").is_err());
        assert!(MetricValue::from_str("abc").is_err());
    }

    #[test]
    fn json_number() {
        let n = Number::from(48u64);
        assert_eq!(
            MetricValue::try_from(&n).unwrap(),
            MetricValue::Unsigned(48)
        );
        assert_eq!(MetricValue::Unsigned(48).as_json_number(), n);

        let n = Number::from_f64(0.5).unwrap();
        assert_eq!(MetricValue::try_from(&n).unwrap(), MetricValue::Double(0.5));
    }

    #[test]
    fn display() {
        assert_eq!(MetricValue::Unsigned(10).to_string(), "10");
        assert_eq!(MetricValue::Signed(-10).to_string(), "-10");
        assert_eq!(MetricValue::Double(1.0).to_string(), "1.0");
    }
}
