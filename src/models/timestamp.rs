//! 时间戳反序列化
//!
//! 旧后端返回 RFC 2822 格式（`Mon, 19 Oct 2026 10:00:00 GMT`），
//! 新接口返回 RFC 3339；没有时区的时间按 UTC 处理

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimestampVisitor;

    impl<'de> Visitor<'de> for TimestampVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an RFC 3339 / RFC 2822 timestamp or unix seconds")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse(value).ok_or_else(|| E::custom(format!("无法解析时间: {}", value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            DateTime::from_timestamp(value, 0)
                .ok_or_else(|| E::custom(format!("时间戳超出范围: {}", value)))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let secs = i64::try_from(value)
                .map_err(|_| E::custom(format!("时间戳超出范围: {}", value)))?;
            self.visit_i64(secs)
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_formats() {
        let rfc2822 = parse("Mon, 19 Oct 2026 10:05:00 GMT").unwrap();
        assert_eq!((rfc2822.day(), rfc2822.hour(), rfc2822.minute()), (19, 10, 5));

        let rfc3339 = parse("2026-10-19T10:05:00+02:00").unwrap();
        assert_eq!(rfc3339.hour(), 8);

        let naive = parse("2026-10-19T10:05:00.123456").unwrap();
        assert_eq!(naive.hour(), 10);

        assert!(parse("yesterday").is_none());
    }
}
