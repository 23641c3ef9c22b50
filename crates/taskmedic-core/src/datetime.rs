use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDateTime,
  SubsecRound,
  TimeZone,
  Utc
};
use chrono_tz::Tz;

const DATETIME_LOCAL_FORMAT: &str =
  "%Y-%m-%dT%H:%M";

/// Current time at millisecond precision,
/// the resolution timestamps are
/// persisted with.
pub fn now_ms() -> DateTime<Utc> {
  truncate_ms(Utc::now())
}

pub fn truncate_ms(
  dt: DateTime<Utc>
) -> DateTime<Utc> {
  dt.trunc_subsecs(3)
}

pub fn parse_timezone(
  raw: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      "timezone value was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::warn!(
        timezone = %trimmed,
        error = %err,
        "invalid timezone"
      );
      None
    }
  }
}

#[must_use]
pub fn fmt_hm(
  dt: DateTime<Utc>,
  tz: Tz
) -> String {
  dt.with_timezone(&tz)
    .format("%H:%M")
    .to_string()
}

#[must_use]
pub fn fmt_time(
  dt: DateTime<Utc>,
  tz: Tz
) -> String {
  dt.with_timezone(&tz)
    .format("%d %b %Y, %H:%M")
    .to_string()
}

/// Value for an
/// `<input type="datetime-local">`.
#[must_use]
pub fn to_datetime_local(
  dt: DateTime<Utc>,
  tz: Tz
) -> String {
  dt.with_timezone(&tz)
    .format(DATETIME_LOCAL_FORMAT)
    .to_string()
}

/// Parses a `datetime-local` value in
/// `tz`. Seconds are accepted because some
/// browsers emit them. Gaps created by DST
/// transitions yield `None`; ambiguous
/// times resolve to the earlier instant.
pub fn parse_datetime_local(
  raw: &str,
  tz: Tz
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  let naive =
    NaiveDateTime::parse_from_str(
      trimmed,
      DATETIME_LOCAL_FORMAT
    )
    .or_else(|_| {
      NaiveDateTime::parse_from_str(
        trimmed,
        "%Y-%m-%dT%H:%M:%S"
      )
    })
    .ok()?;

  match tz.from_local_datetime(&naive)
  {
    | LocalResult::Single(dt) => {
      Some(dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      earliest,
      _
    ) => Some(
      earliest.with_timezone(&Utc)
    ),
    | LocalResult::None => {
      tracing::debug!(
        value = %trimmed,
        "datetime falls in a DST gap"
      );
      None
    }
  }
}

/// `mm:ss`, minutes uncapped.
#[must_use]
pub fn format_elapsed(
  elapsed: Duration
) -> String {
  let total =
    elapsed.num_seconds().max(0);
  format!(
    "{:02}:{:02}",
    total / 60,
    total % 60
  )
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone,
    Utc
  };

  use super::*;

  #[test]
  fn datetime_local_round_trips_in_zone()
  {
    let tz: Tz = "Europe/London"
      .parse()
      .expect("known zone");
    let parsed = parse_datetime_local(
      "2030-01-01T12:30",
      tz
    )
    .expect("valid datetime-local");

    assert_eq!(
      parsed,
      Utc
        .with_ymd_and_hms(
          2030, 1, 1, 12, 30, 0
        )
        .single()
        .expect("valid utc")
    );
    assert_eq!(
      to_datetime_local(parsed, tz),
      "2030-01-01T12:30"
    );
  }

  #[test]
  fn blank_or_garbage_is_not_a_datetime()
  {
    assert!(
      parse_datetime_local(
        "  ",
        chrono_tz::UTC
      )
      .is_none()
    );
    assert!(
      parse_datetime_local(
        "tomorrow",
        chrono_tz::UTC
      )
      .is_none()
    );
  }

  #[test]
  fn elapsed_is_minutes_and_seconds() {
    assert_eq!(
      format_elapsed(
        Duration::milliseconds(
          65_900
        )
      ),
      "01:05"
    );
    assert_eq!(
      format_elapsed(Duration::minutes(
        125
      )),
      "125:00"
    );
  }

  #[test]
  fn truncation_drops_sub_millisecond_precision()
   {
    let dt = Utc
      .timestamp_opt(
        1_700_000_000,
        123_456_789
      )
      .single()
      .expect("valid timestamp");
    assert_eq!(
      truncate_ms(dt)
        .timestamp_subsec_nanos(),
      123_000_000
    );
  }
}
