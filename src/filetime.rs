use chrono::{DateTime, TimeZone, Utc};

/// 100 ns intervals between 1601-01-01 and 1970-01-01.
const EPOCH_DELTA: i64 = 116_444_736_000_000_000;

/// Convert a Windows FILETIME to a UTC instant.
pub fn filetime_to_datetime(ft: i64) -> Option<DateTime<Utc>> {
    let unix = ft.checked_sub(EPOCH_DELTA)?;
    let secs = unix.div_euclid(10_000_000);
    let nanos = unix.rem_euclid(10_000_000) * 100;
    Utc.timestamp_opt(secs, nanos as u32).single()
}

pub fn filetime_to_rfc3339(ft: i64) -> String {
    filetime_to_datetime(ft)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch() {
        let dt = filetime_to_datetime(EPOCH_DELTA).unwrap();
        assert_eq!(dt.timestamp(), 0);
    }

    #[test]
    fn windows_epoch() {
        let dt = filetime_to_datetime(0).unwrap();
        assert_eq!(dt.to_rfc3339(), "1601-01-01T00:00:00+00:00");
    }

    #[test]
    fn sub_second_precision() {
        // 2004-08-25T12:00:00.5Z
        let ft = EPOCH_DELTA + 1_093_435_200 * 10_000_000 + 5_000_000;
        let dt = filetime_to_datetime(ft).unwrap();
        assert_eq!(dt.timestamp(), 1_093_435_200);
        assert_eq!(dt.timestamp_subsec_millis(), 500);
    }
}
