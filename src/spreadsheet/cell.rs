use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::TimeDelta;
use iso8601_duration::Duration as IsoDuration;

/// How the stored value of a cell should be read.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Stored as `1`/`0` or `true`/`false`
    Boolean,
    Number,
    /// Serial numbers counted from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial numbers counted from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 date or date-time text
    IsoDateTime,
    /// ISO 8601 duration text, used by OpenDocument for times of day
    IsoDuration,
    /// Shared string table index, resolved to `Text` while reading
    SharedString,
    Text,
    /// Error literal such as `#N/A`
    Error,
}

impl CellType {
    /// Cell type for a built-in number format id, if the id is a date or time format.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => {
                Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 })
            }
            _ => None,
        }
    }

    /// Cell type for a custom number format code.
    /// Quoted literals, escaped characters and bracketed sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '"' if is_literal => is_literal = false,
                _ if is_literal => (),
                ']' if is_bracket => is_bracket = false,
                _ if is_bracket => (),
                '_' | '\\' | '*' => is_escaped = true,
                '"' => is_literal = true,
                '[' => is_bracket = true,
                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A non-empty cell read from a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Value as stored in the file
    pub(crate) value: String,
}

impl Cell {
    /// Text shown for the cell. Numbers are rendered in their shortest
    /// round-trip form, date and time serials become ISO text. Falls back to
    /// the stored value whenever a conversion is not possible.
    pub(crate) fn text(&self) -> String {
        let converted = match self.kind {
            CellType::Number => number_text(&self.value),
            CellType::Boolean => Some(if self.value == "1" || self.value.eq_ignore_ascii_case("true") {
                "TRUE".to_owned()
            } else {
                "FALSE".to_owned()
            }),
            CellType::NumberDateTime1900 => serial_to_datetime(&self.value, false)
                .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            CellType::NumberDateTime1904 => serial_to_datetime(&self.value, true)
                .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            CellType::NumberDate1900 => serial_to_datetime(&self.value, false)
                .map(|datetime| datetime.format("%Y-%m-%d").to_string()),
            CellType::NumberDate1904 => serial_to_datetime(&self.value, true)
                .map(|datetime| datetime.format("%Y-%m-%d").to_string()),
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                serial_to_time(&self.value).map(|time| time.format("%H:%M:%S").to_string())
            }
            CellType::IsoDateTime => Some(self.value.replacen('T', " ", 1)),
            CellType::IsoDuration => self.value.parse::<IsoDuration>().ok().map(|duration| {
                let seconds = (duration.hour as u64) * 3600 + (duration.minute as u64) * 60 + duration.second as u64;
                format!("{:02}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
            }),
            _ => None,
        };
        converted.unwrap_or_else(|| self.value.to_owned())
    }
}

/// Stored doubles such as `12.300000000000001` read back as `12.3`.
fn number_text(value: &str) -> Option<String> {
    let number = value.trim().parse::<f64>().ok().filter(|number| number.is_finite())?;
    Some(format!("{}", number))
}

/// Converts a spreadsheet serial number to a date-time.
/// The 1900 system reproduces the Lotus 1-2-3 leap year bug: serial 60 is the
/// nonexistent 1900-02-29, so serials below it are shifted by one day.
fn serial_to_datetime(value: &str, is_1904: bool) -> Option<NaiveDateTime> {
    let serial = value.trim().parse::<f64>().ok().filter(|serial| serial.is_finite())?;
    let days = serial.trunc() as i64;
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let milliseconds = (serial.fract().abs() * 86_400_000f64).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
}

fn serial_to_time(value: &str) -> Option<NaiveTime> {
    let serial = value.trim().parse::<f64>().ok().filter(|serial| serial.is_finite())?;
    let milliseconds = (serial.fract().abs() * 86_400_000f64).round() as i64;
    NaiveTime::from_hms_opt(0, 0, 0)?
        .overflowing_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
        .0
        .into()
}
