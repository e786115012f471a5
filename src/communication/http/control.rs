use crate::hardware::camera::settings::FrameSize;

/// `/control` で変更できる項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    FrameSize(FrameSize),
    Quality(u8),
    LedIntensity(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("パラメータ {0} がありません")]
    MissingParameter(&'static str),
    #[error("未対応の変数です: {0}")]
    UnknownVariable(String),
    #[error("値が不正です: {var}={value}")]
    InvalidValue { var: String, value: String },
    #[error("フレームサイズ {} はバッファ ({}) を超えています", .requested.name(), .max.name())]
    FrameSizeExceedsBuffer { requested: FrameSize, max: FrameSize },
}

impl ControlCommand {
    /// `var=<name>&val=<int>` 形式のクエリを解釈する
    pub fn parse(query: &str) -> Result<Self, ControlError> {
        let var = query_value(query, "var").ok_or(ControlError::MissingParameter("var"))?;
        let raw = query_value(query, "val").ok_or(ControlError::MissingParameter("val"))?;

        let invalid = || ControlError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
        };
        let value: i32 = raw.parse().map_err(|_| invalid())?;

        match var {
            "framesize" => u8::try_from(value)
                .ok()
                .and_then(FrameSize::from_index)
                .map(ControlCommand::FrameSize)
                .ok_or_else(invalid),
            "quality" => match u8::try_from(value) {
                Ok(q) if q <= 63 => Ok(ControlCommand::Quality(q)),
                _ => Err(invalid()),
            },
            "led_intensity" => u8::try_from(value)
                .map(ControlCommand::LedIntensity)
                .map_err(|_| invalid()),
            other => Err(ControlError::UnknownVariable(other.to_string())),
        }
    }

    /// フレームバッファは起動時のサイズで確保されるため、それより大きいサイズは受け付けない
    pub fn within_buffer(self, max: FrameSize) -> Result<Self, ControlError> {
        match self {
            ControlCommand::FrameSize(requested) if requested > max => {
                Err(ControlError::FrameSizeExceedsBuffer { requested, max })
            }
            command => Ok(command),
        }
    }
}

/// クエリ文字列から指定キーの値を取り出す
pub fn query_value<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// URI からクエリ部分を切り出す
pub fn split_query(uri: &str) -> &str {
    uri.split_once('?').map(|(_, q)| q).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_framesize_by_index() {
        assert_eq!(
            ControlCommand::parse("var=framesize&val=11"),
            Ok(ControlCommand::FrameSize(FrameSize::Hd))
        );
        assert_eq!(
            ControlCommand::parse("val=8&var=framesize"),
            Ok(ControlCommand::FrameSize(FrameSize::Vga))
        );
    }

    #[test]
    fn rejects_out_of_range_framesize() {
        assert!(matches!(
            ControlCommand::parse("var=framesize&val=14"),
            Err(ControlError::InvalidValue { .. })
        ));
        assert!(matches!(
            ControlCommand::parse("var=framesize&val=-1"),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn framesize_above_allocated_buffer_is_rejected() {
        // PSRAM 無しでは SVGA 分しか確保されない
        let command = ControlCommand::parse("var=framesize&val=13").unwrap();
        assert_eq!(
            command.within_buffer(FrameSize::Svga),
            Err(ControlError::FrameSizeExceedsBuffer {
                requested: FrameSize::Uxga,
                max: FrameSize::Svga,
            })
        );
    }

    #[test]
    fn framesize_up_to_buffer_is_accepted() {
        let same = ControlCommand::FrameSize(FrameSize::Svga);
        assert_eq!(same.within_buffer(FrameSize::Svga), Ok(same));
        let smaller = ControlCommand::FrameSize(FrameSize::Qvga);
        assert_eq!(smaller.within_buffer(FrameSize::Svga), Ok(smaller));
        // フレームサイズ以外は制限しない
        let quality = ControlCommand::Quality(5);
        assert_eq!(quality.within_buffer(FrameSize::Qqvga), Ok(quality));
    }

    #[test]
    fn quality_is_limited_to_63() {
        assert_eq!(
            ControlCommand::parse("var=quality&val=10"),
            Ok(ControlCommand::Quality(10))
        );
        assert!(ControlCommand::parse("var=quality&val=64").is_err());
    }

    #[test]
    fn led_intensity_fits_in_a_byte() {
        assert_eq!(
            ControlCommand::parse("var=led_intensity&val=255"),
            Ok(ControlCommand::LedIntensity(255))
        );
        assert!(ControlCommand::parse("var=led_intensity&val=256").is_err());
    }

    #[test]
    fn missing_and_unknown_parameters() {
        assert_eq!(
            ControlCommand::parse("val=3"),
            Err(ControlError::MissingParameter("var"))
        );
        assert_eq!(
            ControlCommand::parse("var=quality"),
            Err(ControlError::MissingParameter("val"))
        );
        assert_eq!(
            ControlCommand::parse("var=hmirror&val=1"),
            Err(ControlError::UnknownVariable("hmirror".to_string()))
        );
        assert!(matches!(
            ControlCommand::parse("var=quality&val=abc"),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn query_is_split_from_uri() {
        assert_eq!(split_query("/control?var=quality&val=5"), "var=quality&val=5");
        assert_eq!(split_query("/control"), "");
        assert_eq!(query_value("?a=1&b=2", "b"), Some("2"));
        assert_eq!(query_value("a=1&b", "b"), None);
    }
}
