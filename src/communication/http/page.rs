//! インデックスページとポート割り当て
//!
//! `/stream` はクライアントが切断するまでハンドラを占有するため、
//! 制御用とは別のサーバー (ポート +1) で配信する。

/// ストリーム用サーバーのポート
pub fn stream_port(http_port: u16) -> Option<u16> {
    http_port.checked_add(1)
}

/// `/` で返す HTML
///
/// ストリームの URL はページを開いたホスト名から組み立てる。
pub fn index_html(stream_port: u16) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>ESP32-CAM</title></head>
<body>
<h1>ESP32-CAM</h1>
<img id="stream" style="max-width:100%">
<p><a href="/capture">capture</a> | <a href="/status">status</a></p>
<script>
document.getElementById('stream').src =
  location.protocol + '//' + location.hostname + ':{}/stream';
</script>
</body>
</html>"#,
        stream_port
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_runs_on_next_port() {
        assert_eq!(stream_port(80), Some(81));
        assert_eq!(stream_port(8080), Some(8081));
        assert_eq!(stream_port(u16::MAX), None);
    }

    #[test]
    fn index_points_image_at_stream_port() {
        let html = index_html(81);
        assert!(html.contains("':81/stream'"));
        // 制御系のリンクは同じポートのまま
        assert!(html.contains("href=\"/capture\""));
        assert!(!html.contains("src=\"/stream\""));
    }
}
