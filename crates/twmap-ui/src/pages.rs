//! HTML for the dashboard page.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use html_escape::encode_text;
use twmap_forecast::table::COLUMNS;
use twmap_forecast::TableRow;

use crate::dashboard::DashboardView;

pub const PAGE_TITLE: &str = "台灣氣象地圖";
pub const HEADING: &str = "🗺️ 台灣氣溫分布圖 (仿氣象署風格)";
pub const SIDEBAR_TITLE: &str = "控制面板";
pub const REFRESH_LABEL: &str = "🔄 更新氣象資料";
pub const AVERAGE_NOTE: &str = "地圖顯示的是未來 12 小時的「平均氣溫」。";
pub const EMPTY_WARNING: &str = "資料庫為空，請點擊左側「更新氣象資料」";
pub const TABLE_HEADING: &str = "詳細數據列表";
pub const UPDATED_TEXT: &str = "更新完成！";
pub const BUSY_TEXT: &str = "資料下載中，請稍候再試。";

/// Banner shown above the dashboard after a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Updated,
    Error(String),
    Busy,
}

impl Notice {
    fn class(&self) -> &'static str {
        match self {
            Notice::Updated => "notice success",
            Notice::Error(_) => "notice error",
            Notice::Busy => "notice info",
        }
    }

    fn text(&self) -> String {
        match self {
            Notice::Updated => UPDATED_TEXT.to_string(),
            Notice::Error(message) => format!("API 錯誤: {}", message),
            Notice::Busy => BUSY_TEXT.to_string(),
        }
    }
}

/// The full dashboard document.
pub fn dashboard_page(view: &DashboardView, notice: Option<&Notice>, store_label: &str) -> String {
    let mut body = String::new();

    if let Some(notice) = notice {
        let _ = write!(
            body,
            "<div class=\"{}\">{}</div>",
            notice.class(),
            encode_text(&notice.text())
        );
    }

    match view {
        DashboardView::Empty => {
            let _ = write!(body, "<div class=\"notice warning\">{}</div>", EMPTY_WARNING);
        }
        DashboardView::Populated {
            table, updated_at, ..
        } => {
            let _ = write!(
                body,
                "<div class=\"columns\">\
                 <div class=\"map-column\"><iframe src=\"/map\" title=\"map\"></iframe></div>\
                 <div class=\"table-column\"><h3>{}</h3>{}{}</div>\
                 </div>",
                TABLE_HEADING,
                table_html(table),
                updated_line(updated_at.as_ref()),
            );
        }
    }

    page(&caption(store_label), &body)
}

/// Error page for a dashboard that could not be read.
pub fn error_page(message: &str) -> String {
    let body = format!("<div class=\"notice error\">{}</div>", encode_text(message));
    page("", &body)
}

fn page(caption: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("__TITLE__", PAGE_TITLE)
        .replace("__SIDEBAR_TITLE__", SIDEBAR_TITLE)
        .replace("__REFRESH_LABEL__", REFRESH_LABEL)
        .replace("__AVERAGE_NOTE__", AVERAGE_NOTE)
        .replace("__HEADING__", HEADING)
        .replace("__CAPTION__", caption)
        .replace("__BODY__", body)
}

fn caption(store_label: &str) -> String {
    format!(
        "資料來源：CWA Open Data | 本地資料庫：{}",
        encode_text(store_label)
    )
}

fn updated_line(updated_at: Option<&DateTime<Utc>>) -> String {
    match updated_at {
        Some(ts) => format!(
            "<p class=\"updated\">更新時間：{}</p>",
            ts.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => String::new(),
    }
}

/// Table rows; the temperature range is tinted by its highlight color.
pub fn table_html(rows: &[TableRow]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td style=\"color: {}; font-weight: bold\">{}</td><td>{}</td><td>{}</td></tr>",
            encode_text(&row.region),
            row.highlight,
            encode_text(&row.temperature_range),
            encode_text(&row.weather),
            row.precipitation,
        );
    }

    html.push_str("</tbody></table>");
    html
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__TITLE__</title>
    <style>
        body { margin: 0; font-family: sans-serif; display: flex; min-height: 100vh; }
        aside { width: 240px; padding: 1.5rem; background: #f0f2f6; }
        main { flex: 1; padding: 1.5rem 2rem; }
        button { width: 100%; padding: 0.6rem; border: none; border-radius: 6px;
                 background: #ff4b4b; color: white; font-size: 1rem; cursor: pointer; }
        .caption { color: #808495; font-size: 0.85rem; }
        .notice { padding: 0.8rem 1rem; border-radius: 6px; margin: 1rem 0; }
        .success { background: #dff5e3; color: #176f2c; }
        .error { background: #fde4e4; color: #9b1c1c; }
        .warning { background: #fff6d6; color: #7a5b00; }
        .info { background: #e3effd; color: #1c4f9b; }
        .columns { display: flex; gap: 1.5rem; }
        .map-column { flex: 7; }
        .table-column { flex: 3; max-height: 600px; overflow-y: auto; }
        iframe { width: 100%; height: 600px; border: none; }
        table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
        th, td { padding: 0.3rem 0.5rem; border-bottom: 1px solid #e6e9ef; text-align: left; }
        .updated { color: #808495; font-size: 0.8rem; }
    </style>
</head>
<body>
    <aside>
        <h2>__SIDEBAR_TITLE__</h2>
        <form method="post" action="/refresh">
            <button type="submit">__REFRESH_LABEL__</button>
        </form>
        <div class="notice info">__AVERAGE_NOTE__</div>
    </aside>
    <main>
        <h1>__HEADING__</h1>
        <p class="caption">__CAPTION__</p>
        __BODY__
    </main>
</body>
</html>
"#;
