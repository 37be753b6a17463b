use std::time::Duration;

use chrono::NaiveDateTime;
use watch_core::Notification;

/// Longest excerpt of the matched line quoted in a found message. Minified
/// pages flatten to one huge line and Telegram rejects messages over 4096
/// characters.
const MAX_QUOTED_CHARS: usize = 300;

/// Static facts that every notification may mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub target_label: String,
    pub page_url: String,
    pub poll_interval: Duration,
}

/// Renders a notification as Telegram Markdown. `now` is the moment the
/// event happened.
pub fn render(notification: &Notification, ctx: &MessageContext, now: NaiveDateTime) -> String {
    let target = escape_markdown(&ctx.target_label);
    match notification {
        Notification::Startup => format!(
            "🤖 *Exam watch started*\n\n\
             🎯 *Watching:* {target}\n\
             🔗 *Page:* [exam listing]({url})\n\
             ⏰ *Started:* {started}\n\n\
             📡 Checking every {cadence}.\n\
             💬 You will get a message as soon as the exam shows up.",
            url = ctx.page_url,
            started = now.format("%d/%m/%Y at %H:%M"),
            cadence = describe_interval(ctx.poll_interval),
        ),
        Notification::Status { check_count } => format!(
            "📊 *Status update*\n\n\
             🔍 *Checks so far:* {check_count}\n\
             ⏰ *Last check:* {last}\n\
             📋 *Looking for:* {target}\n\
             🟡 *Status:* still searching\n\n\
             _Monitoring continues._",
            last = now.format("%H:%M:%S"),
        ),
        Notification::Found { line } => format!(
            "🚨 *EXAM AVAILABLE!* 🚨\n\n\
             🎯 *Found:* {line}\n\n\
             🔗 *Direct link:* [open the exam page]({url})\n\n\
             ⚡ *Go book it now!* ⚡\n\n\
             🕒 *Detected:* {detected}",
            line = escape_markdown(&excerpt(line, MAX_QUOTED_CHARS)),
            url = ctx.page_url,
            detected = now.format("%d/%m/%Y at %H:%M:%S"),
        ),
        Notification::Shutdown => "⏹️ *Exam watch stopped*\n\n\
             Monitoring was interrupted."
            .to_string(),
    }
}

/// Escapes the characters legacy Telegram Markdown treats as entity markers.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{minutes} minutes"),
        (_, _) if secs == 1 => "second".to_string(),
        _ => format!("{secs} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> MessageContext {
        MessageContext {
            target_label: "placement test B2".into(),
            page_url: "https://example.com/#esami".into(),
            poll_interval: Duration::from_secs(300),
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 7))
            .unwrap()
    }

    #[test]
    fn startup_mentions_target_link_and_cadence() {
        let text = render(&Notification::Startup, &ctx(), at());
        assert!(text.contains("placement test B2"));
        assert!(text.contains("(https://example.com/#esami)"));
        assert!(text.contains("09/03/2026 at 14:05"));
        assert!(text.contains("every 5 minutes"));
    }

    #[test]
    fn status_reports_check_count_and_time() {
        let text = render(&Notification::Status { check_count: 24 }, &ctx(), at());
        assert!(text.contains("*Checks so far:* 24"));
        assert!(text.contains("14:05:07"));
    }

    #[test]
    fn found_escapes_markdown_in_matched_line() {
        let notification = Notification::Found {
            line: "placement_test *b2* [lm]".into(),
        };
        let text = render(&notification, &ctx(), at());
        assert!(text.contains(r"placement\_test \*b2\* \[lm]"));
        assert!(text.contains("09/03/2026 at 14:05:07"));
    }

    #[test]
    fn found_quotes_only_an_excerpt_of_a_huge_line() {
        let row = "<td>lm_b2 sessione 2026</td>";
        let line = format!("{}placement test inglese b2 ingegneria", row.repeat(400));
        let text = render(&Notification::Found { line }, &ctx(), at());

        assert!(text.chars().count() < 4096, "message has {} chars", text.chars().count());
        assert!(text.contains("…"));
        assert!(text.contains("(https://example.com/#esami)"));
    }

    #[test]
    fn short_lines_are_quoted_whole() {
        assert_eq!(excerpt("placement test b2", 300), "placement test b2");
        assert_eq!(excerpt("àèìòù", 3), "àèì…");
        assert_eq!(excerpt("abc", 3), "abc");
    }

    #[test]
    fn rendering_is_pure() {
        let a = render(&Notification::Shutdown, &ctx(), at());
        let b = render(&Notification::Shutdown, &ctx(), at());
        assert_eq!(a, b);
        assert!(a.contains("stopped"));
    }

    #[test]
    fn interval_descriptions() {
        assert_eq!(describe_interval(Duration::from_secs(60)), "minute");
        assert_eq!(describe_interval(Duration::from_secs(600)), "10 minutes");
        assert_eq!(describe_interval(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_interval(Duration::from_secs(1)), "second");
    }
}
