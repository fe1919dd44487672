//! services/api/src/web/notifications.rs
//!
//! HTML bodies for the messages the service sends to users.

use duotrack_core::domain::{Notification, Task, User};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps a title and an already escaped body in the shared layout.
fn layout(title: &str, body: &str, frontend_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="margin:0;padding:0;font-family:Helvetica,Arial,sans-serif;background:#f3f4f6;">
  <div style="max-width:600px;margin:40px auto;background:#ffffff;border-radius:16px;overflow:hidden;">
    <div style="background:#6366f1;padding:30px;text-align:center;color:#ffffff;font-size:24px;font-weight:bold;">DuoTrack</div>
    <div style="padding:40px 30px;color:#374151;line-height:1.6;">
      <div style="font-size:20px;font-weight:700;color:#111827;margin-bottom:20px;">{title}</div>
      <div style="font-size:16px;margin-bottom:30px;">{body}</div>
      <a href="{url}" style="background:#4f46e5;color:#ffffff;padding:12px 24px;border-radius:8px;text-decoration:none;font-weight:bold;">Open DuoTrack</a>
    </div>
    <div style="background:#f9fafb;padding:20px;text-align:center;color:#9ca3af;font-size:12px;">Keep crushing your goals!</div>
  </div>
</body>
</html>"#,
        title = escape(title),
        body = body,
        url = escape(frontend_url),
    )
}

fn task_card(task: &Task) -> String {
    format!(
        r#"<div style="background:#f9fafb;border-left:4px solid #8b5cf6;padding:15px 20px;border-radius:8px;margin:20px 0;font-weight:600;">{}</div>"#,
        escape(&task.content)
    )
}

pub fn task_completed(recipient: &User, actor: &User, task: &Task, frontend_url: &str) -> Notification {
    let who = if recipient.id == actor.id {
        "You".to_string()
    } else {
        escape(&actor.name)
    };
    let body = format!("{} just completed a task:{}", who, task_card(task));
    Notification {
        recipient_email: recipient.email.clone(),
        subject: format!("Task completed: {}", task.content),
        html_body: layout("Task completed", &body, frontend_url),
    }
}

pub fn comment_added(recipient: &User, sender: &User, task: &Task, text: &str, frontend_url: &str) -> Notification {
    let body = format!(
        "{} commented on {}<p><em>{}</em></p>",
        escape(&sender.name),
        task_card(task),
        escape(text)
    );
    Notification {
        recipient_email: recipient.email.clone(),
        subject: format!("New comment from {}", sender.name),
        html_body: layout("New comment", &body, frontend_url),
    }
}

pub fn partner_request(recipient: &User, requester: &User, frontend_url: &str) -> Notification {
    let body = format!(
        "<strong>{}</strong> ({}) wants to be your DuoTrack partner.",
        escape(&requester.name),
        escape(&requester.email)
    );
    Notification {
        recipient_email: recipient.email.clone(),
        subject: format!("{} sent you a partner request", requester.name),
        html_body: layout("New partner request", &body, frontend_url),
    }
}

pub fn partner_accepted(requester: &User, recipient: &User, frontend_url: &str) -> Notification {
    let body = format!(
        "<strong>{}</strong> accepted your partner request. You can now see each other's tasks.",
        escape(&recipient.name)
    );
    Notification {
        recipient_email: requester.email.clone(),
        subject: format!("{} is now your partner", recipient.name),
        html_body: layout("Partner request accepted", &body, frontend_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_is_escaped() {
        assert_eq!(escape("<b>\"Tom & Jerry\"</b>"), "&lt;b&gt;&quot;Tom &amp; Jerry&quot;&lt;/b&gt;");
        let html = layout("Hi <there>", "body", "http://localhost:5173");
        assert!(html.contains("Hi &lt;there&gt;"));
        assert!(html.contains("href=\"http://localhost:5173\""));
    }
}
