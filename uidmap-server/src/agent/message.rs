//! UIA agent XML messages
//!
//! Builds the `uid-message` documents the agent accepts and interprets its
//! replies. Documents are small and flat, so they are written directly.

use uidmap_core::domain::work_item::WorkItem;

const VERSION_REQUEST: &str = "<uid-message><version>1.0</version><type>op</type>\
<payload><show><version /></show></payload></uid-message>";

/// Update message carrying one work item
pub fn update_message(item: &WorkItem) -> String {
    let (action, entry) = match item {
        WorkItem::MappingLogin {
            ip,
            username,
            timeout,
        } => ("login", mapping_entry(ip, username, *timeout)),
        WorkItem::MappingLogout {
            ip,
            username,
            timeout,
        } => ("logout", mapping_entry(ip, username, *timeout)),
        WorkItem::AddressTagRegister { ip, tag } => ("register", tag_entry("ip", ip, tag)),
        WorkItem::AddressTagUnregister { ip, tag } => ("unregister", tag_entry("ip", ip, tag)),
        WorkItem::UserTagRegister { user, tag } => ("register-user", tag_entry("user", user, tag)),
        WorkItem::UserTagUnregister { user, tag } => {
            ("unregister-user", tag_entry("user", user, tag))
        }
    };

    format!(
        "<uid-message><version>1.0</version><type>update</type>\
<payload><{action}>{entry}</{action}></payload></uid-message>"
    )
}

/// `show version` operational request used by the connectivity probe
pub fn version_request() -> &'static str {
    VERSION_REQUEST
}

fn mapping_entry(ip: &str, username: &str, timeout: u32) -> String {
    format!(
        "<entry name=\"{}\" ip=\"{}\" timeout=\"{}\" />",
        escape(username),
        escape(ip),
        timeout
    )
}

fn tag_entry(attribute: &str, subject: &str, tag: &str) -> String {
    format!(
        "<entry {}=\"{}\"><tag><member>{}</member></tag></entry>",
        attribute,
        escape(subject),
        escape(tag)
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Checks an agent reply for an in-band error
///
/// The agent reports failures as `<response status="error">` with the reason
/// in `<result>` (or `<msg>`). Replies that are not XML are accepted; the
/// HTTP status decides for those.
pub fn parse_reply(body: &str) -> Result<(), String> {
    let Some(root) = root_tag(body) else {
        return Ok(());
    };

    if attribute(root, "status") != Some("error") {
        return Ok(());
    }

    let detail = element_text(body, "result")
        .or_else(|| element_text(body, "msg"))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    Err(detail)
}

/// Contents of the first start tag, skipping the prolog and comments
fn root_tag(body: &str) -> Option<&str> {
    let mut rest = body.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("<?") {
            rest = after.split_once("?>")?.1.trim_start();
        } else if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.split_once("-->")?.1.trim_start();
        } else if let Some(after) = rest.strip_prefix('<') {
            return after.split_once('>').map(|(tag, _)| tag);
        } else {
            return None;
        }
    }
}

/// Value of attribute `name` in the contents of a start tag
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let tag = tag.trim_end().trim_end_matches('/');
    let mut rest = tag.split_once(char::is_whitespace)?.1;
    loop {
        rest = rest.trim_start();
        let (key, after) = rest.split_once('=')?;
        let after = after.trim_start();
        let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let (value, tail) = after[1..].split_once(quote)?;
        if key.trim() == name {
            return Some(value);
        }
        rest = tail;
    }
}

/// Text content of the first `name` element, inner markup stripped
///
/// The start tag may carry attributes; a self-closing one yields empty text.
fn element_text(body: &str, name: &str) -> Option<String> {
    let open = format!("<{}", name);
    let close = format!("</{}>", name);

    let start = body.match_indices(&open).find_map(|(at, _)| {
        let after = &body[at + open.len()..];
        match after.chars().next()? {
            '>' => Some(Ok(at + open.len() + 1)),
            c if c == '/' || c.is_whitespace() => {
                let end = after.find('>')?;
                if after[..end].ends_with('/') {
                    Some(Err(()))
                } else {
                    Some(Ok(at + open.len() + end + 1))
                }
            }
            _ => None,
        }
    })?;
    let Ok(start) = start else {
        return Some(String::new());
    };

    let len = body[start..].find(&close)?;
    let inner = &body[start..start + len];

    let inner = inner
        .trim()
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .map(str::to_string)
        .unwrap_or_else(|| unescape(&strip_tags(inner)));

    Some(inner.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
