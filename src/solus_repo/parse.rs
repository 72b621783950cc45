// Parse the SolusVM client API response: bare tags with no document root,
//   <status>success</status><hostname>srv</hostname><ipaddress>192.0.2.1</ipaddress>
//   <hdd>total,used,free,percent</hdd><bw>...</bw><mem>...</mem>
// Counts are bytes; the percent field is recomputed from the counts.

use super::FetchError;
use crate::models::{ResourceUsage, VpsStats};

pub(crate) fn parse_response(body: &str) -> Result<VpsStats, FetchError> {
    if let Some(status) = tag(body, "status") {
        if !status.eq_ignore_ascii_case("success") {
            let msg = tag(body, "statusmsg").unwrap_or(status).to_string();
            let lower = msg.to_ascii_lowercase();
            return Err(
                if lower.contains("key") || lower.contains("hash") || lower.contains("auth") {
                    FetchError::Auth(msg)
                } else {
                    FetchError::Upstream(msg)
                },
            );
        }
    }

    Ok(VpsStats {
        hostname: required(body, "hostname")?.to_string(),
        ip: required(body, "ipaddress")?.to_string(),
        disk: resource(body, "hdd")?,
        bandwidth: resource(body, "bw")?,
        memory: resource(body, "mem")?,
        fetched_at: chrono::Utc::now().timestamp(),
    })
}

fn tag<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].trim())
}

fn required<'a>(body: &'a str, name: &str) -> Result<&'a str, FetchError> {
    tag(body, name).ok_or_else(|| FetchError::Parse(format!("missing <{name}> in response")))
}

/// `total,used,free,percent`; only the first two counts are kept.
fn resource(body: &str, name: &str) -> Result<ResourceUsage, FetchError> {
    let raw = required(body, name)?;
    let mut fields = raw.split(',');
    Ok(ResourceUsage {
        total_bytes: number(&mut fields, name, "total")?,
        used_bytes: number(&mut fields, name, "used")?,
    })
}

fn number(
    fields: &mut std::str::Split<'_, char>,
    tag: &str,
    field: &str,
) -> Result<u64, FetchError> {
    let raw = fields
        .next()
        .ok_or_else(|| FetchError::Parse(format!("<{tag}> is missing its {field} field")))?;
    raw.trim()
        .parse()
        .map_err(|_| FetchError::Parse(format!("<{tag}> {field} is not a number: {raw:?}")))
}
